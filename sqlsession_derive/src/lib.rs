use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type, parse_macro_input, spanned::Spanned};

/// Derives `sqlsession::RowTarget` for a struct with named fields.
///
/// Fields opt into column binding with `#[db("column")]`; text after the
/// first comma of the annotation is ignored, so `#[db("id,primary")]` binds
/// column `id`. `#[db(flatten)]` embeds another `Record` whose columns are
/// looked up in the same namespace as the parent's. Fields without an
/// annotation are never written and keep their `Default` value.
#[proc_macro_derive(Record, attributes(db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_record(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

enum FieldBinding {
    Column(String),
    Flatten,
}

struct BoundField {
    ident: Ident,
    ty: Type,
    binding: FieldBinding,
}

fn expand_record(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Record does not support generic structs yet",
        ));
    }

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Record can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields,
        Fields::Unit => return Ok(expand_impl(&struct_name, &[])),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Record requires named fields",
            ));
        }
    };

    let mut bound = Vec::<BoundField>::new();
    for field in named_fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Record requires named fields"))?;
        let Some(binding) = parse_db_field_options(&field.attrs)? else {
            continue;
        };
        bound.push(BoundField {
            ident,
            ty: field.ty,
            binding,
        });
    }

    Ok(expand_impl(&struct_name, &bound))
}

fn expand_impl(struct_name: &Ident, fields: &[BoundField]) -> TokenStream2 {
    let describe_steps = fields.iter().map(|field| match &field.binding {
        FieldBinding::Column(column) => quote! {
            columns.push(#column);
        },
        FieldBinding::Flatten => {
            let ty = &field.ty;
            quote! {
                <#ty as ::sqlsession::RowTarget>::describe(columns);
            }
        }
    });

    let width_terms = fields.iter().map(|field| match &field.binding {
        FieldBinding::Column(_) => quote! { 1usize },
        FieldBinding::Flatten => {
            let ty = &field.ty;
            quote! { <#ty as ::sqlsession::RowTarget>::width() }
        }
    });

    let assign_steps = fields.iter().map(|field| {
        let ident = &field.ident;
        match &field.binding {
            FieldBinding::Column(_) => quote! {
                if locator == offset {
                    self.#ident = ::sqlsession::FromValue::from_value(value)?;
                    return ::std::result::Result::Ok(());
                }
                offset += 1;
            },
            FieldBinding::Flatten => {
                let ty = &field.ty;
                quote! {
                    {
                        let width = <#ty as ::sqlsession::RowTarget>::width();
                        if locator < offset + width {
                            return ::sqlsession::RowTarget::assign(&mut self.#ident, locator - offset, value);
                        }
                        offset += width;
                    }
                }
            }
        }
    });

    quote! {
        impl ::sqlsession::RowTarget for #struct_name {
            fn shape() -> ::sqlsession::TargetShape {
                ::sqlsession::TargetShape::Record
            }

            fn describe(columns: &mut ::std::vec::Vec<&'static str>) {
                let _ = &columns;
                #(#describe_steps)*
            }

            fn width() -> usize {
                0usize #(+ #width_terms)*
            }

            #[allow(unused_assignments, unused_mut)]
            fn assign(&mut self, locator: usize, value: ::sqlsession::Value) -> ::sqlsession::Result<()> {
                let mut offset = 0usize;
                #(#assign_steps)*
                let _ = value;
                ::std::result::Result::Err(::sqlsession::DbError::ScanError(::std::format!(
                    "no field at locator {} (of {}) in {}",
                    locator,
                    offset,
                    ::std::stringify!(#struct_name)
                )))
            }
        }
    }
}

fn path_ends_with_ident(path: &syn::Path, ident: &str) -> bool {
    path.segments
        .last()
        .map(|segment| segment.ident == ident)
        .unwrap_or(false)
}

/// Column name of an annotation: the text before the first comma.
fn column_from_annotation(annotation: &str) -> &str {
    match annotation.find(',') {
        Some(pos) => &annotation[..pos],
        None => annotation,
    }
}

fn parse_db_field_options(attrs: &[syn::Attribute]) -> syn::Result<Option<FieldBinding>> {
    let mut binding: Option<FieldBinding> = None;

    for attr in attrs {
        if !path_ends_with_ident(attr.path(), "db") {
            continue;
        }

        if binding.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                "Duplicate #[db(...)] attribute on field",
            ));
        }

        let list = match &attr.meta {
            syn::Meta::List(list) => list,
            _ => {
                return Err(syn::Error::new(
                    attr.span(),
                    "Unsupported #[db] syntax. Use #[db(\"column\")] or #[db(flatten)]",
                ));
            }
        };

        if let Ok(annotation) = list.parse_args::<LitStr>() {
            let column = column_from_annotation(&annotation.value()).to_string();
            if column.is_empty() {
                return Err(syn::Error::new(
                    annotation.span(),
                    "#[db(\"...\")] needs a column name before the first comma",
                ));
            }
            binding = Some(FieldBinding::Column(column));
            continue;
        }

        let mut flatten = false;
        list.parse_nested_meta(|meta| {
            if meta.path.is_ident("flatten") {
                flatten = true;
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[db(...)] option. Supported: \"column\", flatten",
            ))
        })?;

        if !flatten {
            return Err(syn::Error::new(
                attr.span(),
                "Empty #[db()] attribute. Use #[db(\"column\")] or #[db(flatten)]",
            ));
        }
        binding = Some(FieldBinding::Flatten);
    }

    Ok(binding)
}
