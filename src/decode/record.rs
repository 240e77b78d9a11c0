use tracing::trace;

use crate::decode::RowTarget;
use crate::result::Rows;

/// Annotated column names of a record in field-locator order.
pub fn descriptor<T: RowTarget>() -> Vec<&'static str> {
    let mut columns = Vec::new();
    T::describe(&mut columns);
    columns
}

/// Resolves every result column to the locator of the field it fills.
///
/// Columns without a matching field map to `None`. When several fields
/// carry the same column name, the first one in descriptor order is bound
/// and the others keep their default.
pub(crate) fn bind_columns<T: RowTarget>(rows: &Rows) -> Vec<Option<usize>> {
    let index = rows.column_index();
    let mut bindings = vec![None; rows.columns().len()];

    for (locator, column) in descriptor::<T>().into_iter().enumerate() {
        let Some(&position) = index.get(column) else {
            continue;
        };
        match bindings[position] {
            Some(bound) => {
                trace!(column, locator, bound, "column already bound to an earlier field");
            }
            None => bindings[position] = Some(locator),
        }
    }

    bindings
}
