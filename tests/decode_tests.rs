/// Row decoding tests
///
/// Tests for decoding result sets into mapping and record targets
/// Run with: cargo test --test decode_tests

mod common;

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use sqlsession::{DbError, Record, RowTarget, Rows, Value, decode, params};

#[derive(Debug, Default, PartialEq, Record)]
struct User {
    #[db("id")]
    id: i64,
    #[db("name")]
    name: String,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Audit {
    #[db("created_by")]
    created_by: String,
    #[db("created_on")]
    created_on: Option<NaiveDate>,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Stamp {
    #[db("revision,readonly")]
    revision: i32,
    #[db(flatten)]
    audit: Audit,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Document {
    #[db("id")]
    id: i64,
    #[db("title")]
    title: Option<String>,
    #[db(flatten)]
    stamp: Stamp,
    #[db("body")]
    body: Vec<u8>,
    /// Never bound.
    cached_len: usize,
}

#[derive(Debug, Default, PartialEq, Record)]
struct Labelled {
    #[db("id")]
    id: i64,
    #[db("label")]
    label: String,
}

/// `label` is reachable twice: directly and through the flattened record.
#[derive(Debug, Default, PartialEq, Record)]
struct Shadowing {
    #[db("label")]
    label: String,
    #[db(flatten)]
    inner: Labelled,
}

fn rows(columns: &[&str], data: Vec<Vec<Value>>) -> Rows {
    Rows::new(columns.iter().map(|c| c.to_string()).collect(), data)
}

#[test]
fn test_mapping_scenario_with_bytes() {
    let result: Vec<HashMap<String, Value>> = decode(rows(
        &["id", "name"],
        vec![vec![Value::Integer(7), Value::Blob(b"Ann".to_vec())]],
    ))
    .unwrap();

    let mut expected = HashMap::new();
    expected.insert("id".to_string(), Value::Integer(7));
    expected.insert("name".to_string(), Value::Text("Ann".into()));
    assert_eq!(result, vec![expected]);
}

#[test]
fn test_record_scenario() {
    let result: Vec<User> = decode(rows(
        &["id", "name"],
        vec![vec![Value::Integer(7), Value::Text("Ann".into())]],
    ))
    .unwrap();

    assert_eq!(
        result,
        vec![User {
            id: 7,
            name: "Ann".into()
        }]
    );
}

#[test]
fn test_empty_result_sets() {
    let maps: Vec<BTreeMap<String, serde_json::Value>> =
        decode(rows(&["id", "name"], Vec::new())).unwrap();
    assert!(maps.is_empty());

    let users: Vec<User> = decode(rows(&["id", "name"], Vec::new())).unwrap();
    assert!(users.is_empty());
}

#[test]
fn test_nested_records_are_flattened() {
    let result: Vec<Document> = decode(rows(
        &["body", "created_by", "id", "revision", "created_on", "unused"],
        vec![vec![
            Value::Blob(vec![1, 2, 3]),
            Value::Text("ann".into()),
            Value::Integer(10),
            Value::Integer(4),
            Value::Text("2024-02-29".into()),
            Value::Float(0.5),
        ]],
    ))
    .unwrap();

    assert_eq!(
        result,
        vec![Document {
            id: 10,
            title: None,
            stamp: Stamp {
                revision: 4,
                audit: Audit {
                    created_by: "ann".into(),
                    created_on: NaiveDate::from_ymd_opt(2024, 2, 29),
                },
            },
            body: vec![1, 2, 3],
            cached_len: 0,
        }]
    );
}

#[test]
fn test_nested_field_behaves_like_top_level_field() {
    let nested: Vec<Stamp> = decode(rows(
        &["created_by"],
        vec![vec![Value::Text("bob".into())]],
    ))
    .unwrap();
    let top: Vec<Audit> = decode(rows(
        &["created_by"],
        vec![vec![Value::Text("bob".into())]],
    ))
    .unwrap();

    assert_eq!(nested[0].audit, top[0]);
}

#[test]
fn test_nullable_fields() {
    let result: Vec<Document> = decode(rows(
        &["id", "title", "created_on"],
        vec![
            vec![Value::Integer(1), Value::Null, Value::Null],
            vec![
                Value::Integer(2),
                Value::Text("Draft".into()),
                Value::Text("2024-01-02".into()),
            ],
        ],
    ))
    .unwrap();

    assert_eq!(result[0].title, None);
    assert_eq!(result[0].stamp.audit.created_on, None);
    assert_eq!(result[1].title.as_deref(), Some("Draft"));
    assert_eq!(
        result[1].stamp.audit.created_on,
        NaiveDate::from_ymd_opt(2024, 1, 2)
    );
}

#[test]
fn test_shadowed_column_binds_first_field_in_walk_order() {
    let result: Vec<Shadowing> = decode(rows(
        &["id", "label"],
        vec![vec![Value::Integer(3), Value::Text("outer".into())]],
    ))
    .unwrap();

    assert_eq!(result[0].label, "outer");
    assert_eq!(result[0].inner.label, "");
    assert_eq!(result[0].inner.id, 3);
}

#[test]
fn test_descriptor_order() {
    assert_eq!(
        sqlsession::decode::descriptor::<Document>(),
        vec!["id", "title", "revision", "created_by", "created_on", "body"]
    );
    assert_eq!(<Document as RowTarget>::width(), 6);
    assert_eq!(<Stamp as RowTarget>::width(), 3);
}

#[test]
fn test_null_into_plain_field_is_scan_error() {
    let err = decode::<User>(rows(
        &["id", "name"],
        vec![
            vec![Value::Integer(1), Value::Text("a".into())],
            vec![Value::Integer(2), Value::Null],
            vec![Value::Integer(3), Value::Text("c".into())],
        ],
    ))
    .unwrap_err();

    assert_eq!(
        err.decoded,
        vec![User {
            id: 1,
            name: "a".into()
        }]
    );
    assert!(matches!(err.error, DbError::ScanError(_)));
}

#[test]
fn test_unsupported_target_type() {
    let err = decode::<i64>(rows(&["id"], vec![vec![Value::Integer(1)]])).unwrap_err();
    assert!(err.decoded.is_empty());
    assert!(matches!(err.error, DbError::UnsupportedTargetType(_)));
}

#[test]
fn test_json_mapping_from_sqlite() {
    let (mut session, _dir) = common::sqlite_session();
    session
        .update("CREATE TABLE t (id INTEGER, name BLOB, score REAL, note TEXT)", &[])
        .unwrap();
    session
        .insert(
            "INSERT INTO t VALUES (?, ?, ?, ?)",
            params![7, b"Ann".as_slice(), 1.5, None::<String>],
        )
        .unwrap();

    let result: Vec<BTreeMap<String, serde_json::Value>> =
        session.select("SELECT * FROM t", &[]).unwrap();

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!([{ "id": 7, "name": "Ann", "score": 1.5, "note": null }])
    );
}

#[test]
fn test_records_from_sqlite() {
    let (mut session, _dir) = common::sqlite_session();
    session
        .update(
            "CREATE TABLE docs (id INTEGER PRIMARY KEY, title TEXT, revision INTEGER, created_by TEXT, body BLOB)",
            &[],
        )
        .unwrap();
    session
        .insert(
            "INSERT INTO docs (title, revision, created_by, body) VALUES (?, ?, ?, ?)",
            params!["Notes", 2, "ann", vec![9u8, 8]],
        )
        .unwrap();

    let docs: Vec<Document> = session
        .select("SELECT *, 'x' AS extra FROM docs", &[])
        .unwrap();

    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id, 1);
    assert_eq!(docs[0].title.as_deref(), Some("Notes"));
    assert_eq!(docs[0].stamp.revision, 2);
    assert_eq!(docs[0].stamp.audit.created_by, "ann");
    assert_eq!(docs[0].body, vec![9, 8]);
}
