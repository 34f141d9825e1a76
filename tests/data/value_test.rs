use std::collections::BTreeSet;

use chrono::NaiveDate;
use worklens::data::{Dataset, Record, Value};

#[test]
fn test_parse_null_markers() {
    for raw in ["", "   ", "NA", "n/a", "NaN", "null", "None"] {
        assert!(Value::parse(raw).is_null(), "{:?} should be null", raw);
    }
}

#[test]
fn test_parse_dates_in_both_formats() {
    let expected = NaiveDate::from_ymd_opt(2021, 3, 5).unwrap();
    assert_eq!(Value::parse("2021-03-05").as_date(), Some(expected));
    assert_eq!(Value::parse("05-Mar-2021").as_date(), Some(expected));
    assert_eq!(Value::parse("March 5th").as_str(), Some("March 5th"));
}

#[test]
fn test_display() {
    assert_eq!(Value::Number(3.0).to_string(), "3");
    assert_eq!(Value::Number(2.5).to_string(), "2.5");
    assert_eq!(Value::Null.to_string(), "");
    assert_eq!(Value::parse("05-Mar-2021").to_string(), "2021-03-05");
}

#[test]
fn test_ordering_across_kinds() {
    let set: BTreeSet<Value> = [
        Value::from("B"),
        Value::Number(2.0),
        Value::Null,
        Value::from("A"),
        Value::Number(10.0),
        Value::Number(2.0),
    ]
    .into_iter()
    .collect();

    assert_eq!(
        set.into_iter().collect::<Vec<_>>(),
        vec![
            Value::Null,
            Value::Number(2.0),
            Value::Number(10.0),
            Value::from("A"),
            Value::from("B"),
        ]
    );
}

#[test]
fn test_serialize() {
    let values = vec![
        Value::Null,
        Value::Number(1.5),
        Value::parse("2024-01-31"),
        Value::from("Acme"),
    ];
    assert_eq!(
        serde_json::to_string(&values).unwrap(),
        r#"[null,1.5,"2024-01-31","Acme"]"#
    );
}

#[test]
fn test_record_missing_column_is_null() {
    let record: Record = [("company", Value::from("A"))].into_iter().collect();
    assert!(record.get("band").is_null());
    assert_eq!(record.columns().collect::<Vec<_>>(), vec!["company"]);
}

#[test]
fn test_dataset_rejects_short_rows() {
    let mut dataset = Dataset::new(["company", "band"]);
    let err = dataset.push_row(vec![Value::from("A")]).unwrap_err();
    assert_eq!(err.expected, 2);
    assert_eq!(err.actual, 1);
    assert!(dataset.is_empty());
}
