//! Tests for schema types

use crate::error::ProtocolError;
use crate::schema::{FieldKind, FieldSpec, FieldValue, Schema, Separator, TrailingPolicy};

fn spec(s: &str) -> FieldSpec {
    s.parse().unwrap()
}

// =============================================================================
// FieldKind
// =============================================================================

#[test]
fn test_field_kind_from_str() {
    assert_eq!("float".parse::<FieldKind>().unwrap(), FieldKind::Float);
    assert_eq!("INT".parse::<FieldKind>().unwrap(), FieldKind::Integer);
    assert_eq!("token".parse::<FieldKind>().unwrap(), FieldKind::Token);
    assert_eq!("timestamp".parse::<FieldKind>().unwrap(), FieldKind::Timestamp);
    assert_eq!(
        "complex".parse::<FieldKind>(),
        Err(ProtocolError::UnknownFieldKind("complex".to_string()))
    );
}

#[test]
fn test_float_rejects_non_finite() {
    assert_eq!(FieldKind::Float.parse_value("3.5"), Some(FieldValue::Float(3.5)));
    assert_eq!(FieldKind::Float.parse_value("-597.900"), Some(FieldValue::Float(-597.9)));
    assert_eq!(FieldKind::Float.parse_value("inf"), None);
    assert_eq!(FieldKind::Float.parse_value("NaN"), None);
    assert_eq!(FieldKind::Float.parse_value(""), None);
}

#[test]
fn test_integer_parse() {
    assert_eq!(FieldKind::Integer.parse_value("-12"), Some(FieldValue::Integer(-12)));
    assert_eq!(FieldKind::Integer.parse_value("1.0"), None);
}

#[test]
fn test_token_parse() {
    assert_eq!(
        FieldKind::Token.parse_value("A0"),
        Some(FieldValue::Token("A0".to_string()))
    );
    assert_eq!(FieldKind::Token.parse_value(""), None);
    assert_eq!(FieldKind::Token.parse_value("a,b"), None);
}

#[test]
fn test_timestamp_layouts() {
    for raw in [
        "2022-08-01 12:00:00",
        "2022-08-01 12:00:00.123456",
        "2022-08-01T12:00:00",
        "2019/09/24 13:27:58.033",
        "20220801T120000",
        "2022-08-01T12:00:00Z",
        "12:00:05",
    ] {
        assert_eq!(
            FieldKind::Timestamp.parse_value(raw),
            Some(FieldValue::Timestamp(raw.to_string())),
            "{raw}"
        );
    }
    assert_eq!(FieldKind::Timestamp.parse_value("yesterday"), None);
}

// =============================================================================
// FieldSpec
// =============================================================================

#[test]
fn test_field_spec_parse() {
    assert_eq!(spec("depth"), FieldSpec::new("depth", FieldKind::Float));
    assert_eq!(spec("ins:integer"), FieldSpec::new("ins", FieldKind::Integer));
    assert_eq!(spec(" abort_status : token "), FieldSpec::new("abort_status", FieldKind::Token));
    assert_eq!(spec("ins:integer").to_string(), "ins:integer");
}

#[test]
fn test_field_spec_rejects_bad_names() {
    assert!(matches!(
        ":float".parse::<FieldSpec>(),
        Err(ProtocolError::InvalidFieldSpec(_))
    ));
    assert!(matches!(
        "has space:float".parse::<FieldSpec>(),
        Err(ProtocolError::InvalidFieldSpec(_))
    ));
    assert!(matches!(
        "x:blob".parse::<FieldSpec>(),
        Err(ProtocolError::UnknownFieldKind(_))
    ));
}

// =============================================================================
// Separator / TrailingPolicy
// =============================================================================

#[test]
fn test_separator_from_str() {
    assert_eq!("comma".parse::<Separator>().unwrap(), Separator::Comma);
    assert_eq!(",".parse::<Separator>().unwrap(), Separator::Comma);
    assert_eq!("whitespace".parse::<Separator>().unwrap(), Separator::Whitespace);
    assert_eq!(";".parse::<Separator>().unwrap(), Separator::Char(';'));
    assert_eq!("tab".parse::<Separator>().unwrap(), Separator::Char('\t'));
    assert!("::".parse::<Separator>().is_err());
    assert!("".parse::<Separator>().is_err());
}

#[test]
fn test_separator_split() {
    assert_eq!(Separator::Comma.split(" 1, 2 ,3"), ["1", "2", "3"]);
    assert_eq!(Separator::Whitespace.split("  1  2\t3 "), ["1", "2", "3"]);
    assert_eq!(Separator::Char(';').split("a;b"), ["a", "b"]);
    assert!(Separator::Comma.split("   ").is_empty());
    assert_eq!(Separator::Comma.split("1,,3"), ["1", "", "3"]);
}

#[test]
fn test_trailing_policy_from_str() {
    assert_eq!("reject".parse::<TrailingPolicy>().unwrap(), TrailingPolicy::Reject);
    assert_eq!("ignore".parse::<TrailingPolicy>().unwrap(), TrailingPolicy::Ignore);
    assert!("drop".parse::<TrailingPolicy>().is_err());
}

// =============================================================================
// Schema
// =============================================================================

#[test]
fn test_schema_rejects_empty_and_duplicates() {
    assert_eq!(
        Schema::new(vec![], Separator::Comma, TrailingPolicy::Reject),
        Err(ProtocolError::EmptySchema)
    );
    assert_eq!(
        Schema::new(vec![spec("a"), spec("b"), spec("a")], Separator::Comma, TrailingPolicy::Reject),
        Err(ProtocolError::DuplicateField("a".to_string()))
    );
}

#[test]
fn test_schema_parse_mixed_kinds() {
    let schema = Schema::new(
        vec![spec("x"), spec("status:token"), spec("ins:integer")],
        Separator::Comma,
        TrailingPolicy::Reject,
    )
    .unwrap();

    assert_eq!(schema.len(), 3);
    assert_eq!(
        schema.parse("1.25,A0,1").unwrap(),
        vec![
            FieldValue::Float(1.25),
            FieldValue::Token("A0".to_string()),
            FieldValue::Integer(1)
        ]
    );
}

#[test]
fn test_schema_reject_trailing() {
    let schema = Schema::new(vec![spec("a"), spec("b")], Separator::Comma, TrailingPolicy::Reject).unwrap();

    assert_eq!(schema.parse("1,2,3"), Err(ProtocolError::field_count(2, 3)));
    assert_eq!(schema.parse("1"), Err(ProtocolError::field_count(2, 1)));
    assert_eq!(schema.parse(""), Err(ProtocolError::field_count(2, 0)));
}

#[test]
fn test_schema_ignore_trailing() {
    let schema = Schema::new(
        vec![spec("longitude"), spec("latitude"), spec("depth")],
        Separator::Whitespace,
        TrailingPolicy::Ignore,
    )
    .unwrap();

    let values = schema.parse("-125.079565 44.489675 -597.900 0.000 10 0.00 0.00").unwrap();
    assert_eq!(
        values,
        vec![
            FieldValue::Float(-125.079565),
            FieldValue::Float(44.489675),
            FieldValue::Float(-597.9)
        ]
    );
    assert_eq!(schema.parse("1 2"), Err(ProtocolError::field_count(3, 2)));
}

#[test]
fn test_schema_reports_offending_field() {
    let schema = Schema::new(vec![spec("temp"), spec("sal")], Separator::Comma, TrailingPolicy::Reject).unwrap();

    assert_eq!(
        schema.parse("20.1,BAD"),
        Err(ProtocolError::invalid_field("sal", FieldKind::Float, "BAD"))
    );
}
