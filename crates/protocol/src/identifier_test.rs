//! Tests for Identifier type

use std::collections::HashMap;

use crate::identifier::Identifier;

#[test]
fn test_identifier_new_from_str() {
    let id = Identifier::new("34");
    assert_eq!(id.as_str(), "34");
}

#[test]
fn test_identifier_from_string() {
    let id: Identifier = String::from("usbl_ship").into();
    assert_eq!(id.as_str(), "usbl_ship");
}

#[test]
fn test_identifier_display() {
    assert_eq!(Identifier::from("101").to_string(), "101");
}

#[test]
fn test_identifier_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(Identifier::new("0"), "sentry_status");
    map.insert(Identifier::new("34"), "sentry_science");

    assert_eq!(map.get("34"), Some(&"sentry_science"));
    assert_eq!(map.get("35"), None);
}

#[test]
fn test_identifier_ordering() {
    let mut ids = vec![Identifier::new("5"), Identifier::new("0"), Identifier::new("2")];
    ids.sort();
    let sorted: Vec<&str> = ids.iter().map(Identifier::as_str).collect();
    assert_eq!(sorted, ["0", "2", "5"]);
}
