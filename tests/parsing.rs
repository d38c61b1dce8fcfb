use std::fs;
use std::path::PathBuf;

use charsheet_terminal::character_fetch::{
    api_url, character_url, parse_character_json, parse_classes_json, parse_health_json,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_minimal_character_with_defaults() {
    let record = parse_character_json(&read_fixture("character_thane.json")).expect("parse");
    assert_eq!(record.name, "Thane");
    assert_eq!(record.level, 1);
    assert_eq!(record.id, None);
    assert_eq!(record.class_id, None);
    assert_eq!(record.dexterity, 14);
}

#[test]
fn parses_full_character_response() {
    let record = parse_character_json(&read_fixture("character_full.json")).expect("parse");
    assert_eq!(record.id, Some(3));
    assert_eq!(record.level, 5);
    assert_eq!(record.class_id, Some(1));
    assert_eq!(record.current_hp, 44);
}

#[test]
fn missing_core_field_is_an_error() {
    let raw = r#"{"name": "Nobody", "current_hp": 1, "max_hp": 1}"#;
    assert!(parse_character_json(raw).is_err());
    assert!(parse_character_json("not json").is_err());
}

#[test]
fn parses_class_list() {
    let classes = parse_classes_json(&read_fixture("classes.json")).expect("parse");
    assert_eq!(classes.len(), 2);
    assert_eq!(classes[0].name, "Fighter");
    assert_eq!(classes[0].hit_die, Some(10));
    assert_eq!(classes[1].hit_die, Some(6));
}

#[test]
fn class_list_null_is_empty() {
    assert!(parse_classes_json("null").expect("null should parse").is_empty());
    assert!(parse_classes_json("  ").expect("blank should parse").is_empty());
}

#[test]
fn parses_health_status() {
    assert_eq!(parse_health_json(r#"{"status":"healthy"}"#).unwrap(), "healthy");
    assert_eq!(parse_health_json("{}").unwrap(), "unknown");
}

#[test]
fn builds_api_urls_without_double_slashes() {
    assert_eq!(
        character_url("http://localhost:8000/", 12),
        "http://localhost:8000/api/characters/12"
    );
    assert_eq!(
        api_url("http://localhost:8000", "/api/health"),
        "http://localhost:8000/api/health"
    );
}
