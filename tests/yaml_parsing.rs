use std::fs::File;

use row_ingest::{CancelToken, ImportOptions, ParsedRow, Value, parser_for};

fn parse_yaml(input: &str, options: &ImportOptions) -> Vec<ParsedRow> {
    let parser = parser_for("yaml").unwrap();
    let mut bytes = input.as_bytes();
    parser
        .parse(&mut bytes, options, CancelToken::new())
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn list_of_maps_flattens_one_level() {
    let input = "- id: 1\n  name: Ada\n- id: 2\n  name: Grace\n";
    let rows = parse_yaml(input, &ImportOptions::default());

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].line_number, 1);
    assert_eq!(rows[1].line_number, 2);
    assert_eq!(rows[0].columns["id"], Value::Int64(1));
    assert_eq!(rows[1].columns["name"], Value::Utf8("Grace".to_string()));
}

#[test]
fn nested_maps_become_json_text_not_columns() {
    let input = "- id: 1\n  address:\n    city: London\n    zip: 123\n";
    let rows = parse_yaml(input, &ImportOptions::default());

    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].columns["address"],
        Value::Utf8(r#"{"city":"London","zip":123}"#.to_string())
    );
    assert!(!rows[0].columns.contains_key("city"));
}

#[test]
fn nested_lists_become_json_text() {
    let rows = parse_yaml("- id: 1\n  tags:\n    - a\n    - b\n", &ImportOptions::default());
    assert_eq!(
        rows[0].columns["tags"],
        Value::Utf8(r#"["a","b"]"#.to_string())
    );
}

#[test]
fn single_map_document_becomes_one_row() {
    let rows = parse_yaml("id: 7\nname: Ada\n", &ImportOptions::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].columns["id"], Value::Int64(7));
}

#[test]
fn data_root_path_walks_mappings() {
    let options = ImportOptions {
        data_root_path: Some("people".to_string()),
        ..Default::default()
    };
    let mut file = File::open("tests/fixtures/people.yaml").unwrap();
    let parser = parser_for("yaml").unwrap();
    let rows: Vec<_> = parser
        .parse(&mut file, &options, CancelToken::new())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].columns["name"], Value::Utf8("Ada".to_string()));
    assert_eq!(
        rows[1].columns["address"],
        Value::Utf8(r#"{"city":"Arlington"}"#.to_string())
    );
}

#[test]
fn navigating_into_a_non_map_is_a_document_error() {
    let options = ImportOptions {
        data_root_path: Some("people.name".to_string()),
        ..Default::default()
    };
    let rows = parse_yaml("people:\n  - id: 1\n", &options);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_error());
}

#[test]
fn scalar_root_is_a_document_error() {
    let rows = parse_yaml("just a string\n", &ImportOptions::default());
    assert_eq!(rows.len(), 1);
    let message = rows[0].parse_error.as_deref().unwrap();
    assert!(message.contains("must be a list or a map"));
}

#[test]
fn empty_document_yields_zero_rows() {
    assert!(parse_yaml("", &ImportOptions::default()).is_empty());
    assert!(parse_yaml("---\n", &ImportOptions::default()).is_empty());
    assert!(parse_yaml("null\n", &ImportOptions::default()).is_empty());
}

#[test]
fn invalid_document_yields_one_error_row_then_ends() {
    let parser = parser_for("yaml").unwrap();
    let mut bytes = "key: [unclosed\n".as_bytes();
    let mut stream = parser.parse(&mut bytes, &ImportOptions::default(), CancelToken::new());

    let row = stream.next().unwrap().unwrap();
    assert!(row.is_error());
    assert!(stream.next().is_none());
}

#[test]
fn scalar_list_elements_wrap_under_value() {
    let rows = parse_yaml("- 1\n- two\n- ~\n", &ImportOptions::default());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].columns["value"], Value::Int64(1));
    assert_eq!(rows[1].columns["value"], Value::Utf8("two".to_string()));
    assert_eq!(rows[2].columns["value"], Value::Null);
}
