use orm_bridge::api::ParsedRequest;
use orm_bridge::application::{Literal, SortArg, SortKey, extract_sort_arg};
use orm_bridge::error::Error;
use serde_json::json;

fn request(query: serde_json::Value) -> ParsedRequest {
    serde_json::from_value(query).unwrap()
}

#[test]
fn test_sort_from_query_string_parameters() {
    let parsed = extract_sort_arg(&request(json!({"sort": "lastname,-prog"}))).unwrap();

    assert_eq!(
        parsed,
        Some(SortArg::Fields(vec![SortKey::asc("lastname"), SortKey::desc("prog")]))
    );
    assert_eq!(parsed.unwrap().to_value(), json!([["lastname"], ["prog", -1]]));
}

#[test]
fn test_no_sort_parameter() {
    assert_eq!(extract_sort_arg(&request(json!({}))).unwrap(), None);
    assert_eq!(extract_sort_arg(&request(json!({"sort": ""}))).unwrap(), None);
}

#[test]
fn test_literal_sort_parameter() {
    let parsed = extract_sort_arg(&request(json!({"sort": r#"[("lastname", -1)]"#})))
        .unwrap()
        .unwrap();

    assert_eq!(
        parsed,
        SortArg::Literal(Literal::List(vec![Literal::Tuple(vec![
            Literal::Str("lastname".to_string()),
            Literal::Int(-1),
        ])]))
    );
    assert_eq!(parsed.to_value(), json!([["lastname", -1]]));
    assert_eq!(parsed.into_keys().unwrap(), vec![SortKey::desc("lastname")]);
}

#[test]
fn test_both_syntaxes_agree_on_keys() {
    let fields = extract_sort_arg("firstname,-prog").unwrap().unwrap();
    let literal = extract_sort_arg(r#"[["firstname"], ["prog", -1]]"#)
        .unwrap()
        .unwrap();

    assert_eq!(fields.into_keys().unwrap(), literal.into_keys().unwrap());
}

#[test]
fn test_malformed_sort_is_rejected() {
    for raw in ["lastname desc", "[(\"a\", -1)", "__import__('os')", "{'a': 1}"] {
        assert!(
            matches!(extract_sort_arg(raw), Err(Error::SortSyntax { .. })),
            "expected syntax error for {raw:?}"
        );
    }
}

#[test]
fn test_deeply_nested_sort_is_rejected() {
    let query = request(json!({"sort": "[".repeat(100_000)}));

    assert!(matches!(extract_sort_arg(&query), Err(Error::SortSyntax { .. })));
}

#[test]
fn test_stacked_signs_are_rejected() {
    assert!(matches!(
        extract_sort_arg(&request(json!({"sort": "[('a', --1)]"}))),
        Err(Error::SortSyntax { .. })
    ));
}
