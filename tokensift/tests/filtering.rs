use regex::Regex;
use similar_asserts::assert_eq;
use tokensift::filters::{NameMatchFilter, PointerFilter, RegexNameFilter};
use tokensift::{
    filter_json, json, FilterHandle, FilteringCursor, Inclusion, Token, TokenBuffer,
};

fn tokens(input: &str) -> Vec<Token> {
    json::tokens_from_str(input).expect("valid JSON")
}

#[test]
fn pointer_match_without_path() {
    let out = filter_json(
        r#"{"a":1,"b":{"c":2,"d":3}}"#,
        FilterHandle::custom(PointerFilter::new("/b/c")),
        Inclusion::OnlyIncludeAll,
        false,
    )
    .unwrap();
    assert_eq!(out, vec![Token::scalar(2i64)]);
}

#[test]
fn pointer_match_with_replayed_path() {
    let out = filter_json(
        r#"{"a":1,"b":{"c":2,"d":3}}"#,
        FilterHandle::custom(PointerFilter::new("/b/c")),
        Inclusion::IncludeAllAndPath,
        false,
    )
    .unwrap();
    assert_eq!(out, tokens(r#"{"b":{"c":2}}"#));
}

#[test]
fn name_set_selects_subtrees_at_any_depth() {
    let out = filter_json(
        r#"{"meta":{"id":7},"rows":[{"id":8,"x":1}]}"#,
        FilterHandle::custom(NameMatchFilter::new(["id"])),
        Inclusion::IncludeAllAndPath,
        true,
    )
    .unwrap();
    assert_eq!(out, tokens(r#"{"meta":{"id":7},"rows":[{"id":8}]}"#));
}

#[test]
fn regex_names_select_subtrees() {
    let out = filter_json(
        r#"{"item_1":1,"other":{"item_2":2},"x":3}"#,
        FilterHandle::custom(RegexNameFilter::new(Regex::new("^item_[0-9]+$").unwrap())),
        Inclusion::IncludeAllAndPath,
        true,
    )
    .unwrap();
    assert_eq!(out, tokens(r#"{"item_1":1,"other":{"item_2":2}}"#));
}

#[test]
fn include_all_round_trips_the_document() {
    let input = r#"{"a":[1,{"b":null}],"c":"x"}"#;
    let out =
        filter_json(input, FilterHandle::IncludeAll, Inclusion::IncludeAllAndPath, true).unwrap();
    assert_eq!(out, tokens(input));
    let values = json::values_from_tokens(&out).expect("balanced output");
    assert_eq!(values, vec![serde_json::from_str::<serde_json::Value>(input).unwrap()]);
}

#[test]
fn cursor_surface_over_a_buffer() {
    let mut cursor = FilteringCursor::new(
        TokenBuffer::new(tokens(r#"{"a":{"deep":{"x":5}}}"#)),
        FilterHandle::custom(PointerFilter::new("/a/deep/x")),
        Inclusion::IncludeAllAndPath,
        false,
    );
    let mut names = Vec::new();
    while let Some(token) = cursor.next_token().unwrap() {
        if let Token::PropertyName(name) = &token {
            names.push(name.to_string());
            assert!(!cursor.has_text_characters());
        }
    }
    assert_eq!(names, vec!["a", "deep", "x"]);
    assert_eq!(cursor.match_count(), 1);
}
