use super::*;

// =============================================================
// kebab_case
// =============================================================

#[test]
fn kebab_case_keeps_lowercase_words() {
    assert_eq!(kebab_case("filters"), "filters");
}

#[test]
fn kebab_case_splits_camel_case() {
    assert_eq!(kebab_case("userId"), "user-id");
    assert_eq!(kebab_case("selectedTabIndex"), "selected-tab-index");
}

#[test]
fn kebab_case_splits_after_acronym() {
    assert_eq!(kebab_case("URLValue"), "url-value");
    assert_eq!(kebab_case("parseHTTPResponse"), "parse-http-response");
}

#[test]
fn kebab_case_splits_after_digit() {
    assert_eq!(kebab_case("page2Size"), "page2-size");
}

#[test]
fn kebab_case_normalizes_separators() {
    assert_eq!(kebab_case("snake_case_key"), "snake-case-key");
    assert_eq!(kebab_case("my_key"), "my-key");
    assert_eq!(kebab_case("page.size"), "page-size");
    assert_eq!(kebab_case("  spaced  out "), "spaced-out");
    assert_eq!(kebab_case("already-kebab"), "already-kebab");
}

#[test]
fn kebab_case_of_empty_is_empty() {
    assert_eq!(kebab_case(""), "");
    assert_eq!(kebab_case("__"), "");
}

// =============================================================
// storage_key
// =============================================================

#[test]
fn storage_key_is_path_scoped_without_prefix() {
    assert_eq!(storage_key(None, "/", "filters"), "urlStorage_/_filters");
    assert_eq!(storage_key(None, "/path1", "data"), "urlStorage_/path1_data");
}

#[test]
fn storage_key_uses_prefix_when_given() {
    assert_eq!(storage_key(Some("shared"), "/path1", "data"), "shared_data");
    assert_eq!(storage_key(Some("shared"), "/path2", "data"), "shared_data");
}
