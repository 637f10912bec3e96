use super::core::decode_segment;
use super::{HostRouter, MemoryRouter};

#[test]
fn test_root_path() {
    let (re, params) = MemoryRouter::path_to_regex("/").unwrap();
    assert!(re.is_match("/"));
    assert!(!re.is_match("/pets"));
    assert!(params.is_empty());
}

#[test]
fn test_parameterized_path() {
    let (re, params) = MemoryRouter::path_to_regex("/items/{id}").unwrap();
    assert!(re.is_match("/items/123"));
    assert!(!re.is_match("/items/123/extra"));
    assert_eq!(params, vec!["id"]);
}

#[test]
fn test_colon_placeholder() {
    let (re, params) = MemoryRouter::path_to_regex("/users/:userId/posts/:postId").unwrap();
    let caps = re.captures("/users/7/posts/9").unwrap();
    assert_eq!(&caps[1], "7");
    assert_eq!(&caps[2], "9");
    assert_eq!(params, vec!["userId", "postId"]);
}

#[test]
fn test_literal_segments_are_escaped() {
    let (re, _) = MemoryRouter::path_to_regex("/files/v1.0").unwrap();
    assert!(re.is_match("/files/v1.0"));
    assert!(!re.is_match("/files/v1x0"));
}

#[test]
fn test_check_path_accepts_declared_patterns() {
    let host = MemoryRouter::new();
    assert!(host.check_path("/").is_ok());
    assert!(host.check_path("/pets/{id}/toys/:toy").is_ok());
}

#[test]
fn test_check_path_requires_leading_slash() {
    let host = MemoryRouter::new();
    let err = host.check_path("pets/{id}").unwrap_err();
    assert!(err.contains("start with '/'"), "{err}");
}

#[test]
fn test_check_path_rejects_repeated_parameter() {
    let host = MemoryRouter::new();
    let err = host.check_path("/pets/{id}/owners/:id").unwrap_err();
    assert!(err.contains("'id'"), "{err}");
}

#[test]
fn test_segments_are_percent_decoded() {
    assert_eq!(decode_segment("a%20b"), "a b");
    assert_eq!(decode_segment("caf%C3%A9"), "café");
    assert_eq!(decode_segment("plain"), "plain");
    // invalid UTF-8 after decoding stays raw
    assert_eq!(decode_segment("%FF"), "%FF");
}
