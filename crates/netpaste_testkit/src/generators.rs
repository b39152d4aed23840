//! Property-based test generators using proptest.

use proptest::prelude::*;

/// Strategy for note names as people type them into a URL.
pub fn note_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9_-]{0,31}").expect("Invalid regex")
}

/// Strategy for note content, including multi-line and non-ASCII text.
pub fn note_content_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        ".{0,256}",
        prop::collection::vec("[^\n]{0,40}", 1..8).prop_map(|lines| lines.join("\n")),
    ]
}

/// Strategy for dotted-quad origins.
pub fn ipv4_origin_strategy() -> impl Strategy<Value = String> {
    prop::array::uniform4(any::<u8>()).prop_map(|[a, b, c, d]| format!("{a}.{b}.{c}.{d}"))
}

/// Strategy for origins that are not four dotted parts.
pub fn non_ipv4_origin_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("::1".to_string()),
        Just("localhost".to_string()),
        prop::string::string_regex("[0-9a-f]{1,4}(:[0-9a-f]{1,4}){2,7}").expect("Invalid regex"),
        prop::collection::vec(any::<u8>(), 1..4)
            .prop_map(|parts| parts.iter().map(u8::to_string).collect::<Vec<_>>().join(".")),
    ]
}

/// Strategy for user-agent hints of either client class.
pub fn user_agent_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("Mozilla/5.0 (X11; Linux x86_64)".to_string()),
        Just("Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string()),
        Just("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0) Mobile/15E148".to_string()),
        Just("Mozilla/5.0 (Linux; Android 14) Mobile Safari/537.36".to_string()),
        Just(String::new()),
    ]
}
