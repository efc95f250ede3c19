use agent_stream::headers::{
    build_headers, HEADER_ACCEPT, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, HEADER_USER_AGENT,
};
use agent_stream::ChatApiConfig;

#[test]
fn header_map_contains_stream_headers() {
    let config = ChatApiConfig::default().insert_header("X-Trace", " abc ");

    let headers = build_headers(&config, Some("token-123"));
    assert_eq!(
        headers.get(HEADER_AUTHORIZATION).expect("authorization header"),
        "Bearer token-123"
    );
    assert_eq!(
        headers.get(HEADER_ACCEPT).expect("accept"),
        "text/event-stream"
    );
    assert_eq!(
        headers.get(HEADER_CONTENT_TYPE).expect("content-type"),
        "application/json"
    );
    assert_eq!(headers.get("x-trace").expect("custom"), "abc");
    assert!(headers
        .get(HEADER_USER_AGENT)
        .is_some_and(|ua| ua.starts_with("agent_stream/")));
}

#[test]
fn header_map_omits_authorization_without_token() {
    let config = ChatApiConfig::default();
    assert!(!build_headers(&config, None).contains_key(HEADER_AUTHORIZATION));
    assert!(!build_headers(&config, Some("  ")).contains_key(HEADER_AUTHORIZATION));
}

#[test]
fn header_map_prefers_configured_user_agent() {
    let config = ChatApiConfig::default().with_user_agent("trip-chat-test");
    let headers = build_headers(&config, None);
    assert_eq!(
        headers.get(HEADER_USER_AGENT).expect("user-agent"),
        "trip-chat-test"
    );
}
