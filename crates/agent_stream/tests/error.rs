use reqwest::StatusCode;

use agent_stream::error::parse_error_message;
use agent_stream::{DecodeError, StreamError, TransportError};

#[test]
fn parse_error_message_reads_detail_string() {
    let body = r#"{"detail":"Invalid token"}"#;
    let message = parse_error_message(StatusCode::UNAUTHORIZED, body);
    assert_eq!(message, "Invalid token");
}

#[test]
fn parse_error_message_joins_validation_details() {
    let body = r#"{"detail":[{"loc":["body","input"],"msg":"field required"},{"loc":["body","session_id"],"msg":"field required"}]}"#;
    let message = parse_error_message(StatusCode::UNPROCESSABLE_ENTITY, body);
    assert_eq!(message, "field required; field required");
}

#[test]
fn parse_error_message_reads_nested_error_message() {
    let body = r#"{"error":{"message":"overloaded"}}"#;
    let message = parse_error_message(StatusCode::SERVICE_UNAVAILABLE, body);
    assert_eq!(message, "overloaded");
}

#[test]
fn parse_error_message_falls_back_to_raw_body_or_reason() {
    let message = parse_error_message(StatusCode::INTERNAL_SERVER_ERROR, "raw failure text");
    assert_eq!(message, "raw failure text");

    let message = parse_error_message(StatusCode::BAD_GATEWAY, "");
    assert_eq!(message, "Bad Gateway");
}

#[test]
fn stream_error_reports_observed_status() {
    let status = StreamError::from(TransportError::Status {
        status: 500,
        message: "Internal Server Error".to_string(),
    });
    assert_eq!(status.status(), Some(500));
    assert_eq!(status.to_string(), "HTTP 500: Internal Server Error");

    let decode = StreamError::from(DecodeError::InvalidUtf8 { offset: 3 });
    assert_eq!(decode.status(), None);
    assert!(!decode.is_cancelled());
    assert!(StreamError::Cancelled.is_cancelled());
}
