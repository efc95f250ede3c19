/// Default base URL of the chat backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

const CHAT_PATH: &str = "/chat";
const NEW_SESSION_PATH: &str = "/new-session";

/// Normalize a base URL to the streaming chat endpoint.
///
/// Normalization rules:
/// 1) blank input falls back to [`DEFAULT_BASE_URL`]
/// 2) keep a URL already ending in `/chat` unchanged
/// 3) append `/chat` otherwise
pub fn normalize_chat_url(input: &str) -> String {
    let base = base_or_default(input);
    if base.ends_with(CHAT_PATH) {
        return base.to_string();
    }
    format!("{base}{CHAT_PATH}")
}

/// Endpoint that issues a fresh server-side session id.
pub fn new_session_url(input: &str) -> String {
    let base = base_or_default(input);
    let root = base.strip_suffix(CHAT_PATH).unwrap_or(base);
    format!("{root}{NEW_SESSION_PATH}")
}

fn base_or_default(input: &str) -> &str {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };
    base.trim_end_matches('/')
}
