use serde::Serialize;

/// Event pushed onto a session's status channel and serialized to the
/// uploader's WebSocket connection.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StatusMessage {
    Start,
    Progress { done: u64, size: u64 },
    Done,
    Error,
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_serializes_to_bare_type_tag() {
        let json = serde_json::to_string(&StatusMessage::Start).unwrap();
        assert_eq!(json, r#"{"type":"start"}"#);
    }

    #[test]
    fn progress_includes_done_and_size() {
        let json = serde_json::to_string(&StatusMessage::Progress { done: 10, size: 20 }).unwrap();
        assert_eq!(json, r#"{"type":"progress","done":10,"size":20}"#);
    }

    #[test]
    fn terminal_variants_serialize_by_tag_only() {
        assert_eq!(
            serde_json::to_string(&StatusMessage::Done).unwrap(),
            r#"{"type":"done"}"#
        );
        assert_eq!(
            serde_json::to_string(&StatusMessage::Error).unwrap(),
            r#"{"type":"error"}"#
        );
        assert_eq!(
            serde_json::to_string(&StatusMessage::Timeout).unwrap(),
            r#"{"type":"timeout"}"#
        );
    }
}
