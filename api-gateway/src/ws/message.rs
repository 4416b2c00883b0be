//! WebSocket messages

use serde::Deserialize;

/// Inbound client messages.
///
/// The only message clients send is the initial handshake binding an
/// identity to the connection. It is not enforced as a security boundary.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// `{ "type": "auth", "userId": <integer> }`
    Auth {
        #[serde(rename = "userId")]
        user_id: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_handshake() {
        let message: ClientMessage = serde_json::from_str(r#"{"type":"auth","userId":12}"#).unwrap();
        let ClientMessage::Auth { user_id } = message;
        assert_eq!(user_id, 12);
    }

    #[test]
    fn rejects_unknown_types() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }
}
