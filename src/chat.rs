use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation turn. Immutable once created; the conversation is the
/// ordered sequence the client resends on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Body of the outbound chat-completion call. Built per request and dropped
/// once the upstream call returns.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamChatPayload {
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub stream: bool,
    pub max_tokens: u64,
    pub temperature: f64,
}

impl UpstreamChatPayload {
    /// Appends the new user turn to a copy of the history; the caller's
    /// history is left untouched.
    pub fn build(
        model: String,
        history: &[ChatTurn],
        message: &str,
        max_tokens: u64,
        temperature: f64,
    ) -> Self {
        let mut messages = history.to_vec();
        messages.push(ChatTurn::user(message));
        Self {
            model,
            messages,
            stream: true,
            max_tokens,
            temperature,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn build_appends_user_turn_without_touching_history() {
        let history = vec![
            ChatTurn {
                role: Role::User,
                content: "earlier".to_string(),
            },
            ChatTurn {
                role: Role::Assistant,
                content: "reply".to_string(),
            },
        ];
        let payload = UpstreamChatPayload::build("m".to_string(), &history, "hi", 2000, 0.7);
        assert_eq!(history.len(), 2);
        assert_eq!(payload.messages.len(), 3);
        assert_eq!(payload.messages[2], ChatTurn::user("hi"));
        assert!(payload.stream);
    }

    #[test]
    fn build_accepts_empty_history() {
        let payload = UpstreamChatPayload::build("m".to_string(), &[], "hi", 100, 0.0);
        assert_eq!(payload.messages, vec![ChatTurn::user("hi")]);
    }

    #[test]
    fn roles_serialize_snake_case() {
        let value = serde_json::to_value(ChatTurn {
            role: Role::System,
            content: "be terse".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({ "role": "system", "content": "be terse" }));
    }

    #[test]
    fn chat_request_defaults_history_and_model() {
        let req: ChatRequest = serde_json::from_value(json!({ "message": "hi" })).unwrap();
        assert!(req.history.is_empty());
        assert!(req.model.is_none());
    }
}
