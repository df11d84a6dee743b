use serde::{Deserialize, Serialize};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One rendered chat message, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// A user turn and the assistant turn that answered it; the unit of sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPair {
    pub user: String,
    pub assistant: String,
}

impl ConversationPair {
    /// Episode body as submitted to the remote log.
    pub fn episode_body(&self) -> String {
        format!("User: {}\n\nAssistant: {}", self.user, self.assistant)
    }
}

/// Pair turns at positions `(2k, 2k + 1)`.
///
/// A position pair is kept only when it is exactly `(User, Assistant)`; any
/// other combination and an odd trailing turn are dropped. Positions stay
/// fixed so that pair indices line up with the remote log count across runs.
pub fn pair_turns(turns: &[ConversationTurn]) -> Vec<ConversationPair> {
    turns
        .chunks_exact(2)
        .filter_map(|chunk| match chunk {
            [user, assistant] if user.role == Role::User && assistant.role == Role::Assistant => {
                Some(ConversationPair {
                    user: user.text.trim().to_string(),
                    assistant: assistant.text.trim().to_string(),
                })
            }
            _ => None,
        })
        .collect()
}
