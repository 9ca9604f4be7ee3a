//! Chat transcript types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Typed by the user.
    User,
    /// Produced by the model, or synthesized on its behalf.
    Model,
}

/// A chat message.
///
/// The content of a model message is replaced in place while its reply is
/// streaming, so it may hold a partial response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub(crate) id: Uuid,
    pub(crate) role: Role,
    pub(crate) content: String,
    pub(crate) timestamp: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Returns the unique id of this message.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the author of this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the raw content of this message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the creation time of this message.
    #[inline]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// The state of the current exchange with the model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChatStatus {
    /// Ready for a new message.
    #[default]
    Idle,
    /// A request is out but no text has arrived yet.
    Thinking,
    /// Text is arriving.
    Streaming,
    /// The last request failed. A new message may be sent.
    Error,
}

impl ChatStatus {
    /// Returns `true` if a new message can be sent in this state.
    #[inline]
    pub fn accepts_input(self) -> bool {
        matches!(self, ChatStatus::Idle | ChatStatus::Error)
    }
}
