use serde::{Deserialize, Serialize};

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetEvent {
    #[serde(rename = "text_delta")]
    TextDelta(String),
    /// Breaks the stream with a network error.
    #[serde(rename = "interrupt")]
    Interrupt,
}

/// The preset response for a model turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request will fail in the first `failure` attempts.
    /// `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failures: None,
        }
    }

    /// Creates a `PresetResponse` that streams `text` in pieces of at most
    /// `piece_len` characters.
    pub fn with_text(text: &str, piece_len: usize) -> Self {
        let piece_len = piece_len.max(1);
        let chars: Vec<char> = text.chars().collect();
        let events: Vec<_> = chars
            .chunks(piece_len)
            .map(|piece| PresetEvent::TextDelta(piece.iter().collect()))
            .collect();
        Self::with_events(events)
    }

    /// Sets failure times before a successful response. `0` means the
    /// response will always be a failure.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }
}
