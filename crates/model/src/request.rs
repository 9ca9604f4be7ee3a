/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// The behavioral instruction of the session.
    pub system_instruction: Option<String>,
    /// The session history, ending with the new user message.
    pub messages: Vec<ModelMessage>,
    /// Sampling parameters of the session.
    pub generation: GenerationConfig,
}

/// A complete chat turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// A user input text.
    User(String),
    /// A text generated by the model.
    Model(String),
}

impl ModelMessage {
    /// Returns the text of this turn.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            ModelMessage::User(text) | ModelMessage::Model(text) => text,
        }
    }
}

/// Sampling parameters for a chat session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Upper bound of generated tokens per response.
    pub max_output_tokens: Option<u32>,
}

impl Default for GenerationConfig {
    #[inline]
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            max_output_tokens: Some(8192),
        }
    }
}
