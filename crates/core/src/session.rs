use devsquad_model::{
    GenerationConfig, ModelFinishReason, ModelMessage, ModelProviderError,
    ModelRequest,
};

use crate::model_client::ModelClient;

/// A chat with the model that remembers its completed turns.
///
/// A turn is only recorded once its response has been fully received, so a
/// failed send leaves the history as it was.
pub(crate) struct ChatSession {
    client: ModelClient,
    system_instruction: Option<String>,
    generation: GenerationConfig,
    history: Vec<ModelMessage>,
}

impl ChatSession {
    pub fn new(
        client: ModelClient,
        system_instruction: Option<String>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            client,
            system_instruction,
            generation,
            history: vec![],
        }
    }

    #[cfg(test)]
    pub fn history(&self) -> &[ModelMessage] {
        &self.history
    }

    /// Sends `message` and returns the full reply text.
    ///
    /// `on_text` receives the cumulative reply text as it streams in.
    pub async fn send_message(
        &mut self,
        message: String,
        on_text: impl Fn(&str) + Send + 'static,
    ) -> Result<String, Box<dyn ModelProviderError>> {
        let mut messages = self.history.clone();
        messages.push(ModelMessage::User(message.clone()));
        let req = ModelRequest {
            system_instruction: self.system_instruction.clone(),
            messages,
            generation: self.generation,
        };

        let resp = self.client.send_request(req, on_text).await?;
        match resp.finish_reason {
            Some(ModelFinishReason::Stop) => {}
            Some(reason) => warn!("response finished early: {reason:?}"),
            None => warn!("response ended without a finish reason"),
        }

        self.history.push(ModelMessage::User(message));
        self.history.push(ModelMessage::Model(resp.text.clone()));
        Ok(resp.text)
    }
}

#[cfg(test)]
mod tests {
    use devsquad_model::ErrorKind;
    use devsquad_test_model::{PresetResponse, TestModelProvider};

    use super::*;

    #[tokio::test]
    async fn test_history() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_turn(PresetResponse::with_text("[Atlas]: Hi!", 4));
        model_provider
            .add_turn(PresetResponse::with_text("[Sarah]: Stories.", 4));
        let inspector = model_provider.clone();

        let mut session = ChatSession::new(
            ModelClient::new(model_provider),
            Some("be a squad".to_owned()),
            GenerationConfig::default(),
        );
        let reply = session.send_message("Hello".to_owned(), |_| {}).await;
        assert_eq!(reply.unwrap(), "[Atlas]: Hi!");
        let reply = session.send_message("Plan".to_owned(), |_| {}).await;
        assert_eq!(reply.unwrap(), "[Sarah]: Stories.");

        assert_eq!(session.history(), [
            ModelMessage::User("Hello".to_owned()),
            ModelMessage::Model("[Atlas]: Hi!".to_owned()),
            ModelMessage::User("Plan".to_owned()),
            ModelMessage::Model("[Sarah]: Stories.".to_owned()),
        ]);

        let requests = inspector.received_requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(
            requests[1].system_instruction.as_deref(),
            Some("be a squad")
        );
        assert_eq!(requests[1].generation.temperature, Some(0.7));
        assert_eq!(requests[1].generation.max_output_tokens, Some(8192));
    }

    #[tokio::test]
    async fn test_failed_turn_is_not_recorded() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_turn(
            PresetResponse::with_text("[Neo]: Done.", 3).with_failures(1),
        );
        let mut session = ChatSession::new(
            ModelClient::new(model_provider),
            None,
            GenerationConfig::default(),
        );

        let err = session
            .send_message("Build it".to_owned(), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(session.history().is_empty());

        let reply = session.send_message("Build it".to_owned(), |_| {}).await;
        assert_eq!(reply.unwrap(), "[Neo]: Done.");
        assert_eq!(session.history().len(), 2);
    }
}
