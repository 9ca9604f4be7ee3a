use devsquad_model::{GenerationConfig, ModelProvider};

use super::Controller;
use crate::catalog::{PERSONAS, system_instruction};
use crate::model_client::ModelClient;

/// [`Controller`] builder.
pub struct ControllerBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) system_instruction: Option<String>,
    pub(crate) generation: GenerationConfig,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// The system instruction defaults to the one composed from the full
    /// persona catalog.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            system_instruction: Some(system_instruction(&PERSONAS)),
            generation: GenerationConfig::default(),
        }
    }

    /// Replaces the system instruction of new chat sessions.
    #[inline]
    pub fn with_system_instruction(
        mut self,
        instruction: impl Into<String>,
    ) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Replaces the sampling parameters of new chat sessions.
    #[inline]
    pub fn with_generation_config(
        mut self,
        generation: GenerationConfig,
    ) -> Self {
        self.generation = generation;
        self
    }

    /// Builds the controller.
    #[inline]
    pub fn build(self) -> Controller {
        Controller::from_builder(self)
    }
}
