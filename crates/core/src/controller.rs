mod builder;

use std::error::Error as StdError;
use std::fmt::{self, Display};

use devsquad_model::{ErrorKind, GenerationConfig, ModelProviderError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::artifact::{self, Artifact};
use crate::catalog::{PERSONAS, Persona, TOOLS, Tool};
use crate::message::{ChatStatus, Message, Role};
use crate::model_client::ModelClient;
use crate::segment::{self, Segment};
use crate::session::ChatSession;
pub use builder::ControllerBuilder;

/// The model message appended when a request fails.
pub const CONNECTION_ERROR_MESSAGE: &str = "[System]: Error connecting to the \
    team. Please check your API key or connection.";

/// The reason a message was not sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SendError {
    /// The input is empty or whitespace only.
    EmptyInput,
    /// A reply is still in progress.
    Busy,
}

impl Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::EmptyInput => write!(f, "Message is empty"),
            SendError::Busy => write!(f, "The squad is still replying"),
        }
    }
}

impl StdError for SendError {}

/// A change applied by [`Controller::next_update`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerUpdate {
    /// The pending reply received more text.
    Streaming,
    /// The reply is complete and its code blocks were extracted.
    Completed {
        /// Number of artifacts added by this reply.
        new_artifacts: usize,
    },
    /// The request failed and an error message was appended.
    Failed(ErrorKind),
}

struct StreamEvent {
    seq: u64,
    kind: StreamEventKind,
}

enum StreamEventKind {
    /// The cumulative reply text.
    Chunk(String),
    /// The request ended, handing the session back.
    Finished {
        session: ChatSession,
        result: Result<String, Box<dyn ModelProviderError>>,
    },
}

struct InFlight {
    seq: u64,
    reply_id: Uuid,
    task: JoinHandle<()>,
}

/// Owns a conversation with the squad: the transcript, the extracted
/// artifacts and the chat session with the model.
///
/// At most one reply is in progress at a time. Sending a message spawns a
/// task that streams the reply; the caller drives the transcript forward by
/// awaiting [`next_update`](Self::next_update).
pub struct Controller {
    model_client: ModelClient,
    system_instruction: Option<String>,
    generation: GenerationConfig,
    session: Option<ChatSession>,

    messages: Vec<Message>,
    artifacts: Vec<Artifact>,
    status: ChatStatus,
    selected_persona: Option<&'static Persona>,
    active_tools: Vec<&'static Tool>,

    next_seq: u64,
    in_flight: Option<InFlight>,
    event_tx: mpsc::UnboundedSender<StreamEvent>,
    event_rx: mpsc::UnboundedReceiver<StreamEvent>,
}

impl Controller {
    fn from_builder(builder: ControllerBuilder) -> Self {
        let ControllerBuilder {
            model_client,
            system_instruction,
            generation,
        } = builder;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            model_client,
            system_instruction,
            generation,
            session: None,
            messages: vec![],
            artifacts: vec![],
            status: ChatStatus::Idle,
            selected_persona: None,
            active_tools: vec![],
            next_seq: 1,
            in_flight: None,
            event_tx,
            event_rx,
        }
    }

    /// Returns the transcript, oldest first.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the artifacts extracted so far, oldest first.
    #[inline]
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    /// Returns the state of the current exchange.
    #[inline]
    pub fn status(&self) -> ChatStatus {
        self.status
    }

    /// Returns the persona the next message is addressed to.
    #[inline]
    pub fn selected_persona(&self) -> Option<&'static Persona> {
        self.selected_persona
    }

    /// Returns the enabled integrations in catalog order.
    #[inline]
    pub fn active_tools(&self) -> &[&'static Tool] {
        &self.active_tools
    }

    /// Addresses the next message to `persona`, or clears the selection if
    /// it is already selected. Returns `true` if `persona` is now selected.
    ///
    /// The selection is cleared after the next reply completes.
    pub fn select_persona(&mut self, persona: &'static Persona) -> bool {
        if self.selected_persona.is_some_and(|p| p.id == persona.id) {
            self.selected_persona = None;
            false
        } else {
            self.selected_persona = Some(persona);
            true
        }
    }

    /// Enables `tool`, or disables it if already enabled. Returns `true` if
    /// the tool is now enabled.
    pub fn toggle_tool(&mut self, tool: &'static Tool) -> bool {
        let enabled = self.active_tools.iter().position(|t| t.id == tool.id);
        if let Some(idx) = enabled {
            self.active_tools.remove(idx);
            return false;
        }
        self.active_tools.push(tool);
        self.active_tools.sort_by_key(|t| {
            TOOLS.iter().position(|c| c.id == t.id).unwrap_or(usize::MAX)
        });
        true
    }

    /// Splits a message into persona segments for display.
    #[inline]
    pub fn segments<'a>(&self, message: &'a Message) -> Vec<Segment<'a>> {
        segment::segment(message.content(), &PERSONAS)
    }

    /// Sends a message to the squad.
    ///
    /// The user message and an empty reply are appended right away; the
    /// reply is filled in by [`next_update`](Self::next_update).
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn send(&mut self, input: &str) -> Result<(), SendError> {
        if input.trim().is_empty() {
            return Err(SendError::EmptyInput);
        }
        if !self.status.accepts_input() {
            return Err(SendError::Busy);
        }

        let prompt = self.compose_prompt(input);
        self.messages.push(Message::new(Role::User, input));
        let reply = Message::new(Role::Model, "");
        let reply_id = reply.id;
        self.messages.push(reply);
        self.status = ChatStatus::Thinking;

        let mut session = self.session.take().unwrap_or_else(|| {
            debug!("creating a chat session");
            ChatSession::new(
                self.model_client.clone(),
                self.system_instruction.clone(),
                self.generation,
            )
        });
        let seq = self.next_seq;
        self.next_seq += 1;

        let event_tx = self.event_tx.clone();
        let task = tokio::spawn(
            async move {
                let chunk_tx = event_tx.clone();
                let result = session
                    .send_message(prompt, move |text| {
                        let kind = StreamEventKind::Chunk(text.to_owned());
                        chunk_tx.send(StreamEvent { seq, kind }).ok();
                    })
                    .await;
                let kind = StreamEventKind::Finished { session, result };
                event_tx.send(StreamEvent { seq, kind }).ok();
            }
            .instrument(debug_span!("reply", seq)),
        );
        self.in_flight = Some(InFlight {
            seq,
            reply_id,
            task,
        });
        Ok(())
    }

    /// Waits for the next stream event of the pending reply and applies it.
    ///
    /// Returns `None` if no reply is pending.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. No event is lost if it is cancelled.
    pub async fn next_update(&mut self) -> Option<ControllerUpdate> {
        loop {
            let seq = self.in_flight.as_ref()?.seq;
            let event = self.event_rx.recv().await?;
            if event.seq != seq {
                trace!("dropped an event of request #{}", event.seq);
                continue;
            }

            match event.kind {
                StreamEventKind::Chunk(text) => {
                    self.status = ChatStatus::Streaming;
                    if let Some(reply) = self.pending_reply_mut() {
                        reply.content = text;
                    }
                    return Some(ControllerUpdate::Streaming);
                }
                StreamEventKind::Finished { session, result } => {
                    let update = match result {
                        Ok(text) => self.complete_reply(text),
                        Err(err) => self.fail_reply(err),
                    };
                    self.session = Some(session);
                    self.in_flight = None;
                    return Some(update);
                }
            }
        }
    }

    /// Applies stream events until no reply is pending.
    pub async fn wait_idle(&mut self) {
        while self.next_update().await.is_some() {}
    }

    /// Starts over: clears the transcript and the artifacts and drops the
    /// chat session. A reply in progress is abandoned.
    pub fn reset_project(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!("abandoning request #{}", in_flight.seq);
            in_flight.task.abort();
        }
        self.session = None;
        self.messages.clear();
        self.artifacts.clear();
        self.status = ChatStatus::Idle;
    }

    fn compose_prompt(&self, input: &str) -> String {
        let mut prompt = String::new();
        if !self.active_tools.is_empty() {
            let names = self
                .active_tools
                .iter()
                .map(|t| t.name)
                .collect::<Vec<_>>()
                .join(", ");
            prompt.push_str(&format!(
                "[System Note]: The user has enabled the following \
                 integrations/tools: {names}. Ensure the architecture and \
                 code use these tools where appropriate.\n\n"
            ));
        }
        if let Some(persona) = self.selected_persona {
            prompt.push_str(&format!("@{} ", persona.name));
        }
        prompt.push_str(input);
        prompt
    }

    fn pending_reply_mut(&mut self) -> Option<&mut Message> {
        let reply_id = self.in_flight.as_ref()?.reply_id;
        self.messages.iter_mut().rev().find(|m| m.id == reply_id)
    }

    fn complete_reply(&mut self, text: String) -> ControllerUpdate {
        let found = artifact::extract(&text, &self.artifacts);
        let new_artifacts = found.len();
        info!("reply completed with {new_artifacts} new artifacts");
        self.artifacts.extend(found);
        if let Some(reply) = self.pending_reply_mut() {
            reply.content = text;
        }
        self.selected_persona = None;
        self.status = ChatStatus::Idle;
        ControllerUpdate::Completed { new_artifacts }
    }

    fn fail_reply(
        &mut self,
        err: Box<dyn ModelProviderError>,
    ) -> ControllerUpdate {
        error!("request failed: {err}");
        self.messages
            .push(Message::new(Role::Model, CONNECTION_ERROR_MESSAGE));
        self.status = ChatStatus::Error;
        ControllerUpdate::Failed(err.kind())
    }
}
