//! A local fake model for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use devsquad_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Vec<PresetEvent>,
    delay: Duration,
    event_idx: usize,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            ready!(sleep.as_mut().poll(cx));
            this.sleep = None;

            let event_idx = this.event_idx;
            this.event_idx += 1;
            return match this.events.get(event_idx) {
                Some(PresetEvent::TextDelta(text)) => Poll::Ready(Ok(Some(
                    ModelResponseEvent::TextDelta(text.clone()),
                ))),
                Some(PresetEvent::Interrupt) => Poll::Ready(Err(Error {
                    message: "stream interrupted",
                    kind: ErrorKind::Network,
                })),
                None if event_idx == this.events.len() => Poll::Ready(Ok(
                    Some(ModelResponseEvent::Completed(ModelFinishReason::Stop)),
                )),
                // In case this method is called after completion.
                None => Poll::Ready(Ok(None)),
            };
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to each user turn. The turn is selected
/// by counting the user messages in the request history. If there are no
/// enough turns in the script, an error will be returned.
///
/// Clones share the attempt counters and the request log, so a test can keep
/// one clone for inspection after handing the provider over.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    attempts: Arc<Mutex<HashMap<usize, u64>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    /// Appends the response for the next user turn.
    #[inline]
    pub fn add_turn(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    /// Sets the delay before every streamed event.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, oldest first.
    pub fn received_requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_response(
        &self,
        req: &ModelRequest,
    ) -> Result<TestModelResponse, Error> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(req.clone());

        if !matches!(req.messages.last(), Some(ModelMessage::User(_))) {
            return Err(Error {
                message: "request does not end with a user turn",
                kind: ErrorKind::Other,
            });
        }
        let turn_idx = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, ModelMessage::User(_)))
            .count()
            - 1;
        let Some(preset) = self.script.get(turn_idx) else {
            return Err(Error {
                message: "no enough turns",
                kind: ErrorKind::RateLimitExceeded,
            });
        };

        if let Some(failures) = preset.failures {
            let mut attempts = self
                .attempts
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let attempt = attempts.entry(turn_idx).or_default();
            *attempt += 1;
            if failures == 0 || *attempt <= failures {
                return Err(Error {
                    message: "scripted failure",
                    kind: ErrorKind::Network,
                });
            }
        }

        Ok(TestModelResponse {
            events: preset.events.clone(),
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            event_idx: 0,
            sleep: None,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.next_response(req))
    }
}

#[cfg(test)]
mod tests {
    use std::future::poll_fn;
    use std::pin::pin;

    use devsquad_model::GenerationConfig;

    use super::*;

    async fn collect_response(
        resp: TestModelResponse,
    ) -> Result<String, Error> {
        let mut resp = pin!(resp);
        let mut text = String::new();
        while let Some(event) =
            poll_fn(|cx| resp.as_mut().poll_next_event(cx)).await?
        {
            match event {
                ModelResponseEvent::TextDelta(delta) => text.push_str(&delta),
                ModelResponseEvent::Completed(_) => {}
            }
        }
        Ok(text)
    }

    fn request(messages: Vec<ModelMessage>) -> ModelRequest {
        ModelRequest {
            system_instruction: None,
            messages,
            generation: GenerationConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut provider = TestModelProvider::default();
        provider.add_turn(PresetResponse::with_events([
            PresetEvent::TextDelta("[Atlas]: Hello, ".to_owned()),
            PresetEvent::TextDelta("world!".to_owned()),
        ]));
        provider.add_turn(PresetResponse::with_text("[Neo]: On it.", 4));

        let mut messages = vec![ModelMessage::User("Hi".to_owned())];
        let resp = provider.send_request(&request(messages.clone())).await;
        let text = collect_response(resp.unwrap()).await.unwrap();
        assert_eq!(text, "[Atlas]: Hello, world!");

        messages.push(ModelMessage::Model(text));
        messages.push(ModelMessage::User("Build it".to_owned()));
        let resp = provider.send_request(&request(messages)).await;
        let text = collect_response(resp.unwrap()).await.unwrap();
        assert_eq!(text, "[Neo]: On it.");

        assert_eq!(provider.received_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_then_success() {
        let mut provider = TestModelProvider::default();
        provider.add_turn(PresetResponse::with_text("ok", 8).with_failures(1));

        let req = request(vec![ModelMessage::User("Hi".to_owned())]);
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Network);

        let resp = provider.send_request(&req).await.unwrap();
        assert_eq!(collect_response(resp).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_interrupt() {
        let mut provider = TestModelProvider::default();
        provider.add_turn(PresetResponse::with_events([
            PresetEvent::TextDelta("partial".to_owned()),
            PresetEvent::Interrupt,
        ]));

        let req = request(vec![ModelMessage::User("Hi".to_owned())]);
        let resp = provider.send_request(&req).await.unwrap();
        let err = collect_response(resp).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_script_exhausted() {
        let provider = TestModelProvider::default();
        let req = request(vec![ModelMessage::User("Hi".to_owned())]);
        let err = provider.send_request(&req).await.err().unwrap();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }
}
