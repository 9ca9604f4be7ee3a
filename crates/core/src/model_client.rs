use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use devsquad_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

type SendRequestResult =
    Result<ModelClientResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Box<dyn Fn(&str) + Send + 'static>)
        -> BoxedSendRequestFuture + Send + Sync
>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req, on_text| {
            let fut = provider.send_request(&req);
            Box::pin(
                async move {
                    trace!("got a request with {} turns", req.messages.len());
                    let resp_or_err = fut.await;
                    handle_response::<P>(resp_or_err, on_text).await
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the completely received response.
    ///
    /// `on_text` is called with the cumulative text of the response every
    /// time it grows.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_text: impl Fn(&str) + Send + 'static,
    ) -> Result<ModelClientResponse, Box<dyn ModelProviderError>> {
        (self.handler_fn)(req, Box::new(on_text)).await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug)]
pub struct ModelClientResponse {
    pub text: String,
    /// The reason the model finished generating.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_text: Box<dyn Fn(&str) + Send + 'static>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut text = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(event) => event,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };

        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::TextDelta(delta) => {
                if delta.is_empty() {
                    continue;
                }
                text.push_str(&delta);
                on_text(&text);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(ModelClientResponse {
        text,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use devsquad_model::{ErrorKind, GenerationConfig, ModelMessage};
    use devsquad_test_model::{
        PresetEvent, PresetResponse, TestModelProvider,
    };

    use super::*;

    fn request(turns: usize) -> ModelRequest {
        let mut messages = vec![];
        for idx in 0..turns {
            if idx > 0 {
                messages.push(ModelMessage::Model("ok".to_owned()));
            }
            messages.push(ModelMessage::User(format!("Hi #{idx}")));
        }
        ModelRequest {
            system_instruction: None,
            messages,
            generation: GenerationConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        for _ in 0..3 {
            model_provider.add_turn(PresetResponse::with_events([
                PresetEvent::TextDelta("How ".to_owned()),
                PresetEvent::TextDelta(String::new()),
                PresetEvent::TextDelta("are ".to_owned()),
                PresetEvent::TextDelta("you?".to_owned()),
            ]));
        }

        let model_client = ModelClient::new(model_provider);

        for turns in 1..=3 {
            let seen = Arc::new(Mutex::new(Vec::<String>::new()));
            let resp = model_client
                .send_request(request(turns), {
                    let seen = Arc::clone(&seen);
                    move |text| seen.lock().unwrap().push(text.to_owned())
                })
                .await
                .unwrap();
            assert_eq!(resp.text, "How are you?");
            assert_eq!(resp.finish_reason, Some(ModelFinishReason::Stop));
            assert_eq!(
                *seen.lock().unwrap(),
                ["How ", "How are ", "How are you?"]
            );
        }
    }

    #[tokio::test]
    async fn test_error_handling() {
        let model_provider = TestModelProvider::default();
        let model_client = ModelClient::new(model_provider);
        let err = model_client
            .send_request(request(1), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }

    #[tokio::test]
    async fn test_interrupted_stream() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_turn(PresetResponse::with_events([
            PresetEvent::TextDelta("[Atlas]: Let".to_owned()),
            PresetEvent::Interrupt,
        ]));
        let model_client = ModelClient::new(model_provider);
        let err = model_client
            .send_request(request(1), |_| {})
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
