// Path: crates/conduit-eventbus/src/service.rs
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use conduit_capability::authorize;
use conduit_crypto::TokenSigner;
use conduit_proto::eventbus::event_bus_server::EventBus;
use conduit_proto::eventbus::{EventEnvelope, EventPublishRequest, EventPublishResponse, EventSubscribeRequest};
use conduit_telemetry::{emit, TelemetryRecord};
use conduit_types::{ConduitError, ErrorCode};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tonic::{Request, Response, Status};

use crate::topics::{SubscriptionHandle, TopicRegistry};

const AUDIENCE: &str = "EventBusServer";

/// The EventBus: topic-pattern publish/subscribe with per-topic monotonic
/// sequencing and authenticated fan-out.
pub struct EventBusService {
    signer: Arc<dyn TokenSigner>,
    topics: Arc<TopicRegistry>,
}

impl EventBusService {
    pub fn new(signer: Arc<dyn TokenSigner>) -> Self {
        Self { signer, topics: Arc::new(TopicRegistry::new()) }
    }

    pub fn topics(&self) -> Arc<TopicRegistry> {
        self.topics.clone()
    }

    fn emit(&self, method: &str, client: &str, started: Instant, status: &str) {
        emit(TelemetryRecord::new(method, client, started.elapsed().as_millis() as u64, status));
    }
}

#[tonic::async_trait]
impl EventBus for EventBusService {
    async fn publish(
        &self,
        request: Request<EventPublishRequest>,
    ) -> Result<Response<EventPublishResponse>, Status> {
        let started = Instant::now();
        let req = request.into_inner();

        let result = (|| -> Result<u64, ConduitError> {
            let claims = authorize(
                &req.publisher_token,
                self.signer.as_ref(),
                &format!("event:publish:{}", req.topic),
                AUDIENCE,
            )?;
            let sequence_id = self.topics.publish(&req.topic, req.payload.clone());
            tracing::debug!(publisher = %claims.sub, topic = %req.topic, sequence_id, "published event");
            Ok(sequence_id)
        })();

        match result {
            Ok(_) => {
                self.emit("Publish", &req.topic, started, "ok");
                Ok(Response::new(EventPublishResponse { success: true, message: String::new() }))
            }
            Err(err) => {
                self.emit("Publish", &req.topic, started, err.code());
                Err(err.into())
            }
        }
    }

    type SubscribeStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope, Status>> + Send + 'static>>;

    async fn subscribe(
        &self,
        request: Request<EventSubscribeRequest>,
    ) -> Result<Response<Self::SubscribeStream>, Status> {
        let started = Instant::now();
        let req = request.into_inner();

        let claims = match authorize(
            &req.subscriber_token,
            self.signer.as_ref(),
            &format!("event:subscribe:{}", req.topic_filter),
            AUDIENCE,
        ) {
            Ok(claims) => claims,
            Err(err) => {
                self.emit("Subscribe", &req.topic_filter, started, err.code());
                return Err(err.into());
            }
        };
        self.emit("Subscribe", &claims.sub, started, "ok");

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = self.topics.subscribe(&req.topic_filter, tx);
        let topics = self.topics.clone();

        let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, Status>);
        let guarded = TeardownStream { inner: stream, topics, handle: Some(handle) };
        Ok(Response::new(Box::pin(guarded)))
    }
}

/// Unsubscribes the moment the response stream is dropped — client
/// cancellation or normal completion both run this, so fan-out never
/// targets a dead stream.
struct TeardownStream<S> {
    inner: S,
    topics: Arc<TopicRegistry>,
    handle: Option<SubscriptionHandle>,
}

impl<S> Stream for TeardownStream<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<S> Drop for TeardownStream<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.topics.unsubscribe(&handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_capability::CapabilityToken;
    use conduit_crypto::sign::HmacSha256Signer;

    fn signer() -> Arc<dyn TokenSigner> {
        Arc::new(HmacSha256Signer::new(b"secret".to_vec()))
    }

    #[tokio::test]
    async fn publish_delivers_to_a_matching_prior_subscriber_in_sequence_order() {
        let signer = signer();
        let service = EventBusService::new(signer.clone());

        let subscriber_token = CapabilityToken::issue(
            signer.as_ref(),
            "agent-sub",
            vec!["event:subscribe:inventory:*:low_stock".into()],
            vec![AUDIENCE.into()],
            300,
        )
        .unwrap()
        .encode();
        let mut stream = service
            .subscribe(Request::new(EventSubscribeRequest {
                topic_filter: "inventory:*:low_stock".into(),
                subscriber_token,
            }))
            .await
            .unwrap()
            .into_inner();

        let publisher_token = CapabilityToken::issue(
            signer.as_ref(),
            "agent-pub",
            vec!["event:publish:inventory:*".into()],
            vec![AUDIENCE.into()],
            300,
        )
        .unwrap()
        .encode();
        service
            .publish(Request::new(EventPublishRequest {
                topic: "inventory:prod_12345:low_stock".into(),
                payload: br#"{"current_stock":9}"#.to_vec(),
                publisher_token,
            }))
            .await
            .unwrap();

        let envelope = stream.next().await.unwrap().unwrap();
        assert_eq!(envelope.sequence_id, 1);
        assert_eq!(envelope.topic, "inventory:prod_12345:low_stock");
    }

    #[tokio::test]
    async fn publish_without_matching_scope_is_permission_denied() {
        let signer = signer();
        let service = EventBusService::new(signer.clone());
        let publisher_token = CapabilityToken::issue(
            signer.as_ref(),
            "agent-pub",
            vec!["event:publish:other:*".into()],
            vec![AUDIENCE.into()],
            300,
        )
        .unwrap()
        .encode();

        let status = service
            .publish(Request::new(EventPublishRequest {
                topic: "inventory:prod_12345:low_stock".into(),
                payload: vec![],
                publisher_token,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::PermissionDenied);
    }
}
