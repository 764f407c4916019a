// Path: crates/conduit-context/src/service.rs
use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use conduit_capability::authorize;
use conduit_crypto::TokenSigner;
use conduit_middleware::{with_deadline, CircuitBreaker, TtlCache};
use conduit_proto::context::context_tool_server::ContextTool;
use conduit_proto::context::{
    ContextRequest, ContextResponse, MultiModalFrame, TelemetryFrame, TelemetryRequest, ToolRequest, ToolResponse,
};
use conduit_telemetry::{emit, TelemetryRecord};
use conduit_types::{now_unix_ms, ConduitError, ErrorCode};
use futures::{Stream, StreamExt};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tonic::{Request, Response, Status, Streaming};

use crate::store::ContextStore;
use crate::telemetry_stream::TelemetryStreams;
use crate::tools::ToolRegistry;

/// Value cached for one `(context_key, sorted parameters)` pair.
#[derive(Debug, Clone)]
struct CachedContext {
    serialized_value: Vec<u8>,
    metadata: Vec<String>,
}

/// One `ContextTool` deployment: context retrieval, telemetry fan-out,
/// multimodal echo, and tool dispatch, each framed by auth + cache/breaker
/// where the spec calls for it.
pub struct ContextToolService {
    /// This instance's own name, matched against a caller's `aud` entries.
    server_name: String,
    /// The scope this deployment requires for `RequestContext`, e.g.
    /// `db:inventory:read` — dynamically configured, not hardcoded, since
    /// the domain varies per deployment.
    required_read_scope: String,
    signer: Arc<dyn TokenSigner>,
    store: Arc<dyn ContextStore>,
    cache: TtlCache<String, CachedContext>,
    cache_ttl: Duration,
    breaker: CircuitBreaker,
    tools: Arc<ToolRegistry>,
    telemetry: Arc<TelemetryStreams>,
}

impl ContextToolService {
    pub fn new(
        server_name: impl Into<String>,
        required_read_scope: impl Into<String>,
        signer: Arc<dyn TokenSigner>,
        store: Arc<dyn ContextStore>,
        tools: Arc<ToolRegistry>,
        telemetry: Arc<TelemetryStreams>,
        cache_ttl: Duration,
        breaker_threshold: u32,
        breaker_recovery: Duration,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            required_read_scope: required_read_scope.into(),
            signer,
            store,
            cache: TtlCache::new(),
            cache_ttl,
            breaker: CircuitBreaker::new(breaker_threshold, breaker_recovery),
            tools,
            telemetry,
        }
    }

    pub fn telemetry_streams(&self) -> Arc<TelemetryStreams> {
        self.telemetry.clone()
    }

    fn emit(&self, method: &str, client: &str, started: Instant, status: &str) {
        emit(TelemetryRecord::new(method, client, started.elapsed().as_millis() as u64, status));
    }

    fn cache_key(context_key: &str, parameters: &BTreeMap<String, String>) -> String {
        let mut key = context_key.to_string();
        for (k, v) in parameters {
            key.push('\u{0}');
            key.push_str(k);
            key.push('=');
            key.push_str(v);
        }
        key
    }
}

#[tonic::async_trait]
impl ContextTool for ContextToolService {
    async fn request_context(
        &self,
        request: Request<ContextRequest>,
    ) -> Result<Response<ContextResponse>, Status> {
        let started = Instant::now();
        let metadata = request.metadata().clone();
        let req = request.into_inner();
        tracing::debug!(context_key = %req.context_key, "RequestContext: entry");

        if !self.breaker.before_call() {
            let err = ConduitError::Unavailable("circuit breaker open".into());
            tracing::warn!(context_key = %req.context_key, "RequestContext: breaker open, rejecting");
            self.emit("RequestContext", &req.context_key, started, err.code());
            return Err(err.into());
        }

        let result = with_deadline(&metadata, self.handle_request_context(req.clone())).await;
        self.breaker.after_call(!matches!(&result, Err(e) if e.trips_breaker()));

        match result {
            Ok(response) => {
                tracing::debug!(context_key = %req.context_key, "RequestContext: exit ok");
                self.emit("RequestContext", &req.context_key, started, "ok");
                Ok(Response::new(response))
            }
            Err(err) => {
                tracing::warn!(context_key = %req.context_key, code = err.code(), "RequestContext: exit error");
                self.emit("RequestContext", &req.context_key, started, err.code());
                Err(err.into())
            }
        }
    }

    type SubscribeTelemetryStream = Pin<Box<dyn Stream<Item = Result<TelemetryFrame, Status>> + Send + 'static>>;

    async fn subscribe_telemetry(
        &self,
        request: Request<TelemetryRequest>,
    ) -> Result<Response<Self::SubscribeTelemetryStream>, Status> {
        let started = Instant::now();
        let req = request.into_inner();
        tracing::debug!(stream_id = %req.stream_id, "SubscribeTelemetry: entry");

        let result = authorize(&req.capability_token, self.signer.as_ref(), "telemetry:read", &self.server_name);
        let claims = match result {
            Ok(claims) => claims,
            Err(err) => {
                tracing::warn!(stream_id = %req.stream_id, code = err.code(), "SubscribeTelemetry: exit error");
                self.emit("SubscribeTelemetry", &req.stream_id, started, err.code());
                return Err(err.into());
            }
        };
        tracing::debug!(subscriber = %claims.sub, "SubscribeTelemetry: exit ok");
        self.emit("SubscribeTelemetry", &claims.sub, started, "ok");

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = self.telemetry.register(&req.stream_id, tx);
        let telemetry = self.telemetry.clone();

        let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, Status>);
        let guarded = TeardownStream { inner: stream, telemetry, handle: Some(handle) };
        Ok(Response::new(Box::pin(guarded)))
    }

    type MultiModalExchangeStream = Pin<Box<dyn Stream<Item = Result<MultiModalFrame, Status>> + Send + 'static>>;

    async fn multi_modal_exchange(
        &self,
        request: Request<Streaming<MultiModalFrame>>,
    ) -> Result<Response<Self::MultiModalExchangeStream>, Status> {
        let started = Instant::now();
        tracing::debug!("MultiModalExchange: entry");
        let mut inbound = request.into_inner();
        let signer = self.signer.clone();
        let server_name = self.server_name.clone();

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Result<MultiModalFrame, Status>>();

        tokio::spawn(async move {
            let mut authorized = false;
            while let Some(frame) = inbound.message().await.transpose() {
                let frame = match frame {
                    Ok(f) => f,
                    Err(status) => {
                        let _ = tx.send(Err(status));
                        break;
                    }
                };

                if !authorized {
                    let Some(token) = frame.capability_token.as_deref() else {
                        let _ = tx.send(Err(ConduitError::Unauthenticated(
                            "first frame missing capability_token".into(),
                        )
                        .into()));
                        break;
                    };
                    if let Err(err) = authorize(token, signer.as_ref(), "tool:multimodal_exchange", &server_name) {
                        let _ = tx.send(Err(err.into()));
                        break;
                    }
                    authorized = true;
                }

                // Default semantics: echo. Real deployments replace this
                // stage with a transform while keeping pass-through of
                // variants they don't recognize.
                if tx.send(Ok(frame)).is_err() {
                    break;
                }
            }
        });

        tracing::debug!("MultiModalExchange: exit ok, stream handed off");
        self.emit("MultiModalExchange", "stream", started, "ok");
        let stream = UnboundedReceiverStream::new(rx);
        Ok(Response::new(Box::pin(stream)))
    }

    async fn invoke_tool(&self, request: Request<ToolRequest>) -> Result<Response<ToolResponse>, Status> {
        let started = Instant::now();
        let metadata = request.metadata().clone();
        let req = request.into_inner();
        tracing::debug!(tool_name = %req.tool_name, "InvokeTool: entry");

        if !self.breaker.before_call() {
            let err = ConduitError::Unavailable("circuit breaker open".into());
            tracing::warn!(tool_name = %req.tool_name, "InvokeTool: breaker open, rejecting");
            self.emit("InvokeTool", &req.tool_name, started, err.code());
            return Err(err.into());
        }

        let result = with_deadline(&metadata, self.handle_invoke_tool(&req)).await;
        self.breaker.after_call(!matches!(&result, Err(e) if e.trips_breaker()));

        match result {
            Ok(response) => {
                tracing::debug!(tool_name = %req.tool_name, "InvokeTool: exit ok");
                self.emit("InvokeTool", &req.tool_name, started, "ok");
                Ok(Response::new(response))
            }
            Err(err) => {
                tracing::warn!(tool_name = %req.tool_name, code = err.code(), "InvokeTool: exit error");
                self.emit("InvokeTool", &req.tool_name, started, err.code());
                Err(err.into())
            }
        }
    }
}

impl ContextToolService {
    async fn handle_request_context(&self, req: ContextRequest) -> Result<ContextResponse, ConduitError> {
        authorize(&req.capability_token, self.signer.as_ref(), &self.required_read_scope, &self.server_name)?;

        let parameters: BTreeMap<String, String> = req.parameters.into_iter().collect();
        let key = Self::cache_key(&req.context_key, &parameters);

        if let Some(cached) = self.cache.get(&key) {
            return Ok(ContextResponse { serialized_value: cached.serialized_value, metadata: cached.metadata });
        }

        let value = self
            .store
            .get(&req.context_key, &parameters)
            .await
            .map_err(|_| ConduitError::Unavailable("backing store unavailable".into()))?;

        let mut metadata = value.metadata;
        metadata.push(format!("timestamp:{}", now_unix_ms()));

        let cached = CachedContext { serialized_value: value.serialized_value, metadata };
        self.cache.set(key, cached.clone(), self.cache_ttl);

        Ok(ContextResponse { serialized_value: cached.serialized_value, metadata: cached.metadata })
    }

    async fn handle_invoke_tool(&self, req: &ToolRequest) -> Result<ToolResponse, ConduitError> {
        let required_scope = format!("tool:{}", req.tool_name);
        let claims = authorize(&req.capability_token, self.signer.as_ref(), &required_scope, &self.server_name)?;

        if let Some(proof_wire) = &req.agent_delegation_proof {
            let proof = conduit_capability::DelegationProof::decode(proof_wire)
                .map_err(|e| ConduitError::Unauthenticated(e.to_string()))?;
            proof.verify(self.signer.as_ref(), &claims).map_err(|e| ConduitError::Unauthenticated(e.to_string()))?;
        }

        let Some(handler) = self.tools.get(&req.tool_name) else {
            // Unknown tool name: returned as a warning, not an error, so it
            // never trips the breaker.
            return Ok(ToolResponse {
                success: true,
                outputs: Default::default(),
                warnings: vec![format!("unknown tool '{}'", req.tool_name)],
            });
        };

        match handler.invoke(&req.arguments).await {
            Ok(outputs) => Ok(ToolResponse { success: true, outputs, warnings: vec![] }),
            Err(reason) => Err(ConduitError::Internal(format!("tool '{}' failed: {reason}", req.tool_name))),
        }
    }
}

/// Wraps a subscriber's frame stream so its [`crate::telemetry_stream::SubscriptionHandle`]
/// is unregistered the moment the stream is dropped — covering both client
/// cancellation and normal completion promptly.
struct TeardownStream<S> {
    inner: S,
    telemetry: Arc<TelemetryStreams>,
    handle: Option<crate::telemetry_stream::SubscriptionHandle>,
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
            self.telemetry.unregister(&handle);
        }
    }
}
