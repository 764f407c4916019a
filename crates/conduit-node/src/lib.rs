// Path: crates/conduit-node/src/lib.rs
//! Wires the Registry, ContextTool, and EventBus services behind one
//! `tonic` server, seeded with the in-memory reference backends used for
//! local development and the test scenarios.

pub mod cli;
pub mod config;

use std::sync::Arc;

use anyhow::Context as _;
use conduit_context::{ComputePricingHandler, ContextToolService, InMemoryContextStore, TelemetryStreams, ToolRegistry};
use conduit_crypto::sign::HmacSha256Signer;
use conduit_crypto::TokenSigner;
use conduit_eventbus::EventBusService;
use conduit_proto::context::context_tool_server::ContextToolServer;
use conduit_proto::context::TelemetryFrame;
use conduit_proto::eventbus::event_bus_server::EventBusServer;
use conduit_proto::registry::registry_server::RegistryServer;
use conduit_registry::RegistryService;
use conduit_types::now_unix_ms;
use config::ConduitConfig;

/// Builds the in-memory `ContextStore` seeded with the fixed entries this
/// deployment mode demonstrates (see the `RequestContext`/`InvokeTool`
/// scenarios this repository's integration tests exercise).
fn seeded_context_store() -> Arc<InMemoryContextStore> {
    let store = Arc::new(InMemoryContextStore::new());
    store.seed("inventory:prod_12345:stock_count", b"42".to_vec(), vec![]);
    store
}

fn seeded_tool_registry() -> Arc<ToolRegistry> {
    let tools = Arc::new(ToolRegistry::new());
    tools.register("compute_pricing", Arc::new(ComputePricingHandler));
    tools
}

/// The in-process publisher `SubscribeTelemetry` depends on: without
/// something injecting frames, a subscriber's stream would sit open
/// forever. This reference deployment publishes a heartbeat frame on
/// `config.heartbeat_stream_id` at `config.heartbeat_interval_secs`; a real
/// deployment replaces this task with one that publishes actual backend
/// telemetry.
fn spawn_heartbeat_publisher(telemetry: Arc<TelemetryStreams>, stream_id: String, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            telemetry.publish(&stream_id, TelemetryFrame { timestamp_ms: now_unix_ms() as i64, payload: vec![] });
        }
    });
}

/// Runs the node until the process is terminated.
pub async fn run(config: ConduitConfig) -> anyhow::Result<()> {
    let addr = config.listen_address.parse().context("invalid listen_address")?;
    let signer: Arc<dyn TokenSigner> = Arc::new(HmacSha256Signer::new(config.hmac_secret.clone().into_bytes()));

    let registry = RegistryServer::new(RegistryService::new(signer.clone()));

    let telemetry_streams = Arc::new(TelemetryStreams::new());
    let context_service = ContextToolService::new(
        config.context_server_name.clone(),
        config.context_required_read_scope.clone(),
        signer.clone(),
        seeded_context_store(),
        seeded_tool_registry(),
        telemetry_streams.clone(),
        config.cache_ttl(),
        config.breaker_threshold,
        config.breaker_recovery(),
    );
    let context_tool = ContextToolServer::new(context_service);

    let eventbus = EventBusServer::new(EventBusService::new(signer.clone()));

    spawn_heartbeat_publisher(
        telemetry_streams,
        config.heartbeat_stream_id.clone(),
        config.heartbeat_interval(),
    );

    tracing::info!(%addr, "starting conduit-node");

    tonic::transport::Server::builder()
        .add_service(registry)
        .add_service(context_tool)
        .add_service(eventbus)
        .serve(addr)
        .await
        .context("gRPC server exited with an error")
}
