// Path: crates/conduit-registry/src/service.rs
use std::sync::Arc;
use std::time::Instant;

use conduit_capability::authorize;
use conduit_crypto::TokenSigner;
use conduit_proto::registry::registry_server::Registry;
use conduit_proto::registry::{
    EndpointDescriptor, LookupRequest, LookupResponse, RegisterRequest, RegisterResponse,
};
use conduit_telemetry::{emit, TelemetryRecord};
use conduit_types::{wildcard_match, ConduitError, ErrorCode};
use tonic::{Request, Response, Status};

use crate::store::EndpointStore;

const AUDIENCE: &str = "RegistryServer";

/// The Discovery Registry: an authenticated endpoint directory. Owns the
/// only writable copy of the endpoint map in the process.
pub struct RegistryService {
    store: Arc<EndpointStore>,
    signer: Arc<dyn TokenSigner>,
}

impl RegistryService {
    pub fn new(signer: Arc<dyn TokenSigner>) -> Self {
        Self { store: Arc::new(EndpointStore::new()), signer }
    }

    fn emit(&self, method: &str, client: &str, started: Instant, status: &str) {
        emit(TelemetryRecord::new(method, client, started.elapsed().as_millis() as u64, status));
    }
}

#[tonic::async_trait]
impl Registry for RegistryService {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let started = Instant::now();
        let transport_address = request
            .metadata()
            .get("grpc-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let req = request.into_inner();
        tracing::debug!(server_name = %req.server_name, "Register: entry");

        let result = (|| -> Result<(), ConduitError> {
            let transport_address = transport_address
                .ok_or_else(|| ConduitError::InvalidArgument("missing grpc-url metadata".into()))?;

            authorize(&req.registration_token, self.signer.as_ref(), "registry:register", AUDIENCE)?;

            self.store.register(req.server_name.clone(), transport_address, req.capabilities.clone());
            Ok(())
        })();

        match result {
            Ok(()) => {
                tracing::debug!(server_name = %req.server_name, "Register: exit ok");
                self.emit("Register", &req.server_name, started, "ok");
                Ok(Response::new(RegisterResponse { success: true, message: String::new() }))
            }
            Err(err) => {
                tracing::warn!(server_name = %req.server_name, code = err.code(), "Register: exit error");
                self.emit("Register", &req.server_name, started, err.code());
                Err(err.into())
            }
        }
    }

    async fn lookup(
        &self,
        request: Request<LookupRequest>,
    ) -> Result<Response<LookupResponse>, Status> {
        let started = Instant::now();
        let req = request.into_inner();
        tracing::debug!(filter = ?req.capability_filter, "Lookup: entry");

        let result = (|| -> Result<Vec<EndpointDescriptor>, ConduitError> {
            let claims = authorize(&req.requester_token, self.signer.as_ref(), "registry:lookup", AUDIENCE)?;

            let endpoints = self
                .store
                .snapshot()
                .into_iter()
                .filter(|endpoint| {
                    let capability_matches = req
                        .capability_filter
                        .iter()
                        .any(|filter| endpoint.capabilities.iter().any(|c| wildcard_match(c, filter)));
                    let audience_matches = claims.has_audience(&endpoint.server_name);
                    capability_matches && audience_matches
                })
                .map(|endpoint| EndpointDescriptor {
                    server_name: endpoint.server_name,
                    grpc_url: endpoint.transport_address,
                    capabilities: endpoint.capabilities,
                })
                .collect();

            Ok(endpoints)
        })();

        match result {
            Ok(endpoints) => {
                tracing::debug!(count = endpoints.len(), "Lookup: exit ok");
                self.emit("Lookup", &req.requester_token, started, "ok");
                Ok(Response::new(LookupResponse { endpoints }))
            }
            Err(err) => {
                tracing::warn!(code = err.code(), "Lookup: exit error");
                self.emit("Lookup", &req.requester_token, started, err.code());
                Err(err.into())
            }
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

    fn register_token(signer: &dyn TokenSigner, sub: &str) -> String {
        CapabilityToken::issue(signer, sub, vec!["registry:register".into()], vec![AUDIENCE.into()], 300)
            .unwrap()
            .encode()
    }

    #[tokio::test]
    async fn register_then_lookup_returns_the_endpoint_when_audience_matches() {
        let signer = signer();
        let service = RegistryService::new(signer.clone());

        let mut request = Request::new(RegisterRequest {
            server_name: "alpha".into(),
            capabilities: vec!["db:inventory:read".into()],
            registration_token: register_token(signer.as_ref(), "provider-1"),
        });
        request.metadata_mut().insert("grpc-url", "https://alpha.local".parse().unwrap());
        service.register(request).await.expect("register succeeds");

        let requester_token = CapabilityToken::issue(
            signer.as_ref(),
            "agent-1",
            vec!["registry:lookup".into()],
            vec!["alpha".into()],
            300,
        )
        .unwrap()
        .encode();
        let lookup = service
            .lookup(Request::new(LookupRequest {
                requester_token,
                capability_filter: vec!["db:inventory:read".into()],
            }))
            .await
            .expect("lookup succeeds")
            .into_inner();

        assert_eq!(lookup.endpoints.len(), 1);
        assert_eq!(lookup.endpoints[0].server_name, "alpha");
    }

    #[tokio::test]
    async fn lookup_hides_endpoints_outside_the_requesters_audience() {
        let signer = signer();
        let service = RegistryService::new(signer.clone());

        let mut request = Request::new(RegisterRequest {
            server_name: "alpha".into(),
            capabilities: vec!["db:inventory:read".into()],
            registration_token: register_token(signer.as_ref(), "provider-1"),
        });
        request.metadata_mut().insert("grpc-url", "https://alpha.local".parse().unwrap());
        service.register(request).await.expect("register succeeds");

        let requester_token = CapabilityToken::issue(
            signer.as_ref(),
            "agent-1",
            vec!["registry:lookup".into()],
            vec!["beta".into()],
            300,
        )
        .unwrap()
        .encode();
        let lookup = service
            .lookup(Request::new(LookupRequest {
                requester_token,
                capability_filter: vec!["db:inventory:read".into()],
            }))
            .await
            .expect("lookup succeeds")
            .into_inner();

        assert!(lookup.endpoints.is_empty());
    }

    #[tokio::test]
    async fn register_without_grpc_url_metadata_is_invalid_argument() {
        let signer = signer();
        let service = RegistryService::new(signer.clone());
        let request = Request::new(RegisterRequest {
            server_name: "alpha".into(),
            capabilities: vec![],
            registration_token: register_token(signer.as_ref(), "provider-1"),
        });
        let status = service.register(request).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn register_without_required_scope_is_permission_denied() {
        let signer = signer();
        let service = RegistryService::new(signer.clone());
        let token = CapabilityToken::issue(signer.as_ref(), "provider-1", vec![], vec![AUDIENCE.into()], 300)
            .unwrap()
            .encode();
        let mut request = Request::new(RegisterRequest {
            server_name: "alpha".into(),
            capabilities: vec![],
            registration_token: token,
        });
        request.metadata_mut().insert("grpc-url", "https://alpha.local".parse().unwrap());
        let status = service.register(request).await.unwrap_err();
        assert_eq!(status.code(), tonic::Code::PermissionDenied);
    }
}
