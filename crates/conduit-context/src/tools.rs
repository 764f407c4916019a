// Path: crates/conduit-context/src/tools.rs
//! Tool dispatch: a name-keyed registry of handlers invoked by
//! `InvokeTool`. Unknown names are not a dispatch error (§4.D: a soft
//! warning, `success=true`) — that behavior lives in the service, not
//! here; this module only resolves names to handlers.

use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

/// A registered tool implementation.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Executes the tool against `arguments`, returning named output
    /// blobs. An `Err` here is a handler exception: fatal to the call,
    /// and it trips the circuit breaker.
    async fn invoke(&self, arguments: &HashMap<String, String>) -> Result<HashMap<String, Vec<u8>>, String>;
}

/// The set of tools this `ContextTool` instance can dispatch to, keyed by
/// exact name.
#[derive(Default)]
pub struct ToolRegistry {
    handlers: DashMap<String, std::sync::Arc<dyn ToolHandler>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { handlers: DashMap::new() }
    }

    pub fn register(&self, name: impl Into<String>, handler: std::sync::Arc<dyn ToolHandler>) {
        self.handlers.insert(name.into(), handler);
    }

    pub fn get(&self, name: &str) -> Option<std::sync::Arc<dyn ToolHandler>> {
        self.handlers.get(name).map(|entry| entry.value().clone())
    }
}

/// Reference handler for `compute_pricing`: `recommended_price = 100.0 -
/// 0.1 * stock_count`.
pub struct ComputePricingHandler;

#[async_trait]
impl ToolHandler for ComputePricingHandler {
    async fn invoke(&self, arguments: &HashMap<String, String>) -> Result<HashMap<String, Vec<u8>>, String> {
        let stock_count: f64 = arguments
            .get("stock_count")
            .ok_or_else(|| "missing argument 'stock_count'".to_string())?
            .parse()
            .map_err(|_| "argument 'stock_count' is not a number".to_string())?;

        let recommended_price = 100.0 - 0.1 * stock_count;
        let mut outputs = HashMap::new();
        outputs.insert("recommended_price".to_string(), format!("{recommended_price:.1}").into_bytes());
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn compute_pricing_matches_the_reference_formula() {
        let handler = ComputePricingHandler;
        let mut arguments = HashMap::new();
        arguments.insert("sku".to_string(), "prod_12345".to_string());
        arguments.insert("stock_count".to_string(), "42".to_string());
        let outputs = handler.invoke(&arguments).await.unwrap();
        assert_eq!(outputs.get("recommended_price").unwrap(), b"95.8");
    }

    #[tokio::test]
    async fn compute_pricing_rejects_missing_argument() {
        let handler = ComputePricingHandler;
        assert!(handler.invoke(&HashMap::new()).await.is_err());
    }

    #[test]
    fn registry_resolves_by_exact_name() {
        let registry = ToolRegistry::new();
        registry.register("compute_pricing", std::sync::Arc::new(ComputePricingHandler));
        assert!(registry.get("compute_pricing").is_some());
        assert!(registry.get("sql_query").is_none());
    }
}
