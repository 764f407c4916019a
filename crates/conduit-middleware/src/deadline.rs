// Path: crates/conduit-middleware/src/deadline.rs
//! Per-call deadline enforcement driven by the standard gRPC `grpc-timeout`
//! request header, so a handler that runs long past what its caller asked
//! for aborts with `ConduitError::Cancelled` rather than running forever.

use std::future::Future;
use std::time::Duration;

use conduit_types::ConduitError;
use tonic::metadata::MetadataMap;

/// Parses the `grpc-timeout` header (ASCII digits followed by a unit: `H`
/// hours, `M` minutes, `S` seconds, `m` millis, `u` micros, `n` nanos).
/// Returns `None` if the header is absent or malformed; callers then run
/// the call unbounded.
pub fn parse_grpc_timeout(metadata: &MetadataMap) -> Option<Duration> {
    let raw = metadata.get("grpc-timeout")?.to_str().ok()?;
    if raw.len() < 2 {
        return None;
    }
    let (digits, unit) = raw.split_at(raw.len() - 1);
    let value: u64 = digits.parse().ok()?;
    match unit {
        "H" => Some(Duration::from_secs(value.saturating_mul(3600))),
        "M" => Some(Duration::from_secs(value.saturating_mul(60))),
        "S" => Some(Duration::from_secs(value)),
        "m" => Some(Duration::from_millis(value)),
        "u" => Some(Duration::from_micros(value)),
        "n" => Some(Duration::from_nanos(value)),
        _ => None,
    }
}

/// Runs `fut` to completion, aborting with `ConduitError::Cancelled` if the
/// caller's `grpc-timeout` elapses first. A request with no `grpc-timeout`
/// header runs unbounded — deadline propagation is opt-in per call, the way
/// gRPC clients that don't set one expect no server-side timeout.
pub async fn with_deadline<F, T>(metadata: &MetadataMap, fut: F) -> Result<T, ConduitError>
where
    F: Future<Output = Result<T, ConduitError>>,
{
    match parse_grpc_timeout(metadata) {
        Some(budget) => tokio::time::timeout(budget, fut)
            .await
            .unwrap_or_else(|_| Err(ConduitError::Cancelled("grpc-timeout deadline exceeded".into()))),
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::metadata::MetadataValue;

    fn metadata_with_timeout(value: &str) -> MetadataMap {
        let mut map = MetadataMap::new();
        map.insert("grpc-timeout", MetadataValue::try_from(value).unwrap());
        map
    }

    #[test]
    fn parses_seconds() {
        let meta = metadata_with_timeout("5S");
        assert_eq!(parse_grpc_timeout(&meta), Some(Duration::from_secs(5)));
    }

    #[test]
    fn parses_millis() {
        let meta = metadata_with_timeout("250m");
        assert_eq!(parse_grpc_timeout(&meta), Some(Duration::from_millis(250)));
    }

    #[test]
    fn missing_header_is_none() {
        assert_eq!(parse_grpc_timeout(&MetadataMap::new()), None);
    }

    #[test]
    fn malformed_unit_is_none() {
        let meta = metadata_with_timeout("10X");
        assert_eq!(parse_grpc_timeout(&meta), None);
    }

    #[tokio::test]
    async fn a_slow_future_is_cancelled_once_the_deadline_elapses() {
        let meta = metadata_with_timeout("10m");
        let result = with_deadline(&meta, async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok::<_, ConduitError>(())
        })
        .await;
        assert!(matches!(result, Err(ConduitError::Cancelled(_))));
    }

    #[tokio::test]
    async fn a_fast_future_completes_normally() {
        let meta = metadata_with_timeout("1S");
        let result = with_deadline(&meta, async { Ok::<_, ConduitError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
