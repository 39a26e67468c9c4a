//! Remote-then-local policy shared by every mutating operation.
//!
//! Any remote failure (network, non-2xx, 401, undecodable body) demotes the
//! call to its local substitute. Local errors are returned as-is; remote errors
//! are only logged.

use std::future::Future;
use tracing::{debug, warn};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    Local,
}

/// A value plus where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub value: T,
    pub source: Source,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPolicy;

impl FallbackPolicy {
    /// `remote` is None when no collaborator is configured.
    pub async fn run<T, E, Fut, L>(&self, operation: &str, remote: Option<Fut>, local: L) -> Result<Served<T>, E>
    where
        Fut: Future<Output = Result<T, ApiError>>,
        L: FnOnce() -> Result<T, E>,
    {
        if let Some(call) = remote {
            match call.await {
                Ok(value) => {
                    debug!("{} served by remote API", operation);
                    return Ok(Served { value, source: Source::Remote });
                }
                Err(e) => warn!("{}: remote API not available ({}), using local fallback", operation, e),
            }
        }
        local().map(|value| Served { value, source: Source::Local })
    }

    /// Fire a remote call whose failure is tolerated; the caller applies the
    /// local change either way.
    pub async fn best_effort<T, Fut>(&self, operation: &str, remote: Option<Fut>) -> Option<T>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let call = remote?;
        match call.await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{}: remote API not available ({}), updating locally", operation, e);
                None
            }
        }
    }
}
