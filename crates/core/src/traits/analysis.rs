//! Remote analysis collaborator traits.

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{AnalysisRequest, RemoteReport};

/// Remote multi-agent analysis service.
///
/// Implementations map transport failures to [`crate::Error::RemoteUnavailable`]
/// and unmappable payloads to [`crate::Error::RemoteAnalysisMalformed`].
#[async_trait]
pub trait RemoteAnalysis: Send + Sync {
    /// Analyze one prompt/response pair.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<RemoteReport>;
}

/// Liveness check for the remote analysis service.
#[async_trait]
pub trait AvailabilityProbe: Send + Sync {
    /// Returns `false` on any error, timeout, or non-success status.
    async fn is_remote_available(&self) -> bool;
}
