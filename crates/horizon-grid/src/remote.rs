//! Remote save transport boundary.

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::SaveError;
use crate::schema::SaveApi;

/// Sends a quick-save payload to a remote endpoint.
///
/// The returned future owns everything it needs so callers can drop their
/// locks before awaiting it.
pub trait SaveTransport: Send + Sync {
    /// Submit `payload` to `api`, resolving to the response data.
    fn save(&self, api: &SaveApi, payload: Value) -> BoxFuture<'static, Result<Value, SaveError>>;
}

/// A transport for tables without remote persistence; every save fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransport;

impl SaveTransport for NoTransport {
    fn save(&self, api: &SaveApi, _payload: Value) -> BoxFuture<'static, Result<Value, SaveError>> {
        let message = format!("no save transport configured for {}", api.url());
        Box::pin(async move { Err(SaveError::new(message)) })
    }
}

/// Messages shown when a remote save settles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteMessages {
    /// Shown on success.
    pub success: Option<String>,
    /// Shown on failure instead of the remote message.
    pub error: Option<String>,
}
