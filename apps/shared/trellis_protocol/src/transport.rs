use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Invoke a remote callable: `callCallable(callableId, args)`
pub const CALL_CALLABLE: &str = "callCallable";

/// Release a remote callable's backing resources: `releaseCallable(callableId)`
pub const RELEASE_CALLABLE: &str = "releaseCallable";

/// Fetch a widget's document and persisted data: `fetchWidget(name)`
pub const FETCH_WIDGET: &str = "fetchWidget";

/// Bidirectional request/response client the bridge runs on
///
/// Implementations must tolerate concurrent `request` calls; the bridge makes
/// no attempt to serialize invocations and responses may complete in any
/// order the transport delivers them.
///
/// The returned string is the JSON-encoded RPC result text. Parsing it (and
/// surfacing parse failures) is the caller's job, not the transport's.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, method: &str, params: Vec<Value>) -> Result<String>;
}
