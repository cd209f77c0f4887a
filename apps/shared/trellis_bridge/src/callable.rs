//! Callable reference codec and proxy factory

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use trellis_protocol::{CALL_CALLABLE, Transport};

use crate::decode::{DecodedValue, decode_value};
use crate::error::{DecodeError, Result};
use crate::tracker::{CallableTracker, ReleaseGuard};

/// Reserved mapping key that tags a value as a remote callable reference
///
/// Closed-world assumption: ordinary payloads never use this key.
pub const CALLABLE_KEY: &str = "__trCallableId";

/// Opaque token identifying one remote callable instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallableId(String);

impl CallableId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallableId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for CallableId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Extract the callable id if this mapping is a callable marker
pub(crate) fn callable_id_of(map: &Map<String, Value>) -> Option<CallableId> {
    map.get(CALLABLE_KEY)
        .and_then(Value::as_str)
        .map(CallableId::from)
}

struct ProxyInner {
    id: CallableId,
    client: Arc<dyn Transport>,
    tracker: Arc<CallableTracker>,
    // Held only for its Drop; release fires when the last proxy clone goes
    _guard: Option<ReleaseGuard>,
}

/// Local invocable standing in for a remote callable
///
/// Cloning is cheap and shares the same registration: the release signal for
/// this proxy's id fires when the last clone is dropped. Invocations are
/// independent RPC calls with no ordering guarantee relative to each other.
#[derive(Clone)]
pub struct CallableProxy {
    inner: Arc<ProxyInner>,
}

impl CallableProxy {
    /// The remote callable this proxy is bound to
    pub fn id(&self) -> &CallableId {
        &self.inner.id
    }

    /// Invoke the remote callable with the given arguments
    ///
    /// Issues exactly one `callCallable(id, args)` request, parses the JSON
    /// response text and runs it through the result decoder, so callables
    /// embedded in the result come back as live proxies (always registered,
    /// regardless of how this proxy was created).
    ///
    /// # Errors
    ///
    /// Transport failures and unparseable response text both fail the
    /// invocation; neither is swallowed.
    pub async fn call(&self, args: Vec<Value>) -> Result<DecodedValue> {
        let params = vec![Value::String(self.inner.id.to_string()), Value::Array(args)];
        let text = self.inner.client.request(CALL_CALLABLE, params).await?;

        let value: Value = serde_json::from_str(&text).map_err(DecodeError::Parse)?;
        Ok(decode_value(value, &self.inner.client, &self.inner.tracker)?)
    }
}

impl fmt::Debug for CallableProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableProxy")
            .field("id", &self.inner.id)
            .finish()
    }
}

impl PartialEq for CallableProxy {
    /// Proxies compare by callable id; two decode sites yield distinct
    /// proxies for the same id and those compare equal
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

/// Produce a proxy for `id`, registering it in `tracker` unless told not to
///
/// `should_register` suppresses registration of this proxy only; proxies
/// materialized later from its invocation results always register.
pub fn wrap_callable(
    client: Arc<dyn Transport>,
    id: CallableId,
    tracker: Arc<CallableTracker>,
    should_register: bool,
) -> CallableProxy {
    let guard = should_register.then(|| tracker.register(id.clone()));

    CallableProxy {
        inner: Arc::new(ProxyInner {
            id,
            client,
            tracker,
            _guard: guard,
        }),
    }
}
