//! Result decoder: recursive replacement of callable markers with proxies

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use trellis_protocol::Transport;

use crate::callable::{CallableProxy, callable_id_of, wrap_callable};
use crate::error::DecodeError;
use crate::tracker::CallableTracker;

/// Safety ceiling on decode recursion
pub const MAX_DECODE_DEPTH: usize = 128;

/// A decoded RPC result
///
/// Structurally identical to the JSON input except that every callable
/// marker, at any depth, has been replaced by a live [`CallableProxy`].
/// `Scalar` never holds an array or object.
#[derive(Clone)]
pub enum DecodedValue {
    Scalar(Value),
    Sequence(Vec<DecodedValue>),
    Mapping(IndexMap<String, DecodedValue>),
    Callable(CallableProxy),
}

impl DecodedValue {
    /// Borrow the proxy if this is a callable
    pub fn as_callable(&self) -> Option<&CallableProxy> {
        match self {
            DecodedValue::Callable(proxy) => Some(proxy),
            _ => None,
        }
    }

    /// Borrow the string if this is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DecodedValue::Scalar(value) => value.as_str(),
            _ => None,
        }
    }

    /// Borrow the items if this is a sequence
    pub fn as_sequence(&self) -> Option<&[DecodedValue]> {
        match self {
            DecodedValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the entries if this is a mapping
    pub fn as_mapping(&self) -> Option<&IndexMap<String, DecodedValue>> {
        match self {
            DecodedValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key if this is a mapping
    pub fn get(&self, key: &str) -> Option<&DecodedValue> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Re-encode as plain JSON, or `None` if any callable is embedded
    ///
    /// Key order and sequence order are preserved, so for marker-free input
    /// this is the structural identity of the original value.
    pub fn to_plain_value(&self) -> Option<Value> {
        match self {
            DecodedValue::Scalar(value) => Some(value.clone()),
            DecodedValue::Sequence(items) => items
                .iter()
                .map(DecodedValue::to_plain_value)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            DecodedValue::Mapping(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), value.to_plain_value()?);
                }
                Some(Value::Object(out))
            }
            DecodedValue::Callable(_) => None,
        }
    }
}

impl std::fmt::Debug for DecodedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodedValue::Scalar(value) => write!(f, "Scalar({})", value),
            DecodedValue::Sequence(items) => f.debug_list().entries(items).finish(),
            DecodedValue::Mapping(map) => f.debug_map().entries(map.iter()).finish(),
            DecodedValue::Callable(proxy) => write!(f, "Callable({})", proxy.id()),
        }
    }
}

impl PartialEq for DecodedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DecodedValue::Scalar(a), DecodedValue::Scalar(b)) => a == b,
            (DecodedValue::Sequence(a), DecodedValue::Sequence(b)) => a == b,
            (DecodedValue::Mapping(a), DecodedValue::Mapping(b)) => a == b,
            (DecodedValue::Callable(a), DecodedValue::Callable(b)) => a == b,
            _ => false,
        }
    }
}

/// Walk `value`, replacing every callable marker with a registered proxy
///
/// Pure structural recursion: sequences and mappings are rebuilt with each
/// element decoded (keys and order unchanged), scalars pass through, and any
/// mapping carrying [`CALLABLE_KEY`](crate::CALLABLE_KEY) with a string value
/// becomes a [`CallableProxy`]. Depth is bounded by [`MAX_DECODE_DEPTH`].
pub fn decode_value(
    value: Value,
    client: &Arc<dyn Transport>,
    tracker: &Arc<CallableTracker>,
) -> Result<DecodedValue, DecodeError> {
    decode_at(value, client, tracker, 0)
}

fn decode_at(
    value: Value,
    client: &Arc<dyn Transport>,
    tracker: &Arc<CallableTracker>,
    depth: usize,
) -> Result<DecodedValue, DecodeError> {
    if depth > MAX_DECODE_DEPTH {
        return Err(DecodeError::DepthExceeded(MAX_DECODE_DEPTH));
    }

    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(decode_at(item, client, tracker, depth + 1)?);
            }
            Ok(DecodedValue::Sequence(out))
        }
        Value::Object(map) => {
            if let Some(id) = callable_id_of(&map) {
                // Proxies decoded out of results always register
                return Ok(DecodedValue::Callable(wrap_callable(
                    Arc::clone(client),
                    id,
                    Arc::clone(tracker),
                    true,
                )));
            }

            let mut out = IndexMap::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key, decode_at(item, client, tracker, depth + 1)?);
            }
            Ok(DecodedValue::Mapping(out))
        }
        scalar => Ok(DecodedValue::Scalar(scalar)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::{CALLABLE_KEY, CallableId};
    use crate::error::BridgeError;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use trellis_protocol::Result as TransportResult;

    /// Transport that records requests and replays queued response texts
    struct MockTransport {
        calls: Mutex<Vec<(String, Vec<Value>)>>,
        responses: Mutex<VecDeque<String>>,
    }

    impl MockTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::new()),
            })
        }

        fn queue_response(&self, text: impl Into<String>) {
            self.responses.lock().unwrap().push_back(text.into());
        }

        fn calls(&self) -> Vec<(String, Vec<Value>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn request(&self, method: &str, params: Vec<Value>) -> TransportResult<String> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params));
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "{\"result\":\"mock\"}".to_string()))
        }
    }

    fn noop_tracker() -> Arc<CallableTracker> {
        CallableTracker::new(|_| {})
    }

    fn decode(value: Value, client: &Arc<MockTransport>) -> DecodedValue {
        let client: Arc<dyn Transport> = client.clone();
        decode_value(value, &client, &noop_tracker()).unwrap()
    }

    #[test]
    fn test_marker_free_values_decode_to_themselves() {
        let client = MockTransport::new();
        let values = [
            json!(null),
            json!(true),
            json!(42.5),
            json!("text"),
            json!([1, "two", [3, null]]),
            json!({"z": 1, "a": {"nested": [true, {"deep": "map"}]}}),
        ];

        for value in values {
            let decoded = decode(value.clone(), &client);
            assert_eq!(decoded.to_plain_value(), Some(value));
        }
    }

    #[test]
    fn test_mapping_key_order_preserved() {
        let value: Value = serde_json::from_str(r#"{"z": 1, "m": 2, "a": 3}"#).unwrap();
        let client = MockTransport::new();

        let decoded = decode(value, &client);
        let keys: Vec<&String> = decoded.as_mapping().unwrap().keys().collect();
        assert_eq!(keys, ["z", "m", "a"]);
    }

    #[test]
    fn test_marker_replaced_at_any_depth_siblings_untouched() {
        let client = MockTransport::new();
        let value = json!({
            "rows": [1, {"onPress": {CALLABLE_KEY: "cb-deep"}, "label": "ok"}],
            "title": "widget",
        });

        let decoded = decode(value, &client);

        let row = &decoded.get("rows").unwrap().as_sequence().unwrap()[1];
        let proxy = row.get("onPress").unwrap().as_callable().unwrap();
        assert_eq!(proxy.id(), &CallableId::from("cb-deep"));
        assert_eq!(row.get("label").unwrap().as_str(), Some("ok"));
        assert_eq!(decoded.get("title").unwrap().as_str(), Some("widget"));
    }

    #[test]
    fn test_marker_with_non_string_id_is_plain_data() {
        let client = MockTransport::new();
        let value = json!({CALLABLE_KEY: 42});

        let decoded = decode(value.clone(), &client);
        assert!(decoded.as_callable().is_none());
        assert_eq!(decoded.to_plain_value(), Some(value));
    }

    #[test]
    fn test_decode_registers_proxy() {
        let client: Arc<dyn Transport> = MockTransport::new();
        let tracker = noop_tracker();

        let decoded =
            decode_value(json!({CALLABLE_KEY: "cb-1"}), &client, &tracker).unwrap();

        assert!(decoded.as_callable().is_some());
        assert!(tracker.is_live(&CallableId::from("cb-1")));
    }

    #[test]
    fn test_depth_ceiling_fails_with_decode_error() {
        let client: Arc<dyn Transport> = MockTransport::new();
        let tracker = noop_tracker();

        let mut value = json!("bottom");
        for _ in 0..(MAX_DECODE_DEPTH + 10) {
            value = json!([value]);
        }

        let err = decode_value(value, &client, &tracker).unwrap_err();
        assert!(matches!(err, DecodeError::DepthExceeded(MAX_DECODE_DEPTH)));
    }

    #[tokio::test]
    async fn test_call_sends_call_callable_with_no_args() {
        let mock = MockTransport::new();
        let client: Arc<dyn Transport> = mock.clone();
        let proxy = wrap_callable(client, CallableId::from("cb-1"), noop_tracker(), true);

        proxy.call(vec![]).await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![("callCallable".to_string(), vec![json!("cb-1"), json!([])])]
        );
    }

    #[tokio::test]
    async fn test_call_sends_args_as_ordered_sequence() {
        let mock = MockTransport::new();
        let client: Arc<dyn Transport> = mock.clone();
        let proxy = wrap_callable(client, CallableId::from("cb-1"), noop_tracker(), true);

        proxy.call(vec![json!("a"), json!({"b": "b"})]).await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![(
                "callCallable".to_string(),
                vec![json!("cb-1"), json!(["a", {"b": "b"}])]
            )]
        );
    }

    #[test]
    fn test_wrap_registers_at_creation() {
        let client: Arc<dyn Transport> = MockTransport::new();
        let tracker = noop_tracker();

        let _proxy = wrap_callable(client, CallableId::from("cb-1"), Arc::clone(&tracker), true);
        assert_eq!(tracker.live_count(), 1);
    }

    #[test]
    fn test_wrap_skips_registration_when_flag_is_false() {
        let client: Arc<dyn Transport> = MockTransport::new();
        let tracker = noop_tracker();

        let _proxy =
            wrap_callable(client, CallableId::from("cb-1"), Arc::clone(&tracker), false);
        assert_eq!(tracker.live_count(), 0);
    }

    #[tokio::test]
    async fn test_call_wraps_returned_callable() {
        let mock = MockTransport::new();
        mock.queue_response(json!({CALLABLE_KEY: "nestedCb"}).to_string());
        let client: Arc<dyn Transport> = mock.clone();
        let tracker = noop_tracker();

        let proxy = wrap_callable(client, CallableId::from("cb-1"), Arc::clone(&tracker), true);
        let result = proxy.call(vec![]).await.unwrap();

        let nested = result.as_callable().expect("result should be a proxy");
        assert_eq!(nested.id(), &CallableId::from("nestedCb"));
        assert_eq!(tracker.live_count(), 2);
    }

    #[tokio::test]
    async fn test_call_wraps_nested_returned_callables() {
        let mock = MockTransport::new();
        mock.queue_response(
            json!({
                "nestedCallable": {CALLABLE_KEY: "nestedCb"},
                "someOtherProp": "mock",
            })
            .to_string(),
        );
        let client: Arc<dyn Transport> = mock.clone();
        let tracker = noop_tracker();

        let proxy = wrap_callable(client, CallableId::from("cb-1"), Arc::clone(&tracker), true);
        let result = proxy.call(vec![]).await.unwrap();

        let nested = result
            .get("nestedCallable")
            .and_then(DecodedValue::as_callable)
            .expect("nestedCallable should be a proxy");
        assert_eq!(nested.id(), &CallableId::from("nestedCb"));
        assert_eq!(result.get("someOtherProp").unwrap().as_str(), Some("mock"));
        assert!(tracker.is_live(&CallableId::from("nestedCb")));
    }

    #[tokio::test]
    async fn test_nested_callables_register_even_if_parent_did_not() {
        let mock = MockTransport::new();
        mock.queue_response(
            json!({
                "nestedCallable": {CALLABLE_KEY: "nestedCb"},
                "someOtherProp": "mock",
            })
            .to_string(),
        );
        let client: Arc<dyn Transport> = mock.clone();
        let tracker = noop_tracker();

        let proxy =
            wrap_callable(client, CallableId::from("cb-1"), Arc::clone(&tracker), false);
        let result = proxy.call(vec![]).await.unwrap();

        assert!(result.get("nestedCallable").unwrap().as_callable().is_some());
        assert_eq!(tracker.live_count(), 1);
        assert!(tracker.is_live(&CallableId::from("nestedCb")));
        assert!(!tracker.is_live(&CallableId::from("cb-1")));
    }

    #[tokio::test]
    async fn test_unparseable_response_fails_the_invocation() {
        let mock = MockTransport::new();
        mock.queue_response("not a json string");
        let client: Arc<dyn Transport> = mock.clone();

        let proxy = wrap_callable(client, CallableId::from("cb-1"), noop_tracker(), true);
        let err = proxy.call(vec![]).await.unwrap_err();

        assert!(matches!(err, BridgeError::Decode(DecodeError::Parse(_))));
    }

    #[test]
    fn test_dropping_last_proxy_clone_releases_once() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&released);
        let tracker = CallableTracker::new(move |id| sink.lock().unwrap().push(id));
        let client: Arc<dyn Transport> = MockTransport::new();

        let proxy = wrap_callable(client, CallableId::from("cb-1"), tracker, true);
        let clone = proxy.clone();

        drop(proxy);
        assert!(released.lock().unwrap().is_empty());

        drop(clone);
        assert_eq!(*released.lock().unwrap(), vec![CallableId::from("cb-1")]);
    }

    #[test]
    fn test_unregistered_proxy_never_releases() {
        let released = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&released);
        let tracker = CallableTracker::new(move |id| sink.lock().unwrap().push(id));
        let client: Arc<dyn Transport> = MockTransport::new();

        let proxy = wrap_callable(client, CallableId::from("cb-1"), tracker, false);
        drop(proxy);

        assert!(released.lock().unwrap().is_empty());
    }
}
