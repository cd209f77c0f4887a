//! Widget fetch, decode and persisted-data handling
//!
//! A widget update arrives as one JSON payload holding the element document
//! and, optionally, the widget's persisted data. The session runs the payload
//! through the bridge decoder (so embedded callables come back as proxies)
//! and splits it; [`preserved_data`] then extracts the narrow subset that
//! must survive a reload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use trellis_bridge::{CallableTracker, DecodeError, DecodedValue, decode_value};
use trellis_protocol::{FETCH_WIDGET, Transport, TransportError};

/// Persisted state attached to a widget, as the backend sends it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

/// The subset of widget data that survives a reload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreservedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panel_ids: Option<Vec<String>>,
}

/// Extract the data that must survive a reload
///
/// Only `panelIds` is carried over, and only when the source blob actually
/// has it; `state` and any other key is dropped unconditionally.
pub fn preserved_data(data: Option<&WidgetData>) -> PreservedData {
    PreservedData {
        panel_ids: data.and_then(|d| d.panel_ids.clone()),
    }
}

/// One decoded widget update: the element tree plus optional persisted data
#[derive(Debug)]
pub struct WidgetDocument {
    pub root: DecodedValue,
    pub data: Option<WidgetData>,
}

#[derive(Error, Debug)]
pub enum WidgetError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Widget response carries no document")]
    MissingDocument,

    #[error("Widget data is malformed: {0}")]
    MalformedData(String),
}

/// Fetches widget updates from the backend and decodes them
///
/// Every payload runs through the same tracker, so callables from different
/// updates release independently as their proxies are dropped.
pub struct WidgetSession {
    client: Arc<dyn Transport>,
    tracker: Arc<CallableTracker>,
}

impl WidgetSession {
    pub fn new(client: Arc<dyn Transport>, tracker: Arc<CallableTracker>) -> Self {
        Self { client, tracker }
    }

    /// Fetch one widget by name and decode its payload
    ///
    /// # Errors
    ///
    /// Transport failures and unparseable response text fail the fetch, as
    /// does a payload without a `document` field.
    pub async fn fetch(&self, name: &str) -> Result<WidgetDocument, WidgetError> {
        let params = vec![Value::String(name.to_string())];
        let text = self.client.request(FETCH_WIDGET, params).await?;

        let value: Value = serde_json::from_str(&text).map_err(DecodeError::Parse)?;
        let decoded = decode_value(value, &self.client, &self.tracker)?;
        debug!("decoded widget '{}'", name);

        split_document(decoded)
    }
}

/// Split a decoded payload into the element tree and the persisted data
///
/// The data blob must be plain JSON; the backend never embeds callables in
/// it, so one there means the payload is malformed.
fn split_document(decoded: DecodedValue) -> Result<WidgetDocument, WidgetError> {
    let DecodedValue::Mapping(mut map) = decoded else {
        return Err(WidgetError::MissingDocument);
    };

    let data = match map.shift_remove("data") {
        Some(value) => {
            let plain = value.to_plain_value().ok_or_else(|| {
                WidgetError::MalformedData("widget data embeds a callable".to_string())
            })?;
            Some(
                serde_json::from_value(plain)
                    .map_err(|e| WidgetError::MalformedData(e.to_string()))?,
            )
        }
        None => None,
    };

    let root = map
        .shift_remove("document")
        .ok_or(WidgetError::MissingDocument)?;

    Ok(WidgetDocument { root, data })
}
