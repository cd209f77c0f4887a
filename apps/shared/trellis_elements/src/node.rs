use indexmap::IndexMap;

use trellis_bridge::DecodedValue;

use crate::error::ElementError;
use crate::model::ELEMENT_KEY;

/// One serialized element node: a type tag plus a property set
///
/// Extracted from a decoded mapping shaped `{ "__trElemName": key, "props": {...} }`.
/// Props arrive already decoded by the bridge, so they may hold callable
/// proxies (event handlers), nested element nodes or plain data; nothing here
/// re-decodes them.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub key: String,
    pub props: IndexMap<String, DecodedValue>,
}

impl ElementNode {
    /// Interpret a decoded value as an element node
    pub fn from_decoded(value: DecodedValue) -> Result<Self, ElementError> {
        let DecodedValue::Mapping(mut map) = value else {
            return Err(ElementError::NotAnElement(
                "expected a mapping".to_string(),
            ));
        };

        let key = match map.get(ELEMENT_KEY).and_then(DecodedValue::as_str) {
            Some(key) => key.to_string(),
            None => {
                return Err(ElementError::NotAnElement(format!(
                    "mapping has no '{}' tag",
                    ELEMENT_KEY
                )));
            }
        };

        let props = match map.shift_remove("props") {
            Some(DecodedValue::Mapping(props)) => props,
            _ => IndexMap::new(),
        };

        Ok(Self { key, props })
    }

    /// Whether a decoded value looks like an element node
    pub fn is_element(value: &DecodedValue) -> bool {
        value.get(ELEMENT_KEY).is_some_and(|v| v.as_str().is_some())
    }
}
