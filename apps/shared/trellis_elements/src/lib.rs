//! Element vocabulary and element decoder
//!
//! A widget document is a tree of serialized element nodes: a type tag plus a
//! property set, where property values may be other element nodes, plain data
//! or callable proxies already materialized by the bridge. This crate maps
//! each node to a concrete renderable instance, dispatching on the tag.

pub mod decoder;
pub mod error;
pub mod model;
pub mod node;

pub use decoder::{ElementInstance, component_for_element, type_for_element};
pub use error::ElementError;
pub use model::{COMPONENT_PREFIX, ELEMENT_KEY, ElementType, HTML_PREFIX, ICON_PREFIX};
pub use node::ElementNode;
