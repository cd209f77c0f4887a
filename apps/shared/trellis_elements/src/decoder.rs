//! Element-to-instance dispatch
//!
//! The two reserved prefix families (raw markup, icons) are checked before
//! the component table, so a dynamic tag like `trellis.ui.html.div` never
//! hits the closed vocabulary lookup.

use indexmap::IndexMap;

use trellis_bridge::DecodedValue;

use crate::error::ElementError;
use crate::model::{ElementType, HTML_PREFIX, ICON_PREFIX};
use crate::node::ElementNode;

/// A concrete renderable instance produced from one element node
///
/// Props are carried through untouched (children included); normalization is
/// the component's own job downstream.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementInstance {
    /// Raw-markup passthrough, parameterized by the embedded tag name
    Html {
        tag: String,
        props: IndexMap<String, DecodedValue>,
    },
    /// Icon lookup, parameterized by the embedded icon name
    Icon {
        icon: String,
        props: IndexMap<String, DecodedValue>,
    },
    /// A component from the closed vocabulary
    Component {
        ty: ElementType,
        props: IndexMap<String, DecodedValue>,
    },
}

/// Look up the component type of a node in the closed vocabulary
///
/// # Errors
///
/// [`ElementError::UnknownElement`] when the key is absent from the table;
/// callers decide whether that is fatal or ignorable.
pub fn type_for_element(node: &ElementNode) -> Result<ElementType, ElementError> {
    node.key
        .parse::<ElementType>()
        .map_err(|_| ElementError::UnknownElement(node.key.clone()))
}

/// Map an element node to its renderable instance
pub fn component_for_element(node: ElementNode) -> Result<ElementInstance, ElementError> {
    if let Some(tag) = node.key.strip_prefix(HTML_PREFIX) {
        return Ok(ElementInstance::Html {
            tag: tag.to_string(),
            props: node.props,
        });
    }

    if let Some(icon) = node.key.strip_prefix(ICON_PREFIX) {
        return Ok(ElementInstance::Icon {
            icon: icon.to_string(),
            props: node.props,
        });
    }

    let ty = type_for_element(&node)?;
    Ok(ElementInstance::Component {
        ty,
        props: node.props,
    })
}
