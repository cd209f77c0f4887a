//! Indented terminal dump of a decoded widget tree
//!
//! Stands in for a real component library: each element node becomes one
//! line (tag plus non-children props), children are nested one level deeper.
//! An unknown element is rendered as a fallback line rather than aborting
//! the whole tree.

use trellis_bridge::DecodedValue;
use trellis_elements::{ElementInstance, ElementNode, component_for_element};

pub fn render_document(root: &DecodedValue) -> String {
    let mut out = String::new();
    render_value(root, 0, &mut out);
    out
}

fn render_value(value: &DecodedValue, depth: usize, out: &mut String) {
    if ElementNode::is_element(value) {
        match ElementNode::from_decoded(value.clone()).and_then(component_for_element) {
            Ok(instance) => render_instance(&instance, depth, out),
            Err(e) => line(depth, &format!("!! {}", e), out),
        }
        return;
    }

    match value {
        DecodedValue::Scalar(v) => line(depth, &v.to_string(), out),
        DecodedValue::Sequence(items) => {
            for item in items {
                render_value(item, depth, out);
            }
        }
        DecodedValue::Mapping(_) => line(depth, "{..}", out),
        DecodedValue::Callable(proxy) => line(depth, &format!("<callable {}>", proxy.id()), out),
    }
}

fn render_instance(instance: &ElementInstance, depth: usize, out: &mut String) {
    let (label, props) = match instance {
        ElementInstance::Html { tag, props } => (format!("html <{}>", tag), props),
        ElementInstance::Icon { icon, props } => (format!("icon {}", icon), props),
        ElementInstance::Component { ty, props } => (ty.name().to_string(), props),
    };

    let mut header = label;
    for (key, value) in props {
        if key == "children" {
            continue;
        }
        header.push_str(&format!(" {}={}", key, prop_summary(value)));
    }
    line(depth, &header, out);

    if let Some(children) = props.get("children") {
        render_value(children, depth + 1, out);
    }
}

fn prop_summary(value: &DecodedValue) -> String {
    match value {
        DecodedValue::Scalar(v) => v.to_string(),
        DecodedValue::Sequence(items) => format!("[{} items]", items.len()),
        DecodedValue::Mapping(_) => "{..}".to_string(),
        DecodedValue::Callable(proxy) => format!("<callable {}>", proxy.id()),
    }
}

fn line(depth: usize, text: &str, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(text);
    out.push('\n');
}
