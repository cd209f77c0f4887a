//! Element name constants and the closed component vocabulary

use serde::{Deserialize, Serialize};

/// Reserved mapping key carrying an element node's type tag
pub const ELEMENT_KEY: &str = "__trElemName";

/// Prefix of every known component element name
pub const COMPONENT_PREFIX: &str = "trellis.ui.components.";

/// Prefix of raw-markup passthrough elements; the suffix is the literal tag
/// name (e.g. `trellis.ui.html.div`)
pub const HTML_PREFIX: &str = "trellis.ui.html.";

/// Prefix of icon elements; the suffix is the literal icon name
/// (e.g. `trellis.ui.icon.vsAdd`)
pub const ICON_PREFIX: &str = "trellis.ui.icon.";

/// Closed, versioned vocabulary of component element types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    // Layout
    Panel,
    Row,
    Column,
    Stack,
    Dashboard,
    Fragment,
    // Controls
    Button,
    ActionButton,
    Checkbox,
    RadioGroup,
    Radio,
    Slider,
    RangeSlider,
    Picker,
    ListView,
    Item,
    Form,
    // Content
    Text,
    TextField,
    TextArea,
    NumberField,
    Image,
    IllustratedMessage,
    Tabs,
    TabPanels,
}

impl ElementType {
    /// Every entry of the vocabulary, in declaration order
    pub const ALL: [ElementType; 25] = [
        ElementType::Panel,
        ElementType::Row,
        ElementType::Column,
        ElementType::Stack,
        ElementType::Dashboard,
        ElementType::Fragment,
        ElementType::Button,
        ElementType::ActionButton,
        ElementType::Checkbox,
        ElementType::RadioGroup,
        ElementType::Radio,
        ElementType::Slider,
        ElementType::RangeSlider,
        ElementType::Picker,
        ElementType::ListView,
        ElementType::Item,
        ElementType::Form,
        ElementType::Text,
        ElementType::TextField,
        ElementType::TextArea,
        ElementType::NumberField,
        ElementType::Image,
        ElementType::IllustratedMessage,
        ElementType::Tabs,
        ElementType::TabPanels,
    ];

    /// Bare component name without the wire prefix
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Panel => "Panel",
            ElementType::Row => "Row",
            ElementType::Column => "Column",
            ElementType::Stack => "Stack",
            ElementType::Dashboard => "Dashboard",
            ElementType::Fragment => "Fragment",
            ElementType::Button => "Button",
            ElementType::ActionButton => "ActionButton",
            ElementType::Checkbox => "Checkbox",
            ElementType::RadioGroup => "RadioGroup",
            ElementType::Radio => "Radio",
            ElementType::Slider => "Slider",
            ElementType::RangeSlider => "RangeSlider",
            ElementType::Picker => "Picker",
            ElementType::ListView => "ListView",
            ElementType::Item => "Item",
            ElementType::Form => "Form",
            ElementType::Text => "Text",
            ElementType::TextField => "TextField",
            ElementType::TextArea => "TextArea",
            ElementType::NumberField => "NumberField",
            ElementType::Image => "Image",
            ElementType::IllustratedMessage => "IllustratedMessage",
            ElementType::Tabs => "Tabs",
            ElementType::TabPanels => "TabPanels",
        }
    }
}

impl std::fmt::Display for ElementType {
    /// Full wire name, prefix included
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", COMPONENT_PREFIX, self.name())
    }
}

impl std::str::FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s
            .strip_prefix(COMPONENT_PREFIX)
            .ok_or_else(|| format!("Unknown element name: {}", s))?;

        match name {
            "Panel" => Ok(ElementType::Panel),
            "Row" => Ok(ElementType::Row),
            "Column" => Ok(ElementType::Column),
            "Stack" => Ok(ElementType::Stack),
            "Dashboard" => Ok(ElementType::Dashboard),
            "Fragment" => Ok(ElementType::Fragment),
            "Button" => Ok(ElementType::Button),
            "ActionButton" => Ok(ElementType::ActionButton),
            "Checkbox" => Ok(ElementType::Checkbox),
            "RadioGroup" => Ok(ElementType::RadioGroup),
            "Radio" => Ok(ElementType::Radio),
            "Slider" => Ok(ElementType::Slider),
            "RangeSlider" => Ok(ElementType::RangeSlider),
            "Picker" => Ok(ElementType::Picker),
            "ListView" => Ok(ElementType::ListView),
            "Item" => Ok(ElementType::Item),
            "Form" => Ok(ElementType::Form),
            "Text" => Ok(ElementType::Text),
            "TextField" => Ok(ElementType::TextField),
            "TextArea" => Ok(ElementType::TextArea),
            "NumberField" => Ok(ElementType::NumberField),
            "Image" => Ok(ElementType::Image),
            "IllustratedMessage" => Ok(ElementType::IllustratedMessage),
            "Tabs" => Ok(ElementType::Tabs),
            "TabPanels" => Ok(ElementType::TabPanels),
            _ => Err(format!("Unknown element name: {}", s)),
        }
    }
}
