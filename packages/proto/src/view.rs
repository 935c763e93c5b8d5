//! View definitions
//!
//! A view definition is the declarative input the view tree is built from. Layout and
//! styling details belong to the rendering host and are not modelled here.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// Views without identifier cannot be targeted by interactions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    pub view: ViewKind,

    #[serde(default)]
    pub attributes: ViewAttributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,

    #[serde(default = "default_true")]
    pub visible: bool,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Boolean identifier driving visibility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility_model_identifier: Option<String>,

    /// Boolean identifier driving the enabled flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_model_identifier: Option<String>,
}

impl Default for ViewAttributes {
    fn default() -> Self {
        Self {
            content_description: None,
            visible: true,
            enabled: true,
            visibility_model_identifier: None,
            enabled_model_identifier: None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    TextView(TextView),
    ImageView(ImageView),
    Container(ContainerView),
    ToggleButton(ToggleButtonView),
    TextInput(TextInputView),
    Divider,
    VerticalExpander(VerticalExpanderView),
}

impl ViewKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ViewKind::TextView(_) => "text_view",
            ViewKind::ImageView(_) => "image_view",
            ViewKind::Container(_) => "container",
            ViewKind::ToggleButton(_) => "toggle_button",
            ViewKind::TextInput(_) => "text_input",
            ViewKind::Divider => "divider",
            ViewKind::VerticalExpander(_) => "vertical_expander",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TextAlignment {
    #[default]
    Default,
    Start,
    Center,
    End,
}

/// Static text or text bound to a one-element string identifier.
///
/// Text may contain `<b>`, `<i>` and `<linkN>` markup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_identifier: Option<String>,

    #[serde(default)]
    pub alignment: TextAlignment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageView {
    pub resource_identifier: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerLayout {
    Linear { orientation: Orientation },
    /// At most one child expander is expanded at a time
    ExpanderAccordion { orientation: Orientation },
}

impl Default for ContainerLayout {
    fn default() -> Self {
        ContainerLayout::Linear {
            orientation: Orientation::Vertical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerView {
    #[serde(default)]
    pub layout: ContainerLayout,

    #[serde(default)]
    pub views: Vec<ViewDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleMode {
    RadioButton { radio_group_identifier: String },
    CheckBox,
}

/// Radio button or check box bound to a one-element boolean identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleButtonView {
    pub mode: ToggleMode,

    pub model_identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_content_view: Option<Box<ViewDefinition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_content_view: Option<Box<ViewDefinition>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputTypeHint {
    #[default]
    None,
    Email,
    Phone,
    Number,
    Url,
}

/// Free text input writing into a one-element string identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInputView {
    #[serde(default)]
    pub hint: String,

    #[serde(default)]
    pub input_type: InputTypeHint,

    pub model_identifier: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChevronStyle {
    #[default]
    NotSetAutomatic,
    Always,
    Never,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalExpanderView {
    pub title_view: Box<ViewDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed_view: Option<Box<ViewDefinition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_view: Option<Box<ViewDefinition>>,

    #[serde(default)]
    pub chevron_style: ChevronStyle,
}

impl ViewDefinition {
    pub fn new(view: ViewKind) -> Self {
        Self {
            identifier: None,
            view,
            attributes: ViewAttributes::default(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ViewKind::TextView(TextView {
            text: Some(text.into()),
            ..TextView::default()
        }))
    }

    pub fn bound_text(model_identifier: impl Into<String>) -> Self {
        Self::new(ViewKind::TextView(TextView {
            model_identifier: Some(model_identifier.into()),
            ..TextView::default()
        }))
    }

    pub fn image(resource_identifier: impl Into<String>) -> Self {
        Self::new(ViewKind::ImageView(ImageView {
            resource_identifier: resource_identifier.into(),
        }))
    }

    pub fn divider() -> Self {
        Self::new(ViewKind::Divider)
    }

    pub fn container(views: Vec<ViewDefinition>) -> Self {
        Self::new(ViewKind::Container(ContainerView {
            layout: ContainerLayout::default(),
            views,
        }))
    }

    pub fn accordion(views: Vec<ViewDefinition>) -> Self {
        Self::new(ViewKind::Container(ContainerView {
            layout: ContainerLayout::ExpanderAccordion {
                orientation: Orientation::Vertical,
            },
            views,
        }))
    }

    pub fn radio_button(
        text: impl Into<String>,
        radio_group_identifier: impl Into<String>,
        model_identifier: impl Into<String>,
    ) -> Self {
        Self::new(ViewKind::ToggleButton(ToggleButtonView {
            mode: ToggleMode::RadioButton {
                radio_group_identifier: radio_group_identifier.into(),
            },
            model_identifier: model_identifier.into(),
            left_content_view: None,
            right_content_view: Some(Box::new(Self::text(text))),
        }))
    }

    pub fn check_box(text: impl Into<String>, model_identifier: impl Into<String>) -> Self {
        Self::new(ViewKind::ToggleButton(ToggleButtonView {
            mode: ToggleMode::CheckBox,
            model_identifier: model_identifier.into(),
            left_content_view: None,
            right_content_view: Some(Box::new(Self::text(text))),
        }))
    }

    pub fn text_input(hint: impl Into<String>, model_identifier: impl Into<String>) -> Self {
        Self::new(ViewKind::TextInput(TextInputView {
            hint: hint.into(),
            input_type: InputTypeHint::None,
            model_identifier: model_identifier.into(),
        }))
    }

    pub fn expander(
        title: ViewDefinition,
        collapsed: Option<ViewDefinition>,
        expanded: Option<ViewDefinition>,
    ) -> Self {
        Self::new(ViewKind::VerticalExpander(VerticalExpanderView {
            title_view: Box::new(title),
            collapsed_view: collapsed.map(Box::new),
            expanded_view: expanded.map(Box::new),
            chevron_style: ChevronStyle::default(),
        }))
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_content_description(mut self, description: impl Into<String>) -> Self {
        self.attributes.content_description = Some(description.into());
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.attributes.visible = visible;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.attributes.enabled = enabled;
        self
    }

    pub fn with_visibility_model(mut self, model_identifier: impl Into<String>) -> Self {
        self.attributes.visibility_model_identifier = Some(model_identifier.into());
        self
    }

    pub fn with_enabled_model(mut self, model_identifier: impl Into<String>) -> Self {
        self.attributes.enabled_model_identifier = Some(model_identifier.into());
        self
    }

    /// Direct child definitions, in declaration order
    pub fn children(&self) -> Vec<&ViewDefinition> {
        match &self.view {
            ViewKind::Container(container) => container.views.iter().collect(),
            ViewKind::ToggleButton(toggle) => toggle
                .left_content_view
                .iter()
                .chain(toggle.right_content_view.iter())
                .map(|v| v.as_ref())
                .collect(),
            ViewKind::VerticalExpander(expander) => std::iter::once(expander.title_view.as_ref())
                .chain(expander.collapsed_view.as_deref())
                .chain(expander.expanded_view.as_deref())
                .collect(),
            ViewKind::TextView(_)
            | ViewKind::ImageView(_)
            | ViewKind::TextInput(_)
            | ViewKind::Divider => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_default_to_visible_and_enabled() {
        let view: ViewDefinition =
            serde_json::from_str(r#"{"view":{"text_view":{"text":"Hello"}}}"#).unwrap();
        assert!(view.attributes.visible);
        assert!(view.attributes.enabled);
        assert_eq!(view.identifier, None);
    }

    #[test]
    fn test_children_of_expander() {
        let expander = ViewDefinition::expander(
            ViewDefinition::text("Title"),
            Some(ViewDefinition::text("Collapsed")),
            None,
        );
        assert_eq!(expander.children().len(), 2);
    }
}
