//! # View Tree
//!
//! Retained tree of view nodes built from [`ViewDefinition`]s. Nodes live in an arena and
//! are addressed by their declared identifier. The tree owns every node; removing a node
//! removes its whole subtree.
//!
//! Bindings tie a node attribute (text content, visibility, enabled flag, toggle state,
//! input text) to a model identifier. The runtime calls [`ViewTree::refresh`] whenever a
//! bound identifier changes.
//!
//! Nested scopes are not part of the tree. Containers only record which scopes are
//! mounted under them, so the runtime can compose snapshots and tear nested UIs down.

use crate::errors::ViewError;
use crate::markup::{StyledText, TextSpan};
use crate::scope::ScopeId;
use genui_proto::{
    ChevronStyle, ContainerLayout, InputTypeHint, ModelValue, TextAlignment, ToggleMode,
    ViewDefinition, ViewKind,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundAttribute {
    Text,
    Visible,
    Enabled,
    Checked,
    InputText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub node: NodeId,
    pub model_identifier: String,
    pub attribute: BoundAttribute,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Text {
        text: StyledText,
        alignment: TextAlignment,
    },
    Image {
        resource_identifier: String,
    },
    Container {
        layout: ContainerLayout,
        mounted: Vec<ScopeId>,
    },
    Toggle {
        mode: ToggleMode,
        model_identifier: String,
        checked: bool,
    },
    TextInput {
        hint: String,
        input_type: InputTypeHint,
        model_identifier: String,
        text: String,
    },
    Divider,
    Expander {
        title: NodeId,
        collapsed: Option<NodeId>,
        expanded: Option<NodeId>,
        chevron_style: ChevronStyle,
        is_expanded: bool,
    },
}

#[derive(Debug, Clone)]
struct ViewNode {
    identifier: Option<String>,
    kind: NodeKind,
    visible: bool,
    enabled: bool,
    content_description: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Built-in reaction of a click, resolved from the clicked node and its ancestors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImplicitClick {
    Radio {
        group: String,
        model_identifier: String,
    },
    CheckBox {
        model_identifier: String,
    },
    Expander {
        node: NodeId,
    },
}

#[derive(Debug, Default)]
pub struct ViewTree {
    nodes: Vec<Option<ViewNode>>,
    root: Option<NodeId>,
    by_identifier: HashMap<String, NodeId>,
    bindings: Vec<Binding>,
}

impl ViewTree {
    /// Build a tree and its declared bindings from a definition
    pub fn build(definition: &ViewDefinition) -> Result<Self, ViewError> {
        let mut tree = ViewTree::default();
        let root = tree.create(definition, None)?;
        tree.root = Some(root);
        Ok(tree)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn node(&self, id: NodeId) -> Option<&ViewNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut ViewNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn find(&self, identifier: &str) -> Option<NodeId> {
        self.by_identifier.get(identifier).copied()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.by_identifier.contains_key(identifier)
    }

    fn require(&self, identifier: &str) -> Result<NodeId, ViewError> {
        self.find(identifier).ok_or_else(|| ViewError::UnknownView {
            identifier: identifier.to_string(),
        })
    }

    fn create(
        &mut self,
        definition: &ViewDefinition,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ViewError> {
        if let Some(identifier) = &definition.identifier {
            if self.by_identifier.contains_key(identifier) {
                return Err(ViewError::DuplicateView {
                    identifier: identifier.clone(),
                });
            }
        }

        let id = NodeId(self.nodes.len());
        let attributes = &definition.attributes;
        let placeholder = match &definition.view {
            ViewKind::TextView(text) => NodeKind::Text {
                text: StyledText::parse(text.text.as_deref().unwrap_or_default()),
                alignment: text.alignment,
            },
            ViewKind::ImageView(image) => NodeKind::Image {
                resource_identifier: image.resource_identifier.clone(),
            },
            ViewKind::Container(container) => NodeKind::Container {
                layout: container.layout,
                mounted: Vec::new(),
            },
            ViewKind::ToggleButton(toggle) => NodeKind::Toggle {
                mode: toggle.mode.clone(),
                model_identifier: toggle.model_identifier.clone(),
                checked: false,
            },
            ViewKind::TextInput(input) => NodeKind::TextInput {
                hint: input.hint.clone(),
                input_type: input.input_type,
                model_identifier: input.model_identifier.clone(),
                text: String::new(),
            },
            ViewKind::Divider => NodeKind::Divider,
            // Parts are filled in once the children exist
            ViewKind::VerticalExpander(expander) => NodeKind::Expander {
                title: id,
                collapsed: None,
                expanded: None,
                chevron_style: expander.chevron_style,
                is_expanded: false,
            },
        };

        self.nodes.push(Some(ViewNode {
            identifier: definition.identifier.clone(),
            kind: placeholder,
            visible: attributes.visible,
            enabled: attributes.enabled,
            content_description: attributes.content_description.clone(),
            parent,
            children: Vec::new(),
        }));
        if let Some(identifier) = &definition.identifier {
            self.by_identifier.insert(identifier.clone(), id);
        }

        let mut children = Vec::new();
        for child in definition.children() {
            children.push(self.create(child, Some(id))?);
        }

        if let ViewKind::VerticalExpander(expander) = &definition.view {
            let mut parts = children.iter().copied();
            let title = parts.next().unwrap_or(id);
            let collapsed = expander.collapsed_view.as_ref().and_then(|_| parts.next());
            let expanded = expander.expanded_view.as_ref().and_then(|_| parts.next());
            if let Some(node) = self.node_mut(id) {
                if let NodeKind::Expander {
                    title: t,
                    collapsed: c,
                    expanded: e,
                    ..
                } = &mut node.kind
                {
                    *t = title;
                    *c = collapsed;
                    *e = expanded;
                }
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.children = children;
        }

        self.bind_declared(definition, id);
        Ok(id)
    }

    fn bind_declared(&mut self, definition: &ViewDefinition, node: NodeId) {
        let attributes = &definition.attributes;
        if let Some(model_identifier) = &attributes.visibility_model_identifier {
            self.add_binding(node, model_identifier, BoundAttribute::Visible);
        }
        if let Some(model_identifier) = &attributes.enabled_model_identifier {
            self.add_binding(node, model_identifier, BoundAttribute::Enabled);
        }
        match &definition.view {
            ViewKind::TextView(text) => {
                if let Some(model_identifier) = &text.model_identifier {
                    self.add_binding(node, model_identifier, BoundAttribute::Text);
                }
            }
            ViewKind::ToggleButton(toggle) => {
                self.add_binding(node, &toggle.model_identifier, BoundAttribute::Checked);
            }
            ViewKind::TextInput(input) => {
                self.add_binding(node, &input.model_identifier, BoundAttribute::InputText);
            }
            _ => {}
        }
    }

    fn add_binding(&mut self, node: NodeId, model_identifier: &str, attribute: BoundAttribute) {
        let binding = Binding {
            node,
            model_identifier: model_identifier.to_string(),
            attribute,
        };
        if !self.bindings.contains(&binding) {
            self.bindings.push(binding);
        }
    }

    /// Tie an attribute of `view_identifier` to `model_identifier`
    pub fn bind(
        &mut self,
        view_identifier: &str,
        model_identifier: &str,
        attribute: BoundAttribute,
    ) -> Result<(), ViewError> {
        let node = self.require(view_identifier)?;
        self.add_binding(node, model_identifier, attribute);
        Ok(())
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Identifiers with at least one binding, sorted and deduplicated
    pub fn bound_identifiers(&self) -> Vec<String> {
        let mut identifiers: Vec<String> = self
            .bindings
            .iter()
            .map(|binding| binding.model_identifier.clone())
            .collect();
        identifiers.sort();
        identifiers.dedup();
        identifiers
    }

    /// Re-apply every binding of `model_identifier` from its current value
    pub fn refresh(
        &mut self,
        model_identifier: &str,
        value: Option<&ModelValue>,
    ) -> Vec<ViewError> {
        let targets: Vec<(NodeId, BoundAttribute)> = self
            .bindings
            .iter()
            .filter(|binding| binding.model_identifier == model_identifier)
            .map(|binding| (binding.node, binding.attribute))
            .collect();

        let mut errors = Vec::new();
        for (node, attribute) in targets {
            if let Err(error) = self.apply(node, attribute, model_identifier, value) {
                errors.push(error);
            }
        }
        errors
    }

    fn apply(
        &mut self,
        id: NodeId,
        attribute: BoundAttribute,
        model_identifier: &str,
        value: Option<&ModelValue>,
    ) -> Result<(), ViewError> {
        let mismatch = |expected: &'static str, value: &ModelValue| ViewError::BindingMismatch {
            model_identifier: model_identifier.to_string(),
            expected,
            found: value.kind(),
        };

        let Some(node) = self.node_mut(id) else {
            return Ok(());
        };

        match attribute {
            BoundAttribute::Text | BoundAttribute::InputText => {
                let text = match value {
                    None => String::new(),
                    Some(ModelValue::Strings(list)) => list.first().cloned().unwrap_or_default(),
                    Some(other) => return Err(mismatch("strings", other)),
                };
                match &mut node.kind {
                    NodeKind::Text { text: styled, .. } => *styled = StyledText::parse(&text),
                    NodeKind::TextInput { text: current, .. } => *current = text,
                    _ => {}
                }
            }
            BoundAttribute::Visible | BoundAttribute::Enabled | BoundAttribute::Checked => {
                let flag = match value {
                    // Unset leaves visibility/enabled untouched but unchecks toggles
                    None if attribute != BoundAttribute::Checked => return Ok(()),
                    None => false,
                    Some(ModelValue::Booleans(list)) => list.first().copied().unwrap_or(false),
                    Some(other) => return Err(mismatch("booleans", other)),
                };
                match attribute {
                    BoundAttribute::Visible => node.visible = flag,
                    BoundAttribute::Enabled => node.enabled = flag,
                    _ => {
                        if let NodeKind::Toggle { checked, .. } = &mut node.kind {
                            *checked = flag;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn set_visible(&mut self, identifier: &str, visible: bool) -> Result<(), ViewError> {
        let id = self.require(identifier)?;
        if let Some(node) = self.node_mut(id) {
            node.visible = visible;
        }
        Ok(())
    }

    pub fn set_enabled(&mut self, identifier: &str, enabled: bool) -> Result<(), ViewError> {
        let id = self.require(identifier)?;
        if let Some(node) = self.node_mut(id) {
            node.enabled = enabled;
        }
        Ok(())
    }

    pub fn require_container(&self, identifier: &str) -> Result<NodeId, ViewError> {
        let id = self.require(identifier)?;
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::Container { .. }) => Ok(id),
            _ => Err(ViewError::NotAContainer {
                identifier: identifier.to_string(),
            }),
        }
    }

    /// Insert a new subtree as child `index` of a container
    pub fn insert(
        &mut self,
        container: &str,
        definition: &ViewDefinition,
        index: usize,
    ) -> Result<NodeId, ViewError> {
        let parent = self.require_container(container)?;
        let len = self.node(parent).map_or(0, |node| node.children.len());
        if index > len {
            return Err(ViewError::IndexOutOfBounds {
                container: container.to_string(),
                index,
                len,
            });
        }

        // Check identifiers up front so a failure leaves the tree untouched
        let mut pending = vec![definition];
        while let Some(next) = pending.pop() {
            if let Some(identifier) = &next.identifier {
                if self.contains(identifier) {
                    return Err(ViewError::DuplicateView {
                        identifier: identifier.clone(),
                    });
                }
            }
            pending.extend(next.children());
        }

        let id = self.create(definition, Some(parent))?;
        if let Some(node) = self.node_mut(parent) {
            node.children.insert(index, id);
        }
        Ok(id)
    }

    /// Remove one child subtree; returns scopes mounted anywhere inside it
    pub fn remove(&mut self, container: &str, identifier: &str) -> Result<Vec<ScopeId>, ViewError> {
        let parent = self.require_container(container)?;
        let id = self.require(identifier)?;
        if self.node(id).and_then(|node| node.parent) != Some(parent) {
            return Err(ViewError::UnknownView {
                identifier: identifier.to_string(),
            });
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|child| *child != id);
        }
        Ok(self.drop_subtree(id))
    }

    /// Remove every child of a container and unmount its nested scopes.
    ///
    /// Returns every scope that was mounted in the container or its former subtree.
    pub fn clear(&mut self, container: &str) -> Result<Vec<ScopeId>, ViewError> {
        let id = self.require_container(container)?;
        let (children, mut scopes) = match self.node_mut(id) {
            Some(node) => {
                let children = std::mem::take(&mut node.children);
                let scopes = match &mut node.kind {
                    NodeKind::Container { mounted, .. } => std::mem::take(mounted),
                    _ => Vec::new(),
                };
                (children, scopes)
            }
            None => (Vec::new(), Vec::new()),
        };
        for child in children {
            scopes.extend(self.drop_subtree(child));
        }
        Ok(scopes)
    }

    fn drop_subtree(&mut self, id: NodeId) -> Vec<ScopeId> {
        let mut scopes = Vec::new();
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let Some(node) = self.nodes.get_mut(next.0).and_then(Option::take) else {
                continue;
            };
            if let Some(identifier) = &node.identifier {
                self.by_identifier.remove(identifier);
            }
            if let NodeKind::Container { mounted, .. } = node.kind {
                scopes.extend(mounted);
            }
            pending.extend(node.children);
        }
        let nodes = &self.nodes;
        self.bindings
            .retain(|binding| nodes.get(binding.node.0).is_some_and(Option::is_some));
        scopes
    }

    /// Record a nested scope rendered under `container`
    pub fn mount(&mut self, container: &str, scope: ScopeId) -> Result<(), ViewError> {
        let id = self.require_container(container)?;
        if let Some(NodeKind::Container { mounted, .. }) = self.node_mut(id).map(|n| &mut n.kind) {
            mounted.push(scope);
        }
        Ok(())
    }

    pub fn unmount(&mut self, scope: ScopeId) {
        for node in self.nodes.iter_mut().flatten() {
            if let NodeKind::Container { mounted, .. } = &mut node.kind {
                mounted.retain(|s| *s != scope);
            }
        }
    }

    pub fn mounted_scopes(&self, container: &str) -> Vec<ScopeId> {
        self.find(container)
            .and_then(|id| self.node(id))
            .map(|node| match &node.kind {
                NodeKind::Container { mounted, .. } => mounted.clone(),
                _ => Vec::new(),
            })
            .unwrap_or_default()
    }

    /// Whether the node and all of its ancestors are visible and enabled
    pub fn is_interactive(&self, identifier: &str) -> bool {
        let mut current = self.find(identifier);
        while let Some(id) = current {
            match self.node(id) {
                Some(node) if node.visible && node.enabled => current = node.parent,
                _ => return false,
            }
        }
        true
    }

    pub fn is_visible(&self, identifier: &str) -> bool {
        self.find(identifier)
            .and_then(|id| self.node(id))
            .is_some_and(|node| node.visible)
    }

    pub fn is_enabled(&self, identifier: &str) -> bool {
        self.find(identifier)
            .and_then(|id| self.node(id))
            .is_some_and(|node| node.enabled)
    }

    /// Model identifier written by a text input
    pub fn text_input_target(&self, identifier: &str) -> Result<String, ViewError> {
        let id = self.require(identifier)?;
        match self.node(id).map(|node| &node.kind) {
            Some(NodeKind::TextInput {
                model_identifier, ..
            }) => Ok(model_identifier.clone()),
            _ => Err(ViewError::UnknownView {
                identifier: identifier.to_string(),
            }),
        }
    }

    pub fn has_text_link(&self, identifier: &str, link: i32) -> bool {
        self.find(identifier)
            .and_then(|id| self.node(id))
            .is_some_and(|node| matches!(&node.kind, NodeKind::Text { text, .. } if text.has_link(link)))
    }

    /// Built-in reactions for a click on `identifier`, innermost first
    pub fn implicit_clicks(&self, identifier: &str) -> Vec<ImplicitClick> {
        let mut clicks = Vec::new();
        let mut child: Option<NodeId> = None;
        let mut current = self.find(identifier);

        while let Some(id) = current {
            let Some(node) = self.node(id) else {
                break;
            };
            match &node.kind {
                NodeKind::Toggle {
                    mode,
                    model_identifier,
                    ..
                } => clicks.push(match mode {
                    ToggleMode::RadioButton {
                        radio_group_identifier,
                    } => ImplicitClick::Radio {
                        group: radio_group_identifier.clone(),
                        model_identifier: model_identifier.clone(),
                    },
                    ToggleMode::CheckBox => ImplicitClick::CheckBox {
                        model_identifier: model_identifier.clone(),
                    },
                }),
                // Only the expander itself or its title toggles it
                NodeKind::Expander { title, .. } if child.is_none() || child == Some(*title) => {
                    clicks.push(ImplicitClick::Expander { node: id });
                }
                _ => {}
            }
            child = Some(id);
            current = node.parent;
        }

        clicks
    }

    /// Model identifiers of every radio button in `group`, in tree order
    pub fn radio_group_members(&self, group: &str) -> Vec<String> {
        let mut members: Vec<String> = Vec::new();
        self.walk(|node| {
            if let NodeKind::Toggle {
                mode: ToggleMode::RadioButton {
                    radio_group_identifier,
                },
                model_identifier,
                ..
            } = &node.kind
            {
                if radio_group_identifier == group && !members.contains(model_identifier) {
                    members.push(model_identifier.clone());
                }
            }
        });
        members
    }

    /// Radio groups with a member bound to `model_identifier`
    pub fn radio_groups_of(&self, model_identifier: &str) -> Vec<String> {
        let mut groups: Vec<String> = Vec::new();
        self.walk(|node| {
            if let NodeKind::Toggle {
                mode: ToggleMode::RadioButton {
                    radio_group_identifier,
                },
                model_identifier: bound,
                ..
            } = &node.kind
            {
                if bound == model_identifier && !groups.contains(radio_group_identifier) {
                    groups.push(radio_group_identifier.clone());
                }
            }
        });
        groups
    }

    /// Flip an expander; inside an accordion, expanding collapses the siblings
    pub fn toggle_expander(&mut self, id: NodeId) -> bool {
        let (now_expanded, parent) = match self.node_mut(id) {
            Some(ViewNode {
                kind: NodeKind::Expander { is_expanded, .. },
                parent,
                ..
            }) => {
                *is_expanded = !*is_expanded;
                (*is_expanded, *parent)
            }
            _ => return false,
        };

        if now_expanded {
            let siblings = parent
                .and_then(|p| self.node(p))
                .filter(|p| {
                    matches!(
                        p.kind,
                        NodeKind::Container {
                            layout: ContainerLayout::ExpanderAccordion { .. },
                            ..
                        }
                    )
                })
                .map(|p| p.children.clone())
                .unwrap_or_default();
            for sibling in siblings.into_iter().filter(|s| *s != id) {
                if let Some(NodeKind::Expander { is_expanded, .. }) =
                    self.node_mut(sibling).map(|n| &mut n.kind)
                {
                    *is_expanded = false;
                }
            }
        }
        now_expanded
    }

    pub fn is_expanded(&self, identifier: &str) -> Option<bool> {
        match self.find(identifier).and_then(|id| self.node(id)).map(|n| &n.kind) {
            Some(NodeKind::Expander { is_expanded, .. }) => Some(*is_expanded),
            _ => None,
        }
    }

    fn walk<F: FnMut(&ViewNode)>(&self, mut visit: F) {
        let mut pending: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = pending.pop() {
            if let Some(node) = self.node(id) {
                visit(node);
                pending.extend(node.children.iter().rev());
            }
        }
    }

    /// Serializable copy of the tree; `mounted` renders nested scopes in place
    pub fn snapshot<F>(&self, mounted: &F) -> Option<RenderedView>
    where
        F: Fn(ScopeId) -> Option<RenderedView>,
    {
        self.root.and_then(|root| self.render(root, true, mounted))
    }

    fn render<F>(&self, id: NodeId, shown: bool, mounted: &F) -> Option<RenderedView>
    where
        F: Fn(ScopeId) -> Option<RenderedView>,
    {
        let node = self.node(id)?;
        let mut rendered = RenderedView {
            identifier: node.identifier.clone(),
            kind: String::new(),
            visible: node.visible && shown,
            enabled: node.enabled,
            content_description: node.content_description.clone(),
            text: None,
            spans: Vec::new(),
            checked: None,
            expanded: None,
            attributes: BTreeMap::new(),
            children: Vec::new(),
        };

        match &node.kind {
            NodeKind::Text { text, alignment } => {
                rendered.kind = "text_view".to_string();
                rendered.text = Some(text.plain_text());
                if text.spans.iter().any(|s| s.bold || s.italic || s.link.is_some()) {
                    rendered.spans = text.spans.clone();
                }
                if *alignment != TextAlignment::Default {
                    rendered
                        .attributes
                        .insert("alignment".to_string(), format!("{:?}", alignment).to_uppercase());
                }
            }
            NodeKind::Image {
                resource_identifier,
            } => {
                rendered.kind = "image_view".to_string();
                rendered
                    .attributes
                    .insert("resource".to_string(), resource_identifier.clone());
            }
            NodeKind::Container { .. } => rendered.kind = "container".to_string(),
            NodeKind::Toggle { mode, checked, .. } => {
                rendered.kind = match mode {
                    ToggleMode::RadioButton { .. } => "radio_button",
                    ToggleMode::CheckBox => "check_box",
                }
                .to_string();
                rendered.checked = Some(*checked);
            }
            NodeKind::TextInput {
                hint,
                input_type,
                text,
                ..
            } => {
                rendered.kind = "text_input".to_string();
                rendered.text = Some(text.clone());
                rendered.attributes.insert("hint".to_string(), hint.clone());
                if *input_type != InputTypeHint::None {
                    rendered
                        .attributes
                        .insert("input_type".to_string(), format!("{:?}", input_type).to_uppercase());
                }
            }
            NodeKind::Divider => rendered.kind = "divider".to_string(),
            NodeKind::Expander {
                is_expanded,
                chevron_style,
                ..
            } => {
                rendered.kind = "vertical_expander".to_string();
                rendered.expanded = Some(*is_expanded);
                if *chevron_style != ChevronStyle::NotSetAutomatic {
                    rendered
                        .attributes
                        .insert("chevron".to_string(), format!("{:?}", chevron_style).to_uppercase());
                }
            }
        }

        let (collapsed, expanded, is_expanded) = match &node.kind {
            NodeKind::Expander {
                collapsed,
                expanded,
                is_expanded,
                ..
            } => (*collapsed, *expanded, *is_expanded),
            _ => (None, None, false),
        };

        for child in &node.children {
            let child_shown = if Some(*child) == collapsed {
                !is_expanded
            } else if Some(*child) == expanded {
                is_expanded
            } else {
                true
            };
            if let Some(view) = self.render(*child, rendered.visible && child_shown, mounted) {
                rendered.children.push(view);
            }
        }

        if let NodeKind::Container { mounted: scopes, .. } = &node.kind {
            for scope in scopes {
                if let Some(mut view) = mounted(*scope) {
                    if !rendered.visible {
                        view.hide();
                    }
                    rendered.children.push(view);
                }
            }
        }

        Some(rendered)
    }
}

/// Snapshot of a rendered view, as handed to hosts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedView {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    pub kind: String,

    /// False when the node or any ancestor is hidden
    pub visible: bool,

    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub spans: Vec<TextSpan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedView>,
}

impl RenderedView {
    fn hide(&mut self) {
        self.visible = false;
        for child in &mut self.children {
            child.hide();
        }
    }

    pub fn find(&self, identifier: &str) -> Option<&RenderedView> {
        if self.identifier.as_deref() == Some(identifier) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(identifier))
    }

    /// Texts of all visible text views and inputs, in pre-order
    pub fn visible_texts(&self) -> Vec<String> {
        let mut texts = Vec::new();
        self.collect_texts(&mut texts);
        texts
    }

    fn collect_texts(&self, texts: &mut Vec<String>) {
        if !self.visible {
            return;
        }
        if let Some(text) = &self.text {
            texts.push(text.clone());
        }
        for child in &self.children {
            child.collect_texts(texts);
        }
    }

    pub fn shows_text(&self, text: &str) -> bool {
        self.visible_texts().iter().any(|t| t == text)
    }
}
