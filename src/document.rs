use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::future::Future;
use std::path::Path;
use tracing::debug;

use crate::languages::FontRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Frame,
    Group,
    Component,
    Instance,
    Text,
    Other,
}

impl NodeKind {
    /// Frames and groups are flattened away by the scanner.
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::Frame | NodeKind::Group)
    }

    /// Reusable components keep their text nested inside a single unit.
    pub fn is_component(self) -> bool {
        matches!(self, NodeKind::Component | NodeKind::Instance)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Capabilities the translation core needs from the host document.
pub trait Document {
    fn selection(&self) -> Vec<NodeId>;
    fn kind(&self, id: &NodeId) -> Option<NodeKind>;
    fn children(&self, id: &NodeId) -> Vec<NodeId>;
    fn parent(&self, id: &NodeId) -> Option<NodeId>;
    fn is_visible(&self, id: &NodeId) -> bool;
    fn is_locked(&self, id: &NodeId) -> bool;
    fn set_locked(&mut self, id: &NodeId, locked: bool) -> Result<()>;
    fn text(&self, id: &NodeId) -> Option<String>;
    fn set_text(&mut self, id: &NodeId, text: &str) -> Result<()>;
    /// Every typeface used by the node's characters, without repeats.
    fn fonts(&self, id: &NodeId) -> Vec<FontRef>;
    fn set_font(&mut self, id: &NodeId, font: &FontRef) -> Result<()>;
    fn has_missing_font(&self, id: &NodeId) -> bool;
    fn name(&self, id: &NodeId) -> Option<String>;
    fn set_name(&mut self, id: &NodeId, name: &str) -> Result<()>;
    fn position(&self, id: &NodeId) -> Option<Position>;
    fn set_position(&mut self, id: &NodeId, position: Position) -> Result<()>;
    fn height(&self, id: &NodeId) -> f64;
    /// Copies the node (and its subtree) and returns the copy's id. The copy
    /// is not attached to any parent.
    fn clone_node(&mut self, id: &NodeId) -> Result<NodeId>;
    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<()>;
    fn plugin_data(&self, id: &NodeId, key: &str) -> Option<String>;
    fn set_plugin_data(&mut self, id: &NodeId, key: &str, value: String) -> Result<()>;
    /// Must complete before text using `font` is set.
    fn load_font(&mut self, font: &FontRef) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fonts: Vec<FontRef>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub missing_font: bool,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plugin_data: BTreeMap<String, String>,
}

impl SceneNode {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(id),
            kind,
            name: String::new(),
            parent: None,
            children: Vec::new(),
            text: None,
            fonts: Vec::new(),
            missing_font: false,
            x: 0.0,
            y: 0.0,
            height: 0.0,
            locked: false,
            visible: true,
            plugin_data: BTreeMap::new(),
        }
    }

    pub fn text_node(id: impl Into<String>, text: impl Into<String>, font: FontRef) -> Self {
        let text = text.into();
        let mut node = Self::new(id, NodeKind::Text);
        node.name = text.clone();
        node.text = Some(text);
        node.fonts = vec![font];
        node.height = 24.0;
        node
    }
}

fn default_visible() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A scene held in memory, loadable from and savable to JSON. Fonts must be
/// loaded through [`Document::load_font`] before text using them is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryDocument {
    #[serde(default)]
    selection: Vec<NodeId>,
    #[serde(default)]
    nodes: Vec<SceneNode>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
    #[serde(skip)]
    loaded_fonts: HashSet<FontRef>,
    #[serde(skip)]
    clone_counter: u64,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut document: MemoryDocument = serde_json::from_str(raw)?;
        document.reindex()?;
        Ok(document)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read scene: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("failed to parse scene: {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_json()?;
        fs::write(path, content)
            .with_context(|| format!("failed to write scene: {}", path.display()))
    }

    /// Adds a node under `parent` (or at the root when `None`).
    pub fn insert(&mut self, parent: Option<&NodeId>, mut node: SceneNode) -> Result<NodeId> {
        let id = node.id.clone();
        if self.index.contains_key(&id) {
            return Err(anyhow!("duplicate node id '{}'", id));
        }
        node.parent = parent.cloned();
        self.index.insert(id.clone(), self.nodes.len());
        self.nodes.push(node);
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.push(id.clone());
        }
        Ok(id)
    }

    pub fn select(&mut self, ids: Vec<NodeId>) {
        self.selection = ids;
    }

    pub fn node(&self, id: &NodeId) -> Option<&SceneNode> {
        self.index.get(id).and_then(|position| self.nodes.get(*position))
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn is_font_loaded(&self, font: &FontRef) -> bool {
        self.loaded_fonts.contains(font)
    }

    fn node_mut(&mut self, id: &NodeId) -> Result<&mut SceneNode> {
        let position = *self
            .index
            .get(id)
            .ok_or_else(|| anyhow!("node '{}' not found", id))?;
        Ok(&mut self.nodes[position])
    }

    fn reindex(&mut self) -> Result<()> {
        self.index.clear();
        for (position, node) in self.nodes.iter().enumerate() {
            if self.index.insert(node.id.clone(), position).is_some() {
                return Err(anyhow!("duplicate node id '{}'", node.id));
            }
        }
        Ok(())
    }

    fn ensure_fonts_loaded(&self, fonts: &[FontRef]) -> Result<()> {
        for font in fonts {
            if !self.loaded_fonts.contains(font) {
                return Err(anyhow!(
                    "font '{} {}' must be loaded before editing text",
                    font.family,
                    font.style
                ));
            }
        }
        Ok(())
    }

    fn next_clone_id(&mut self, source: &NodeId) -> NodeId {
        loop {
            self.clone_counter += 1;
            let candidate = NodeId::new(format!("{}:copy{}", source, self.clone_counter));
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn clone_subtree(&mut self, id: &NodeId, parent: Option<NodeId>) -> Result<NodeId> {
        let source = self
            .node(id)
            .cloned()
            .ok_or_else(|| anyhow!("node '{}' not found", id))?;
        let new_id = self.next_clone_id(id);
        let mut copy = source.clone();
        copy.id = new_id.clone();
        copy.parent = parent;
        copy.children = Vec::new();
        self.index.insert(new_id.clone(), self.nodes.len());
        self.nodes.push(copy);
        for child in &source.children {
            let child_copy = self.clone_subtree(child, Some(new_id.clone()))?;
            self.node_mut(&new_id)?.children.push(child_copy);
        }
        Ok(new_id)
    }
}

impl Document for MemoryDocument {
    fn selection(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn kind(&self, id: &NodeId) -> Option<NodeKind> {
        self.node(id).map(|node| node.kind)
    }

    fn children(&self, id: &NodeId) -> Vec<NodeId> {
        self.node(id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    fn parent(&self, id: &NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent.clone())
    }

    fn is_visible(&self, id: &NodeId) -> bool {
        self.node(id).map(|node| node.visible).unwrap_or(false)
    }

    fn is_locked(&self, id: &NodeId) -> bool {
        self.node(id).map(|node| node.locked).unwrap_or(false)
    }

    fn set_locked(&mut self, id: &NodeId, locked: bool) -> Result<()> {
        self.node_mut(id)?.locked = locked;
        Ok(())
    }

    fn text(&self, id: &NodeId) -> Option<String> {
        self.node(id).and_then(|node| node.text.clone())
    }

    fn set_text(&mut self, id: &NodeId, text: &str) -> Result<()> {
        let fonts = self
            .node(id)
            .map(|node| node.fonts.clone())
            .ok_or_else(|| anyhow!("node '{}' not found", id))?;
        self.ensure_fonts_loaded(&fonts)?;
        let node = self.node_mut(id)?;
        if node.kind != NodeKind::Text {
            return Err(anyhow!("node '{}' is not a text node", id));
        }
        node.text = Some(text.to_string());
        Ok(())
    }

    fn fonts(&self, id: &NodeId) -> Vec<FontRef> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut fonts: Vec<FontRef> = Vec::new();
        for font in &node.fonts {
            if !fonts.contains(font) {
                fonts.push(font.clone());
            }
        }
        fonts
    }

    fn set_font(&mut self, id: &NodeId, font: &FontRef) -> Result<()> {
        self.ensure_fonts_loaded(std::slice::from_ref(font))?;
        let node = self.node_mut(id)?;
        node.fonts = vec![font.clone()];
        node.missing_font = false;
        Ok(())
    }

    fn has_missing_font(&self, id: &NodeId) -> bool {
        self.node(id).map(|node| node.missing_font).unwrap_or(false)
    }

    fn name(&self, id: &NodeId) -> Option<String> {
        self.node(id).map(|node| node.name.clone())
    }

    fn set_name(&mut self, id: &NodeId, name: &str) -> Result<()> {
        self.node_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn position(&self, id: &NodeId) -> Option<Position> {
        self.node(id).map(|node| Position {
            x: node.x,
            y: node.y,
        })
    }

    fn set_position(&mut self, id: &NodeId, position: Position) -> Result<()> {
        let node = self.node_mut(id)?;
        node.x = position.x;
        node.y = position.y;
        Ok(())
    }

    fn height(&self, id: &NodeId) -> f64 {
        self.node(id).map(|node| node.height).unwrap_or(0.0)
    }

    fn clone_node(&mut self, id: &NodeId) -> Result<NodeId> {
        let new_id = self.clone_subtree(id, None)?;
        debug!("cloned node {} as {}", id, new_id);
        Ok(new_id)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<()> {
        if self.node(parent).is_none() {
            return Err(anyhow!("parent node '{}' not found", parent));
        }
        let previous = self.node(child).and_then(|node| node.parent.clone());
        if let Some(previous) = previous {
            self.node_mut(&previous)?
                .children
                .retain(|existing| existing != child);
        }
        self.node_mut(child)?.parent = Some(parent.clone());
        self.node_mut(parent)?.children.push(child.clone());
        Ok(())
    }

    fn plugin_data(&self, id: &NodeId, key: &str) -> Option<String> {
        self.node(id)
            .and_then(|node| node.plugin_data.get(key).cloned())
    }

    fn set_plugin_data(&mut self, id: &NodeId, key: &str, value: String) -> Result<()> {
        self.node_mut(id)?.plugin_data.insert(key.to_string(), value);
        Ok(())
    }

    async fn load_font(&mut self, font: &FontRef) -> Result<()> {
        self.loaded_fonts.insert(font.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontRef {
        FontRef::new("Inter", "Regular")
    }

    #[test]
    fn clone_copies_subtree_without_parent() {
        let mut doc = MemoryDocument::new();
        let frame = doc
            .insert(None, SceneNode::new("frame", NodeKind::Frame))
            .expect("frame");
        let group = doc
            .insert(Some(&frame), SceneNode::new("group", NodeKind::Group))
            .expect("group");
        doc.insert(Some(&group), SceneNode::text_node("label", "Hello", font()))
            .expect("label");

        let copy = doc.clone_node(&group).expect("clone");
        assert_ne!(copy, group);
        assert!(doc.parent(&copy).is_none());
        let copied_children = doc.children(&copy);
        assert_eq!(copied_children.len(), 1);
        assert_eq!(doc.text(&copied_children[0]).as_deref(), Some("Hello"));
        assert_eq!(doc.children(&frame), vec![group]);
    }

    #[tokio::test]
    async fn set_text_requires_loaded_font() {
        let mut doc = MemoryDocument::new();
        let label = doc
            .insert(None, SceneNode::text_node("label", "Hello", font()))
            .expect("label");
        assert!(doc.set_text(&label, "Hola").is_err());
        doc.load_font(&font()).await.expect("load font");
        doc.set_text(&label, "Hola").expect("set text");
        assert_eq!(doc.text(&label).as_deref(), Some("Hola"));
    }

    #[test]
    fn json_round_trip_preserves_plugin_data() {
        let raw = r#"{
            "selection": ["a"],
            "nodes": [
                {"id": "a", "kind": "text", "text": "Hi", "plugin_data": {"k": "v"}}
            ]
        }"#;
        let doc = MemoryDocument::from_json(raw).expect("scene");
        assert_eq!(doc.selection(), vec![NodeId::from("a")]);
        assert_eq!(doc.plugin_data(&NodeId::from("a"), "k").as_deref(), Some("v"));
        assert!(doc.is_visible(&NodeId::from("a")));

        let reparsed = MemoryDocument::from_json(&doc.to_json().expect("json")).expect("reparse");
        assert_eq!(
            reparsed.plugin_data(&NodeId::from("a"), "k").as_deref(),
            Some("v")
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"{"nodes": [{"id": "a", "kind": "text"}, {"id": "a", "kind": "frame"}]}"#;
        assert!(MemoryDocument::from_json(raw).is_err());
    }
}
