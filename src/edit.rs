//! Mutation helpers and the derived tree view. These work on a parsed
//! [`Document`] only; nothing here touches text.

use crate::ast::{Document, Node, Properties};
use crate::error::TscnError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Field overrides for [`Document::modify_node`]. `None` leaves a field alone;
/// `properties` is merged into the existing map rather than replacing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    #[serde(default)]
    pub properties: Option<Properties>,
}

impl Node {
    /// The node's path relative to the scene root: its own name for the root
    /// and for direct children (`parent="."`), otherwise `parent/name`.
    pub fn path(&self) -> String {
        match self.parent_path() {
            None => self.name.clone(),
            Some(parent) => format!("{parent}/{}", self.name),
        }
    }

    /// The stored parent with `.` and a leading `./` folded away.
    fn parent_path(&self) -> Option<&str> {
        let parent = self.parent.as_deref()?;
        let parent = parent.strip_prefix("./").unwrap_or(parent);
        match parent {
            "." | "" => None,
            p => Some(p),
        }
    }
}

impl Document {
    /// Sets `load_steps` to the number of external and sub-resources plus one.
    pub fn recompute_load_steps(&mut self) {
        self.header.load_steps =
            u32::try_from(self.ext_resources.len() + self.sub_resources.len() + 1).ok();
    }

    pub fn find_node(&self, path: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.path() == path)
    }

    pub fn find_node_mut(&mut self, path: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.path() == path)
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.push(node);
        self.recompute_load_steps();
    }

    /// Removes the node at `path` with all of its descendants, and every
    /// connection from or to a removed node. Returns `false` if nothing matched.
    pub fn remove_node(&mut self, path: &str) -> bool {
        let prefix = format!("{path}/");
        let doomed = |node: &Node| {
            let own = node.path();
            own == path
                || own.starts_with(&prefix)
                || node
                    .parent_path()
                    .is_some_and(|parent| parent == path || parent.starts_with(&prefix))
        };

        let removed: HashSet<String> = self
            .nodes
            .iter()
            .filter(|&n| doomed(n))
            .map(Node::path)
            .collect();
        if removed.is_empty() {
            log::debug!("remove_node: no node at `{path}`");
            return false;
        }

        self.nodes.retain(|n| !doomed(n));
        self.connections
            .retain(|c| !removed.contains(&c.from) && !removed.contains(&c.to));
        self.recompute_load_steps();
        true
    }

    /// Applies `update` to the node at `path`. Returns `false` without touching
    /// the document if there is no such node.
    ///
    /// Renaming a non-root node rewrites the parent paths of its descendants and
    /// the connections that referenced it.
    pub fn modify_node(&mut self, path: &str, update: NodeUpdate) -> bool {
        let Some(index) = self.nodes.iter().position(|n| n.path() == path) else {
            log::debug!("modify_node: no node at `{path}`");
            return false;
        };

        let node = &mut self.nodes[index];
        if let Some(node_type) = update.node_type {
            node.node_type = Some(node_type);
        }
        if let Some(groups) = update.groups {
            node.groups = groups;
        }
        if let Some(properties) = update.properties {
            node.properties.extend(properties);
        }
        if let Some(name) = update.name {
            let is_root = node.is_root();
            node.name = name;
            let new_path = node.path();
            if !is_root && new_path != path {
                self.rebase_paths(path, &new_path);
            }
        }
        true
    }

    pub fn remove_node_or_err(&mut self, path: &str) -> Result<(), TscnError> {
        if self.remove_node(path) {
            Ok(())
        } else {
            Err(TscnError::NodeNotFound {
                path: path.to_string(),
            })
        }
    }

    pub fn modify_node_or_err(&mut self, path: &str, update: NodeUpdate) -> Result<(), TscnError> {
        if self.modify_node(path, update) {
            Ok(())
        } else {
            Err(TscnError::NodeNotFound {
                path: path.to_string(),
            })
        }
    }

    fn rebase_paths(&mut self, old: &str, new: &str) {
        let rebase = |p: &str| -> Option<String> {
            if p == old {
                Some(new.to_string())
            } else {
                p.strip_prefix(old)
                    .filter(|rest| rest.starts_with('/'))
                    .map(|rest| format!("{new}{rest}"))
            }
        };

        for node in &mut self.nodes {
            if let Some(rebased) = node.parent_path().and_then(rebase) {
                node.parent = Some(rebased);
            }
        }
        for connection in &mut self.connections {
            if let Some(rebased) = rebase(&connection.from) {
                connection.from = rebased;
            }
            if let Some(rebased) = rebase(&connection.to) {
                connection.to = rebased;
            }
        }
    }

    /// Builds the nested, read-only view of the node hierarchy.
    ///
    /// Root nodes sit at the top level. Every other node is placed under the
    /// first root by walking its parent path; missing intermediate nodes are
    /// created as synthetic entries. A scene without a root gets a synthetic
    /// `.` entry to hang children from.
    pub fn tree(&self) -> SceneTree {
        let mut tree = SceneTree::default();
        for node in self.nodes.iter().filter(|n| n.is_root()) {
            tree.roots
                .entry(node.name.clone())
                .or_insert_with(TreeEntry::synthetic)
                .fill(node);
        }

        let children: Vec<&Node> = self.nodes.iter().filter(|n| !n.is_root()).collect();
        if children.is_empty() {
            return tree;
        }
        if tree.roots.is_empty() {
            tree.roots.insert(".".to_string(), TreeEntry::synthetic());
        }
        let Some((_, anchor)) = tree.roots.get_index_mut(0) else {
            return tree;
        };

        for node in children {
            let mut cursor = &mut *anchor;
            for segment in node.parent_path().unwrap_or_default().split('/') {
                if segment.is_empty() || segment == "." {
                    continue;
                }
                cursor = cursor
                    .children
                    .entry(segment.to_string())
                    .or_insert_with(TreeEntry::synthetic);
            }
            cursor
                .children
                .entry(node.name.clone())
                .or_insert_with(TreeEntry::synthetic)
                .fill(node);
        }
        tree
    }
}

/// The node hierarchy keyed by name, root first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SceneTree {
    pub roots: IndexMap<String, TreeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeEntry {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    pub properties: Properties,
    pub children: IndexMap<String, TreeEntry>,
    /// Stands in for a parent path segment that no node declared.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

impl TreeEntry {
    fn synthetic() -> Self {
        TreeEntry {
            synthetic: true,
            ..TreeEntry::default()
        }
    }

    fn fill(&mut self, node: &Node) {
        self.node_type = node.node_type.clone();
        self.properties = node.properties.clone();
        self.synthetic = false;
    }
}

impl SceneTree {
    /// Looks up an entry by `/`-separated path starting at a root name.
    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        let mut segments = path.split('/');
        let mut entry = self.roots.get(segments.next()?)?;
        for segment in segments {
            entry = entry.children.get(segment)?;
        }
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Connection, Value, Vector2};

    fn sample() -> Document {
        let mut doc = Document::default();
        doc.nodes.push(Node::new("Main").with_type("Node2D"));
        doc.nodes.push(Node::new("Player").with_type("CharacterBody2D").with_parent("."));
        doc.nodes.push(Node::new("Sprite").with_type("Sprite2D").with_parent("Player"));
        doc.nodes.push(Node::new("Enemy").with_type("Area2D").with_parent("."));
        doc.connections
            .push(Connection::new("pressed", "Button", ".", "_on_pressed"));
        doc
    }

    #[test]
    fn test_node_paths() {
        let doc = sample();
        let paths: Vec<String> = doc.nodes.iter().map(Node::path).collect();
        assert_eq!(paths, vec!["Main", "Player", "Player/Sprite", "Enemy"]);
        assert_eq!(Node::new("A").with_parent("./B").path(), "B/A");
    }

    #[test]
    fn test_add_node_recomputes_load_steps() {
        let mut doc = sample();
        doc.add_node(Node::new("Hud").with_type("CanvasLayer").with_parent("."));
        assert_eq!(doc.nodes.len(), 5);
        assert_eq!(doc.header.load_steps, Some(1));
        assert!(doc.find_node("Hud").is_some());
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut doc = sample();
        assert!(doc.remove_node("Player"));
        let names: Vec<&str> = doc.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Enemy"]);
        assert_eq!(doc.connections.len(), 1);
    }

    #[test]
    fn test_remove_node_drops_connections() {
        let mut doc = sample();
        doc.connections
            .push(Connection::new("hit", "Enemy", "Player/Sprite", "_on_hit"));
        doc.connections
            .push(Connection::new("died", "Enemy", ".", "_on_enemy_died"));
        assert!(doc.remove_node("Player"));
        let signals: Vec<&str> = doc.connections.iter().map(|c| c.signal.as_str()).collect();
        assert_eq!(signals, vec!["pressed", "died"]);

        assert!(doc.remove_node("Enemy"));
        assert_eq!(doc.connections.len(), 1);
    }

    #[test]
    fn test_remove_node_does_not_touch_siblings_with_shared_prefix() {
        let mut doc = sample();
        doc.nodes.push(Node::new("PlayerHud").with_parent("."));
        doc.nodes.push(Node::new("Label").with_parent("PlayerHud"));
        assert!(doc.remove_node("Player"));
        assert!(doc.find_node("PlayerHud/Label").is_some());
    }

    #[test]
    fn test_remove_missing_node() {
        let mut doc = sample();
        let before = doc.clone();
        assert!(!doc.remove_node("Ghost"));
        assert_eq!(doc, before);
        assert!(matches!(
            doc.remove_node_or_err("Ghost"),
            Err(TscnError::NodeNotFound { path }) if path == "Ghost"
        ));
    }

    #[test]
    fn test_modify_node_merges_properties() {
        let mut doc = sample();
        doc.find_node_mut("Player")
            .unwrap()
            .properties
            .insert("position".to_string(), Value::Vector2(Vector2::new(0.0, 0.0)));

        let mut properties = Properties::new();
        properties.insert("speed".to_string(), Value::Int(300));
        let update = NodeUpdate {
            node_type: Some("RigidBody2D".to_string()),
            properties: Some(properties),
            ..NodeUpdate::default()
        };
        assert!(doc.modify_node("Player", update));

        let player = doc.find_node("Player").unwrap();
        assert_eq!(player.node_type.as_deref(), Some("RigidBody2D"));
        assert_eq!(player.properties.len(), 2);
        assert_eq!(player.properties.get("speed"), Some(&Value::Int(300)));
        assert!(player.properties.contains_key("position"));
    }

    #[test]
    fn test_modify_missing_node_leaves_document_alone() {
        let mut doc = sample();
        let before = doc.clone();
        let update = NodeUpdate {
            name: Some("X".to_string()),
            ..NodeUpdate::default()
        };
        assert!(!doc.modify_node("Nope", update.clone()));
        assert_eq!(doc, before);
        assert!(doc.modify_node_or_err("Nope", update).is_err());
    }

    #[test]
    fn test_rename_rebases_descendants_and_connections() {
        let mut doc = sample();
        doc.connections
            .push(Connection::new("frame_changed", "Player/Sprite", ".", "_on_frame"));
        let update = NodeUpdate {
            name: Some("Hero".to_string()),
            groups: Some(vec!["heroes".to_string()]),
            ..NodeUpdate::default()
        };
        assert!(doc.modify_node("Player", update));

        assert!(doc.find_node("Hero/Sprite").is_some());
        assert_eq!(doc.find_node("Hero").unwrap().groups, vec!["heroes"]);
        assert_eq!(doc.connections[1].from, "Hero/Sprite");
    }

    #[test]
    fn test_tree_view() {
        let mut doc = sample();
        doc.nodes[2]
            .properties
            .insert("frame".to_string(), Value::Int(2));
        let tree = doc.tree();

        assert_eq!(tree.roots.len(), 1);
        let main = tree.get("Main").unwrap();
        assert_eq!(main.node_type.as_deref(), Some("Node2D"));
        assert_eq!(main.children.keys().collect::<Vec<_>>(), vec!["Player", "Enemy"]);

        let sprite = tree.get("Main/Player/Sprite").unwrap();
        assert_eq!(sprite.node_type.as_deref(), Some("Sprite2D"));
        assert_eq!(sprite.properties.get("frame"), Some(&Value::Int(2)));
        assert!(!sprite.synthetic);
    }

    #[test]
    fn test_tree_view_creates_synthetic_parents() {
        let mut doc = Document::default();
        doc.nodes.push(Node::new("Leaf").with_type("Node").with_parent("A/B"));
        let tree = doc.tree();

        let root = tree.get(".").unwrap();
        assert!(root.synthetic);
        let b = tree.get("./A/B").unwrap();
        assert!(b.synthetic);
        assert_eq!(
            b.children.get("Leaf").and_then(|e| e.node_type.as_deref()),
            Some("Node")
        );
    }

    #[test]
    fn test_tree_view_fills_placeholder_declared_later() {
        let mut doc = Document::default();
        doc.nodes.push(Node::new("Root").with_type("Node"));
        doc.nodes.push(Node::new("Child").with_parent("Parent"));
        doc.nodes.push(Node::new("Parent").with_type("Node2D").with_parent("."));
        let tree = doc.tree();

        let parent = tree.get("Root/Parent").unwrap();
        assert!(!parent.synthetic);
        assert_eq!(parent.node_type.as_deref(), Some("Node2D"));
        assert!(parent.children.contains_key("Child"));
    }
}
