use std::collections::{HashSet, VecDeque};
use tracing::debug;

use crate::document::{Document, NodeId, NodeKind};

/// Collects the text elements reachable from `selection`.
///
/// Frames and groups are flattened with a worklist; every non-container node
/// is a leaf. Text leaves are kept as-is, and visible component or instance
/// leaves are searched for nested text nodes, since a component arrives as a
/// single collapsed unit. Each node is collected at most once. Locked text
/// nodes are dropped unless `include_locked` is set.
pub fn scan<D: Document>(document: &D, selection: &[NodeId], include_locked: bool) -> Vec<NodeId> {
    let leaves = flatten(document, selection);
    let mut seen = HashSet::new();
    let mut texts = Vec::new();

    for leaf in &leaves {
        if document.kind(leaf) == Some(NodeKind::Text) && seen.insert(leaf.clone()) {
            texts.push(leaf.clone());
        }
    }

    for leaf in &leaves {
        let is_component = document
            .kind(leaf)
            .map(NodeKind::is_component)
            .unwrap_or(false);
        if !is_component || !document.is_visible(leaf) {
            continue;
        }
        for inner in find_text_descendants(document, leaf) {
            if seen.insert(inner.clone()) {
                texts.push(inner);
            }
        }
    }

    if !include_locked {
        texts.retain(|id| !document.is_locked(id));
    }
    debug!(
        "scanned {} leaves, found {} text nodes",
        leaves.len(),
        texts.len()
    );
    texts
}

/// Flattens frames and groups into their leaf descendants, preserving
/// document order.
pub fn flatten<D: Document>(document: &D, selection: &[NodeId]) -> Vec<NodeId> {
    let mut flat = Vec::new();
    let mut seen = HashSet::new();
    let mut pending: VecDeque<NodeId> = selection.iter().cloned().collect();

    while let Some(node) = pending.pop_front() {
        if !seen.insert(node.clone()) {
            continue;
        }
        let Some(kind) = document.kind(&node) else {
            continue;
        };
        if kind.is_container() {
            let children = document.children(&node);
            for child in children.into_iter().rev() {
                pending.push_front(child);
            }
        } else {
            flat.push(node);
        }
    }
    flat
}

fn find_text_descendants<D: Document>(document: &D, root: &NodeId) -> Vec<NodeId> {
    let mut found = Vec::new();
    let mut stack: Vec<NodeId> = document.children(root).into_iter().rev().collect();
    while let Some(node) = stack.pop() {
        if document.kind(&node) == Some(NodeKind::Text) {
            found.push(node.clone());
        }
        for child in document.children(&node).into_iter().rev() {
            stack.push(child);
        }
    }
    found
}
