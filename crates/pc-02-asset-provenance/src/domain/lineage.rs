//! Emissions lineage and the `basedOn` graph.

use crate::errors::{ProvenanceError, Result};
use serde::Deserialize;
use shared_types::{FinalAsset, PublicAsset};
use std::collections::{HashMap, HashSet, VecDeque};

/// Order-preserving union of emissions id lists.
pub fn union_emissions<'a, I, L>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = L>,
    L: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    let mut union = Vec::new();
    for list in lists {
        for id in list {
            if seen.insert(id.as_str()) {
                union.push(id.clone());
            }
        }
    }
    union
}

/// A public lineage record, intermediate or terminal.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LineageNode {
    Final(FinalAsset),
    Intermediate(PublicAsset),
}

impl LineageNode {
    pub fn id(&self) -> &str {
        match self {
            Self::Final(a) => &a.id,
            Self::Intermediate(a) => &a.id,
        }
    }

    pub fn emissions_ids(&self) -> &[String] {
        match self {
            Self::Final(a) => &a.emissions_ids,
            Self::Intermediate(a) => &a.emissions_ids,
        }
    }

    /// Parent ids, without the root sentinel.
    pub fn parents(&self) -> Vec<String> {
        match self {
            Self::Final(a) => a
                .based_on
                .iter()
                .filter(|id| id.as_str() != shared_types::LINEAGE_ROOT_SENTINEL)
                .cloned()
                .collect(),
            Self::Intermediate(a) => a.parents().map(str::to_string).collect(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final(_))
    }
}

/// Walks `basedOn` from `root` back to the raw-material roots.
///
/// Returns ids in breadth-first order, root first, each id once. Fails with
/// a validation error if the graph reachable from `root` contains a cycle.
pub fn trace<F>(root: &str, mut lookup: F) -> Result<Vec<String>>
where
    F: FnMut(&str) -> Result<Option<LineageNode>>,
{
    let mut order = Vec::new();
    let mut edges: HashMap<String, Vec<String>> = HashMap::new();
    let mut queue = VecDeque::from([root.to_string()]);
    let mut seen = HashSet::from([root.to_string()]);

    while let Some(id) = queue.pop_front() {
        let node = lookup(&id)?.ok_or_else(|| ProvenanceError::not_found("Public asset", &id))?;
        let parents = node.parents();
        for parent in &parents {
            if seen.insert(parent.clone()) {
                queue.push_back(parent.clone());
            }
        }
        edges.insert(id.clone(), parents);
        order.push(id);
    }

    if let Some(at) = find_cycle(root, &edges) {
        return Err(ProvenanceError::validation(format!(
            "lineage of {root} contains a cycle through {at}"
        )));
    }
    Ok(order)
}

/// Iterative three-colour DFS. Returns a node on a cycle, if any.
fn find_cycle(root: &str, edges: &HashMap<String, Vec<String>>) -> Option<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Open,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();
    let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
    marks.insert(root, Mark::Open);

    while let Some((node, next)) = stack.pop() {
        let children = edges.get(node).map(Vec::as_slice).unwrap_or(&[]);
        if let Some(child) = children.get(next) {
            stack.push((node, next + 1));
            match marks.get(child.as_str()).copied() {
                Some(Mark::Open) => return Some(child.clone()),
                Some(Mark::Done) => {}
                None => {
                    marks.insert(child.as_str(), Mark::Open);
                    stack.push((child.as_str(), 0));
                }
            }
        } else {
            marks.insert(node, Mark::Done);
        }
    }
    None
}
