use std::collections::{HashMap, HashSet};

use log::debug;
use serde_json::Value;

use crate::error::{Result, SunburstError};
use crate::layout::{Extent, partition_children, root_extent};
use crate::tree::RawNode;

/// Handle to a node of one specific layout pass.
///
/// Handles carry the pass generation so that a handle kept across a rebuild is
/// rejected instead of silently pointing at an unrelated node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef {
    generation: u64,
    index: usize,
}

impl NodeRef {
    pub fn generation(self) -> u64 {
        self.generation
    }

    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Clone, Debug)]
pub struct HierarchyNode {
    pub id: String,
    pub name: String,
    pub weight: f64,
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Extent assigned by the partition layout, with the root in focus.
    pub layout: Extent,
    pub current: Extent,
    pub target: Extent,
    pub detail_kind: Option<String>,
    pub detail_payload: Value,
}

impl HierarchyNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

pub struct Hierarchy {
    generation: u64,
    nodes: Vec<HierarchyNode>,
    height: usize,
}

impl Hierarchy {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn root(&self) -> NodeRef {
        self.handle(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth of the deepest node.
    pub fn height(&self) -> usize {
        self.height
    }

    pub(crate) fn handle(&self, index: usize) -> NodeRef {
        NodeRef {
            generation: self.generation,
            index,
        }
    }

    pub fn resolve(&self, node: NodeRef) -> Result<usize> {
        if node.generation != self.generation || node.index >= self.nodes.len() {
            return Err(SunburstError::StaleNode {
                held: node.generation,
                current: self.generation,
            });
        }
        Ok(node.index)
    }

    pub fn node(&self, node: NodeRef) -> Result<&HierarchyNode> {
        let index = self.resolve(node)?;
        Ok(&self.nodes[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &HierarchyNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (self.handle(index), node))
    }

    pub(crate) fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [HierarchyNode] {
        &mut self.nodes
    }

    pub fn parent(&self, node: NodeRef) -> Result<Option<NodeRef>> {
        Ok(self.node(node)?.parent.map(|index| self.handle(index)))
    }

    pub fn children(&self, node: NodeRef) -> Result<Vec<NodeRef>> {
        Ok(self
            .node(node)?
            .children
            .iter()
            .map(|&index| self.handle(index))
            .collect())
    }

    /// Chain of nodes from the root down to `node`, both inclusive.
    pub fn ancestor_path(&self, node: NodeRef) -> Result<Vec<NodeRef>> {
        let mut cursor = Some(self.resolve(node)?);
        let mut path = Vec::new();
        while let Some(index) = cursor {
            path.push(self.handle(index));
            cursor = self.nodes[index].parent;
        }
        path.reverse();
        Ok(path)
    }

    pub fn ancestor_names(&self, node: NodeRef) -> Result<Vec<String>> {
        Ok(self
            .ancestor_path(node)?
            .into_iter()
            .map(|handle| self.nodes[handle.index].name.clone())
            .collect())
    }

    /// True when `node` is `ancestor` itself or lies somewhere below it.
    pub fn is_within(&self, node: NodeRef, ancestor: NodeRef) -> Result<bool> {
        let ancestor = self.resolve(ancestor)?;
        let mut cursor = Some(self.resolve(node)?);
        while let Some(index) = cursor {
            if index == ancestor {
                return Ok(true);
            }
            cursor = self.nodes[index].parent;
        }
        Ok(false)
    }

    /// Index of `node`'s top-level branch among the root's children.
    pub fn top_level_branch(&self, node: NodeRef) -> Result<Option<usize>> {
        let path = self.ancestor_path(node)?;
        let Some(branch) = path.get(1) else {
            return Ok(None);
        };
        Ok(self.nodes[0]
            .children
            .iter()
            .position(|&child| child == branch.index))
    }
}

/// Maps stable external ids onto the nodes of a single layout pass.
pub struct NodeIndex {
    generation: u64,
    by_id: HashMap<String, usize>,
}

impl NodeIndex {
    pub fn get(&self, id: &str) -> Option<NodeRef> {
        self.by_id.get(id).map(|&index| NodeRef {
            generation: self.generation,
            index,
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

struct FlatNode<'a> {
    raw: &'a RawNode,
    depth: usize,
    children: Vec<usize>,
}

pub fn build_hierarchy(root: &RawNode, generation: u64) -> Result<(Hierarchy, NodeIndex)> {
    let mut flat: Vec<FlatNode<'_>> = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut stack = vec![(root, None::<usize>, 0usize)];

    while let Some((raw, parent, depth)) = stack.pop() {
        if !seen_ids.insert(raw.id.as_str()) {
            return Err(SunburstError::MalformedTree(format!(
                "duplicate node id \"{}\"",
                raw.id
            )));
        }
        if let Some(value) = raw.value
            && (!value.is_finite() || value < 0.0)
        {
            return Err(SunburstError::MalformedTree(format!(
                "node \"{}\" has invalid weight {value}",
                raw.id
            )));
        }

        let index = flat.len();
        flat.push(FlatNode {
            raw,
            depth,
            children: Vec::with_capacity(raw.children.len()),
        });
        if let Some(parent) = parent {
            flat[parent].children.push(index);
        }

        for child in raw.children.iter().rev() {
            stack.push((child, Some(index), depth + 1));
        }
    }

    // Preorder puts every child after its parent, so a reverse sweep sums bottom-up.
    let mut weights = vec![0.0f64; flat.len()];
    for index in (0..flat.len()).rev() {
        let node = &flat[index];
        if node.children.is_empty() {
            weights[index] = node.raw.value.unwrap_or(0.0);
            continue;
        }

        let summed = node.children.iter().map(|&child| weights[child]).sum::<f64>();
        if summed <= 0.0 {
            return Err(SunburstError::MalformedTree(format!(
                "node \"{}\" has children but zero total weight",
                node.raw.id
            )));
        }
        if let Some(declared) = node.raw.value
            && (declared - summed).abs() > f64::EPSILON * summed.max(1.0)
        {
            debug!(
                "ignoring declared weight {declared} of \"{}\" in favour of summed {summed}",
                node.raw.id
            );
        }
        weights[index] = summed;
    }

    for node in &mut flat {
        node.children.sort_by(|a, b| weights[*b].total_cmp(&weights[*a]));
    }

    let mut nodes: Vec<HierarchyNode> = Vec::with_capacity(flat.len());
    let mut by_id = HashMap::with_capacity(flat.len());
    let mut height = 0usize;
    let mut layout_stack = vec![(0usize, None::<usize>, root_extent())];

    while let Some((flat_index, parent, extent)) = layout_stack.pop() {
        let source = &flat[flat_index];
        let index = nodes.len();
        height = height.max(source.depth);

        nodes.push(HierarchyNode {
            id: source.raw.id.clone(),
            name: source.raw.name.clone(),
            weight: weights[flat_index],
            depth: source.depth,
            parent,
            children: Vec::with_capacity(source.children.len()),
            layout: extent,
            current: extent,
            target: extent,
            detail_kind: source.raw.detail_kind.clone(),
            detail_payload: source.raw.detail_payload.clone(),
        });
        by_id.insert(source.raw.id.clone(), index);
        if let Some(parent) = parent {
            nodes[parent].children.push(index);
        }

        let child_weights = source
            .children
            .iter()
            .map(|&child| weights[child])
            .collect::<Vec<_>>();
        let child_extents = partition_children(extent, &child_weights);
        for (&child, child_extent) in source.children.iter().zip(child_extents).rev() {
            layout_stack.push((child, Some(index), child_extent));
        }
    }

    debug!(
        "built layout pass {generation}: {} nodes, height {height}",
        nodes.len()
    );

    Ok((
        Hierarchy {
            generation,
            nodes,
            height,
        },
        NodeIndex { generation, by_id },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    const EPS: f64 = 1e-9;

    fn sample_tree() -> RawNode {
        RawNode::branch(
            "r",
            "Root",
            vec![RawNode::branch(
                "a",
                "A",
                vec![RawNode::leaf("b", "B", 6.0), RawNode::leaf("c", "C", 4.0)],
            )],
        )
    }

    fn wide_tree() -> RawNode {
        RawNode::branch(
            "root",
            "Root",
            vec![
                RawNode::leaf("small", "Small", 1.0),
                RawNode::branch(
                    "big",
                    "Big",
                    vec![
                        RawNode::leaf("big-1", "Big 1", 5.0),
                        RawNode::branch(
                            "big-2",
                            "Big 2",
                            vec![
                                RawNode::leaf("big-2-a", "Big 2a", 2.0),
                                RawNode::leaf("big-2-b", "Big 2b", 2.0),
                                RawNode::leaf("big-2-c", "Big 2c", 0.0),
                            ],
                        ),
                    ],
                ),
                RawNode::leaf("tie-first", "Tie first", 3.0),
                RawNode::leaf("tie-second", "Tie second", 3.0),
            ],
        )
    }

    fn assert_partitioned(hierarchy: &Hierarchy) {
        for (_, node) in hierarchy.iter() {
            assert!(node.layout.x0 <= node.layout.x1);
            assert!(node.layout.y0 < node.layout.y1);
            if node.children.is_empty() {
                continue;
            }

            let children = &hierarchy.nodes()[..];
            let spans = node
                .children
                .iter()
                .map(|&child| children[child].layout.angular_span())
                .sum::<f64>();
            assert!((spans - node.layout.angular_span()).abs() < EPS);

            let first = &children[node.children[0]];
            assert!((first.layout.x0 - node.layout.x0).abs() < EPS);
            for pair in node.children.windows(2) {
                assert!((children[pair[0]].layout.x1 - children[pair[1]].layout.x0).abs() < EPS);
            }
            for &child in &node.children {
                assert_eq!(children[child].depth, node.depth + 1);
                assert!(children[child].layout.x0 >= node.layout.x0 - EPS);
                assert!(children[child].layout.x1 <= node.layout.x1 + EPS);
            }
        }
    }

    #[test]
    fn example_tree_splits_six_to_four() {
        let (hierarchy, index) = build_hierarchy(&sample_tree(), 1).expect("valid tree");
        let a = hierarchy.node(index.get("a").expect("a")).expect("live");
        let b = hierarchy.node(index.get("b").expect("b")).expect("live");
        let c = hierarchy.node(index.get("c").expect("c")).expect("live");

        assert_eq!(a.weight, 10.0);
        assert!((b.layout.angular_span() / a.layout.angular_span() - 0.6).abs() < EPS);
        assert!((c.layout.angular_span() / a.layout.angular_span() - 0.4).abs() < EPS);
        assert_eq!((b.layout.y0, b.layout.y1), (2.0, 3.0));
        assert_eq!(b.current, b.layout);
        assert_eq!(b.target, b.layout);
        assert_eq!(hierarchy.height(), 2);
    }

    #[test]
    fn root_spans_full_turn() {
        let (hierarchy, _) = build_hierarchy(&wide_tree(), 1).expect("valid tree");
        let root = hierarchy.node(hierarchy.root()).expect("root");
        assert_eq!(root.layout, Extent::new(0.0, TAU, 0.0, 1.0));
        assert_eq!(root.weight, 16.0);
    }

    #[test]
    fn partition_invariant_holds_recursively() {
        let (hierarchy, _) = build_hierarchy(&wide_tree(), 1).expect("valid tree");
        assert_partitioned(&hierarchy);
    }

    #[test]
    fn children_sorted_by_weight_with_stable_ties() {
        let (hierarchy, _) = build_hierarchy(&wide_tree(), 1).expect("valid tree");
        let root = hierarchy.root();
        let order = hierarchy
            .children(root)
            .expect("children")
            .into_iter()
            .map(|child| hierarchy.node(child).expect("live").id.clone())
            .collect::<Vec<_>>();
        assert_eq!(order, ["big", "tie-first", "tie-second", "small"]);
    }

    #[test]
    fn layout_is_deterministic() {
        let (first, _) = build_hierarchy(&wide_tree(), 1).expect("valid tree");
        let (second, _) = build_hierarchy(&wide_tree(), 2).expect("valid tree");
        let first = first.iter().map(|(_, node)| (node.id.clone(), node.layout));
        let second = second.iter().map(|(_, node)| (node.id.clone(), node.layout));
        assert!(first.eq(second));
    }

    #[test]
    fn declared_branch_value_is_not_trusted() {
        let mut tree = sample_tree();
        tree.children[0].value = Some(99.0);
        let (hierarchy, index) = build_hierarchy(&tree, 1).expect("valid tree");
        let a = hierarchy.node(index.get("a").expect("a")).expect("live");
        assert_eq!(a.weight, 10.0);
    }

    #[test]
    fn negative_weight_is_malformed() {
        let tree = RawNode::branch("r", "Root", vec![RawNode::leaf("x", "X", -1.0)]);
        assert!(matches!(
            build_hierarchy(&tree, 1),
            Err(SunburstError::MalformedTree(_))
        ));
    }

    #[test]
    fn zero_weight_branch_is_malformed() {
        let tree = RawNode::branch(
            "r",
            "Root",
            vec![RawNode::leaf("x", "X", 0.0), RawNode::leaf("y", "Y", 0.0)],
        );
        assert!(matches!(
            build_hierarchy(&tree, 1),
            Err(SunburstError::MalformedTree(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_malformed() {
        let tree = RawNode::branch(
            "r",
            "Root",
            vec![RawNode::leaf("x", "X", 1.0), RawNode::leaf("x", "X again", 1.0)],
        );
        assert!(matches!(
            build_hierarchy(&tree, 1),
            Err(SunburstError::MalformedTree(_))
        ));
    }

    #[test]
    fn stale_handles_are_rejected() {
        let (old, old_index) = build_hierarchy(&sample_tree(), 1).expect("valid tree");
        let (new, _) = build_hierarchy(&sample_tree(), 2).expect("valid tree");
        let old_b = old_index.get("b").expect("b");

        assert!(old.node(old_b).is_ok());
        assert!(matches!(
            new.node(old_b),
            Err(SunburstError::StaleNode { held: 1, current: 2 })
        ));
    }

    #[test]
    fn ancestor_queries() {
        let (hierarchy, index) = build_hierarchy(&sample_tree(), 1).expect("valid tree");
        let c = index.get("c").expect("c");
        let a = index.get("a").expect("a");
        let b = index.get("b").expect("b");

        assert_eq!(
            hierarchy.ancestor_names(c).expect("path"),
            ["Root", "A", "C"]
        );
        assert_eq!(hierarchy.parent(c).expect("live"), Some(a));
        assert_eq!(hierarchy.parent(hierarchy.root()).expect("live"), None);
        assert!(hierarchy.is_within(c, a).expect("live"));
        assert!(hierarchy.is_within(a, a).expect("live"));
        assert!(!hierarchy.is_within(b, c).expect("live"));
        assert_eq!(hierarchy.top_level_branch(c).expect("live"), Some(0));
        assert_eq!(hierarchy.top_level_branch(hierarchy.root()).expect("live"), None);
    }

    #[test]
    fn missing_leaf_value_weighs_nothing() {
        let mut leaf = RawNode::leaf("empty", "Empty", 0.0);
        leaf.value = None;
        let tree = RawNode::branch("r", "Root", vec![leaf, RawNode::leaf("x", "X", 2.0)]);
        let (hierarchy, index) = build_hierarchy(&tree, 1).expect("valid tree");
        let empty = hierarchy.node(index.get("empty").expect("empty")).expect("live");
        assert_eq!(empty.weight, 0.0);
        assert!(empty.layout.angular_span().abs() < EPS);
        assert_eq!(index.len(), 3);
    }
}
