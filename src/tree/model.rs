use serde_json::Value;

/// One node of the tree as delivered by a data source, before any layout.
///
/// Trees can be arbitrarily deep, so counting, cloning and dropping walk an
/// explicit stack instead of recursing.
#[derive(Debug, PartialEq)]
pub struct RawNode {
    pub id: String,
    pub name: String,
    /// Own weight. Only meaningful for leaves; branch weights are always summed.
    pub value: Option<f64>,
    pub children: Vec<RawNode>,
    pub detail_kind: Option<String>,
    pub detail_payload: Value,
}

impl RawNode {
    pub fn leaf(id: impl Into<String>, name: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: Some(value),
            children: Vec::new(),
            detail_kind: None,
            detail_payload: Value::Null,
        }
    }

    pub fn branch(id: impl Into<String>, name: impl Into<String>, children: Vec<RawNode>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: None,
            children,
            detail_kind: None,
            detail_payload: Value::Null,
        }
    }

    pub fn with_detail(mut self, kind: impl Into<String>, payload: Value) -> Self {
        self.detail_kind = Some(kind.into());
        self.detail_payload = payload;
        self
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }

    fn without_children(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            value: self.value,
            children: Vec::with_capacity(self.children.len()),
            detail_kind: self.detail_kind.clone(),
            detail_payload: self.detail_payload.clone(),
        }
    }
}

/// Rebuilds a tree from its nodes listed in preorder below `root`.
///
/// Each entry names its parent by preorder position, with `0` being `root` and
/// `n` being `descendants[n - 1]`. Every node comes after its parent, so popping
/// from the back always moves a finished subtree into its parent.
pub(super) fn assemble(mut root: RawNode, mut descendants: Vec<(RawNode, usize)>) -> RawNode {
    while let Some((mut node, parent)) = descendants.pop() {
        node.children.reverse();
        match parent {
            0 => root.children.push(node),
            parent => descendants[parent - 1].0.children.push(node),
        }
    }
    root.children.reverse();
    root
}

impl Clone for RawNode {
    fn clone(&self) -> Self {
        let root = self.without_children();
        let mut descendants = Vec::new();
        let mut pending = Vec::new();
        pending.extend(self.children.iter().rev().map(|child| (child, 0)));

        while let Some((node, parent)) = pending.pop() {
            descendants.push((node.without_children(), parent));
            let position = descendants.len();
            pending.extend(node.children.iter().rev().map(|child| (child, position)));
        }

        assemble(root, descendants)
    }
}

impl Drop for RawNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
