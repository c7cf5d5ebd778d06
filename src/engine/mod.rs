use std::collections::VecDeque;
use std::sync::Arc;

use log::info;
use serde_json::Value;

use crate::error::Result;
use crate::hierarchy::{Hierarchy, HierarchyNode, NodeIndex, NodeRef, build_hierarchy};
use crate::tree::{RawNode, TreeSource};
use crate::visibility::VisibilityPolicy;

mod focus;
mod navigation;
mod refresh;
mod selection;

use self::focus::Transition;
use self::refresh::RefreshCoordinator;

pub use self::refresh::{FocusReconcile, RefreshReport, RefreshRequest, SelectionReconcile};
pub use self::selection::{CloseReason, Selection};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunburstConfig {
    pub visibility: VisibilityPolicy,
    /// Length of one focus transition. Zero or less snaps immediately.
    pub transition_secs: f64,
}

impl Default for SunburstConfig {
    fn default() -> Self {
        Self {
            visibility: VisibilityPolicy::default(),
            transition_secs: 0.75,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SunburstEvent {
    Activated {
        id: String,
        detail_kind: String,
        payload: Value,
    },
    SelectionClosed {
        id: String,
        reason: CloseReason,
    },
    FocusChanged {
        id: String,
    },
    Refreshed {
        generation: u64,
    },
    RefreshFailed {
        message: String,
    },
}

/// Owns one sunburst: the laid-out hierarchy, its id index, the focus, the
/// open selection and the refresh pipeline.
pub struct Sunburst {
    config: SunburstConfig,
    hierarchy: Hierarchy,
    index: NodeIndex,
    focus: NodeRef,
    transition: Option<Transition>,
    pending_activation: Option<String>,
    selection: Option<Selection>,
    breadcrumb: Vec<String>,
    refresh: RefreshCoordinator,
    events: VecDeque<SunburstEvent>,
}

impl Sunburst {
    pub fn new(
        tree: &RawNode,
        source: Arc<dyn TreeSource>,
        config: SunburstConfig,
    ) -> Result<Self> {
        let (hierarchy, index) = build_hierarchy(tree, 1)?;
        let focus = hierarchy.root();
        let breadcrumb = vec![tree.name.clone()];
        info!(
            "sunburst ready with {} nodes from {}",
            hierarchy.len(),
            source.describe()
        );

        Ok(Self {
            config,
            hierarchy,
            index,
            focus,
            transition: None,
            pending_activation: None,
            selection: None,
            breadcrumb,
            refresh: RefreshCoordinator::new(source),
            events: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &SunburstConfig {
        &self.config
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    pub fn focus(&self) -> NodeRef {
        self.focus
    }

    pub fn focus_node(&self) -> &HierarchyNode {
        &self.hierarchy.nodes()[self.focus.index()]
    }

    pub fn node_by_id(&self, id: &str) -> Option<&HierarchyNode> {
        let handle = self.index.get(id)?;
        self.hierarchy.node(handle).ok()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    /// Names shown in the center of the sunburst, outermost first.
    pub fn breadcrumb(&self) -> &[String] {
        &self.breadcrumb
    }

    pub fn pending_activation(&self) -> Option<&str> {
        self.pending_activation.as_deref()
    }

    pub fn drain_events(&mut self) -> Vec<SunburstEvent> {
        self.events.drain(..).collect()
    }

    fn set_breadcrumb_for(&mut self, index: usize) {
        let node = &self.hierarchy.nodes()[index];
        let mut names = self
            .hierarchy
            .ancestor_names(self.hierarchy.handle(index))
            .unwrap_or_default();
        if node.is_leaf() && names.len() > 1 {
            names.pop();
        }
        self.breadcrumb = names;
    }
}
