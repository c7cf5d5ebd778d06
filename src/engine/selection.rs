use log::{debug, info};
use serde_json::Value;

use crate::error::Result;
use crate::hierarchy::NodeRef;

use super::{Sunburst, SunburstEvent};

/// The node whose detail view is open. Holds values only, never a node handle.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub id: String,
    pub detail_kind: String,
    pub payload: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    Dismissed,
    FocusMoved,
    StaleAfterRefresh,
}

impl Sunburst {
    /// Arc click: opens the node's detail view when it has one and zooms into
    /// branches. Leaves never change the focus.
    pub fn click_node(&mut self, node: NodeRef) -> Result<()> {
        let index = self.hierarchy.resolve(node)?;
        let is_leaf = self.hierarchy.nodes()[index].is_leaf();

        self.activate_index(index);
        if !is_leaf {
            self.set_focus(node)?;
        }
        Ok(())
    }

    /// Center click: zooms out one level.
    pub fn click_center(&mut self) {
        self.zoom_out();
    }

    /// Opens the detail view of `node` without touching the focus.
    /// Returns whether the node had a detail view to open.
    pub fn activate(&mut self, node: NodeRef) -> Result<bool> {
        let index = self.hierarchy.resolve(node)?;
        Ok(self.activate_index(index))
    }

    pub fn close_selection(&mut self) {
        self.close_selection_with(CloseReason::Dismissed);
    }

    pub(super) fn activate_index(&mut self, index: usize) -> bool {
        self.set_breadcrumb_for(index);

        let node = &self.hierarchy.nodes()[index];
        let Some(detail_kind) = node.detail_kind.clone() else {
            debug!("{} has no detail view", node.id);
            return false;
        };

        let selection = Selection {
            id: node.id.clone(),
            detail_kind,
            payload: node.detail_payload.clone(),
        };
        info!("activating {} ({})", selection.id, selection.detail_kind);
        self.open_selection(selection);
        true
    }

    pub(super) fn open_selection(&mut self, selection: Selection) {
        self.events.push_back(SunburstEvent::Activated {
            id: selection.id.clone(),
            detail_kind: selection.detail_kind.clone(),
            payload: selection.payload.clone(),
        });
        self.selection = Some(selection);
    }

    pub(super) fn close_selection_with(&mut self, reason: CloseReason) {
        if let Some(selection) = self.selection.take() {
            debug!("closing {} ({reason:?})", selection.id);
            self.events.push_back(SunburstEvent::SelectionClosed {
                id: selection.id,
                reason,
            });
        }
    }

    pub(super) fn close_selection_outside_focus(&mut self) {
        let Some(selection) = &self.selection else {
            return;
        };
        let inside = self
            .index
            .get(&selection.id)
            .and_then(|node| self.hierarchy.is_within(node, self.focus).ok())
            .unwrap_or(false);
        if !inside {
            self.close_selection_with(CloseReason::FocusMoved);
        }
    }
}
