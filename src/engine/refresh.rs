use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use log::{info, warn};

use crate::error::{Result, SunburstError};
use crate::hierarchy::build_hierarchy;
use crate::tree::{RawNode, TreeSource};

use super::selection::{CloseReason, Selection};
use super::{Sunburst, SunburstEvent};

type FetchResult = anyhow::Result<RawNode>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshRequest {
    Started,
    /// A fetch was already running; its result will serve this request too.
    Joined,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusReconcile {
    Kept,
    ResetToRoot,
}

#[derive(Debug)]
pub enum SelectionReconcile {
    NoneOpen,
    Reopened { id: String },
    Stale(SunburstError),
}

#[derive(Debug)]
pub struct RefreshReport {
    pub generation: u64,
    pub node_count: usize,
    pub focus: FocusReconcile,
    pub selection: SelectionReconcile,
}

pub(super) struct RefreshCoordinator {
    source: Arc<dyn TreeSource>,
    in_flight: Option<Receiver<FetchResult>>,
}

impl RefreshCoordinator {
    pub(super) fn new(source: Arc<dyn TreeSource>) -> Self {
        Self {
            source,
            in_flight: None,
        }
    }

    fn request(&mut self) -> RefreshRequest {
        if self.in_flight.is_some() {
            return RefreshRequest::Joined;
        }

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        thread::spawn(move || {
            let _ = tx.send(source.fetch_tree());
        });
        self.in_flight = Some(rx);
        RefreshRequest::Started
    }

    fn poll(&mut self) -> Option<FetchResult> {
        let rx = self.in_flight.take()?;
        match rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => {
                self.in_flight = Some(rx);
                None
            }
            Err(TryRecvError::Disconnected) => {
                Some(Err(anyhow!("background fetch worker disconnected")))
            }
        }
    }

    fn wait(&mut self, timeout: Duration) -> Option<FetchResult> {
        let rx = self.in_flight.take()?;
        match rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => {
                self.in_flight = Some(rx);
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                Some(Err(anyhow!("background fetch worker disconnected")))
            }
        }
    }
}

impl Sunburst {
    /// Starts fetching a fresh tree in the background. The current tree stays
    /// interactive until [`Sunburst::poll_refresh`] applies the result.
    pub fn refresh(&mut self) -> RefreshRequest {
        let request = self.refresh.request();
        match request {
            RefreshRequest::Started => {
                info!("refresh started from {}", self.refresh.source.describe())
            }
            RefreshRequest::Joined => info!("refresh already in flight, joining it"),
        }
        request
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.in_flight.is_some()
    }

    /// Applies a finished fetch, if any. Call once per frame.
    pub fn poll_refresh(&mut self) -> Option<Result<RefreshReport>> {
        let fetched = self.refresh.poll()?;
        Some(self.apply_fetched(fetched))
    }

    /// Blocks up to `timeout` for the in-flight fetch and applies it.
    pub fn wait_for_refresh(&mut self, timeout: Duration) -> Option<Result<RefreshReport>> {
        let fetched = self.refresh.wait(timeout)?;
        Some(self.apply_fetched(fetched))
    }

    fn apply_fetched(&mut self, fetched: FetchResult) -> Result<RefreshReport> {
        let rebuilt = fetched
            .map_err(|error| SunburstError::fetch(&error))
            .and_then(|tree| build_hierarchy(&tree, self.hierarchy.generation() + 1));
        let (hierarchy, index) = match rebuilt {
            Ok(rebuilt) => rebuilt,
            Err(error) => {
                warn!("refresh failed, keeping previous tree: {error}");
                self.events.push_back(SunburstEvent::RefreshFailed {
                    message: error.to_string(),
                });
                return Err(error);
            }
        };

        let previous_focus = self.focus_node().id.clone();
        self.hierarchy = hierarchy;
        self.index = index;
        self.transition = None;
        self.focus = self.hierarchy.root();

        let selection = self.reconcile_selection();
        let focus = self.reconcile_focus(&previous_focus);
        self.close_selection_outside_focus();
        self.reconcile_pending_activation();

        let generation = self.hierarchy.generation();
        info!(
            "refresh applied: pass {generation}, {} nodes, focus {focus:?}",
            self.hierarchy.len()
        );
        self.events.push_back(SunburstEvent::Refreshed { generation });

        Ok(RefreshReport {
            generation,
            node_count: self.hierarchy.len(),
            focus,
            selection,
        })
    }

    fn reconcile_selection(&mut self) -> SelectionReconcile {
        // Read at apply time: a view closed while the fetch ran stays closed.
        let Some(previous) = self.selection.take() else {
            return SelectionReconcile::NoneOpen;
        };

        let fresh = self
            .index
            .get(&previous.id)
            .and_then(|handle| self.hierarchy.node(handle).ok())
            .and_then(|node| {
                node.detail_kind.clone().map(|detail_kind| Selection {
                    id: node.id.clone(),
                    detail_kind,
                    payload: node.detail_payload.clone(),
                })
            });

        match fresh {
            Some(selection) => {
                let id = selection.id.clone();
                self.open_selection(selection);
                SelectionReconcile::Reopened { id }
            }
            None => {
                warn!("selected node {} is gone after refresh", previous.id);
                self.events.push_back(SunburstEvent::SelectionClosed {
                    id: previous.id.clone(),
                    reason: CloseReason::StaleAfterRefresh,
                });
                SelectionReconcile::Stale(SunburstError::SelectionStaleAfterRefresh(previous.id))
            }
        }
    }

    fn reconcile_focus(&mut self, previous_focus: &str) -> FocusReconcile {
        let (focus_index, outcome) = match self.index.get(previous_focus) {
            Some(handle) => (handle.index(), FocusReconcile::Kept),
            None => (self.hierarchy.root().index(), FocusReconcile::ResetToRoot),
        };

        self.retarget(focus_index);
        self.snap_to_targets();
        self.focus = self.hierarchy.handle(focus_index);
        self.set_breadcrumb_for(focus_index);
        if outcome == FocusReconcile::ResetToRoot {
            let id = self.focus_node().id.clone();
            self.events.push_back(SunburstEvent::FocusChanged { id });
        }
        outcome
    }

    fn reconcile_pending_activation(&mut self) {
        let Some(id) = self.pending_activation.take() else {
            return;
        };
        if let Some(handle) = self.index.get(&id) {
            self.activate_index(handle.index());
        } else {
            warn!("navigation target {id} disappeared during refresh");
        }
    }
}
