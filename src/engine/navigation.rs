use log::{debug, warn};

use crate::error::{Result, SunburstError};

use super::Sunburst;

impl Sunburst {
    /// Brings `id` into view and opens its detail view.
    ///
    /// The node's parent is focused first so the node lands on the first ring;
    /// activation follows once that transition has finished. The root is
    /// activated immediately.
    pub fn navigate_to(&mut self, id: &str) -> Result<()> {
        let Some(node) = self.index.get(id) else {
            warn!("navigation target {id} not found");
            return Err(SunburstError::NodeNotFound(id.to_owned()));
        };
        let index = node.index();

        let Some(parent) = self.hierarchy.nodes()[index].parent else {
            self.pending_activation = None;
            self.activate_index(index);
            return Ok(());
        };

        if parent == self.focus.index() {
            if self.transition.is_some() {
                debug!("navigation to {id} waits for the running transition");
                self.pending_activation = Some(id.to_owned());
            } else {
                self.pending_activation = None;
                self.activate_index(index);
            }
            return Ok(());
        }

        debug!("navigating to {id} through its parent");
        self.pending_activation = Some(id.to_owned());
        self.change_focus(parent);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::engine::{Sunburst, SunburstConfig, SunburstEvent};
    use crate::error::SunburstError;
    use crate::tree::{RawNode, StaticSource};

    fn tree() -> RawNode {
        RawNode::branch(
            "r",
            "Root",
            vec![
                RawNode::branch(
                    "a",
                    "A",
                    vec![
                        RawNode::leaf("b", "B", 6.0).with_detail("note", json!({ "text": "b" })),
                        RawNode::leaf("c", "C", 4.0).with_detail("note", json!({ "text": "c" })),
                    ],
                ),
                RawNode::leaf("d", "D", 1.0).with_detail("note", json!({ "text": "d" })),
            ],
        )
        .with_detail("overview", json!(null))
    }

    fn sunburst(transition_secs: f64) -> Sunburst {
        let tree = tree();
        Sunburst::new(
            &tree,
            Arc::new(StaticSource::new(tree.clone())),
            SunburstConfig {
                transition_secs,
                ..SunburstConfig::default()
            },
        )
        .expect("valid tree")
    }

    fn activated_ids(events: &[SunburstEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|event| match event {
                SunburstEvent::Activated { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn child_of_focus_activates_immediately() {
        let mut sunburst = sunburst(0.75);
        sunburst.navigate_to("d").expect("exists");

        assert_eq!(sunburst.focus(), sunburst.hierarchy().root());
        assert!(!sunburst.is_animating());
        assert_eq!(sunburst.selection().expect("open").id, "d");
        assert_eq!(activated_ids(&sunburst.drain_events()), ["d"]);
    }

    #[test]
    fn grandchild_focuses_parent_then_activates() {
        let mut sunburst = sunburst(0.75);
        sunburst.navigate_to("c").expect("exists");

        let a = sunburst.index().get("a").expect("a");
        assert_eq!(sunburst.focus(), a);
        assert!(sunburst.selection().is_none());
        assert_eq!(sunburst.pending_activation(), Some("c"));
        assert_eq!(
            sunburst.drain_events(),
            [SunburstEvent::FocusChanged { id: "a".into() }]
        );

        sunburst.tick(1.0);
        sunburst.tick(1.5);
        assert!(sunburst.selection().is_none());

        sunburst.tick(1.75);
        assert_eq!(sunburst.selection().expect("open").id, "c");
        assert_eq!(sunburst.pending_activation(), None);
        assert_eq!(activated_ids(&sunburst.drain_events()), ["c"]);
        assert_eq!(sunburst.breadcrumb(), ["Root", "A"]);
    }

    #[test]
    fn root_activates_without_focus_change() {
        let mut sunburst = sunburst(0.75);
        sunburst.navigate_to("r").expect("exists");
        assert!(!sunburst.is_animating());
        assert_eq!(sunburst.selection().expect("open").detail_kind, "overview");
    }

    #[test]
    fn unknown_id_is_reported() {
        let mut sunburst = sunburst(0.75);
        let error = sunburst.navigate_to("ghost").expect_err("missing");
        assert!(matches!(error, SunburstError::NodeNotFound(ref id) if id == "ghost"));
        assert!(error.is_user_visible());
        assert!(sunburst.drain_events().is_empty());
    }

    #[test]
    fn user_refocus_cancels_pending_navigation() {
        let mut sunburst = sunburst(0.75);
        sunburst.navigate_to("c").expect("exists");
        sunburst.tick(0.0);

        let root = sunburst.hierarchy().root();
        sunburst.set_focus(root).expect("live node");
        sunburst.tick(0.1);
        sunburst.tick(2.0);
        assert!(sunburst.selection().is_none());
        assert_eq!(sunburst.pending_activation(), None);
    }

    #[test]
    fn navigating_while_parent_transition_runs_waits_for_it() {
        let mut sunburst = sunburst(0.75);
        let a = sunburst.index().get("a").expect("a");
        sunburst.set_focus(a).expect("live node");
        sunburst.tick(0.0);

        sunburst.navigate_to("b").expect("exists");
        assert!(sunburst.selection().is_none());
        sunburst.tick(0.75);
        assert_eq!(sunburst.selection().expect("open").id, "b");
    }

    #[test]
    fn instant_transitions_activate_in_the_same_call() {
        let mut sunburst = sunburst(0.0);
        sunburst.navigate_to("b").expect("exists");
        assert_eq!(
            sunburst.focus(),
            sunburst.index().get("a").expect("a")
        );
        assert_eq!(sunburst.selection().expect("open").id, "b");
    }
}
