use log::{debug, error};

use crate::error::Result;
use crate::hierarchy::NodeRef;
use crate::layout::{Extent, ease_cubic_in_out, interpolate, relative_to};
use crate::visibility::{ArcAppearance, BRANCH_ARC_OPACITY, LEAF_ARC_OPACITY, fade};

use super::{Sunburst, SunburstEvent};

/// One in-flight focus animation shared by every arc.
pub(super) struct Transition {
    from: Vec<Extent>,
    started_at: Option<f64>,
    duration: f64,
    eased: f64,
}

impl Sunburst {
    /// Re-centers the sunburst on `node` and animates every arc toward it.
    ///
    /// Cancels any navigation waiting for the previous transition.
    pub fn set_focus(&mut self, node: NodeRef) -> Result<()> {
        let index = self.hierarchy.resolve(node).inspect_err(|error| {
            error!("set_focus rejected: {error}");
        })?;
        if self.pending_activation.take().is_some() {
            debug!("focus change superseded a pending navigation");
        }
        self.change_focus(index);
        Ok(())
    }

    /// Zooms out one level. Does nothing at the root.
    pub fn zoom_out(&mut self) {
        if let Some(parent) = self.focus_node().parent {
            self.pending_activation = None;
            self.change_focus(parent);
        }
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    /// Animation-frame callback. `now` is any monotonic clock in seconds; the
    /// first tick after a focus change marks the start of its transition.
    pub fn tick(&mut self, now: f64) {
        let Some(transition) = self.transition.as_mut() else {
            return;
        };

        let started_at = *transition.started_at.get_or_insert(now);
        let progress = if transition.duration <= 0.0 {
            1.0
        } else {
            ((now - started_at) / transition.duration).clamp(0.0, 1.0)
        };
        transition.eased = ease_cubic_in_out(progress);

        for (node, from) in self
            .hierarchy
            .nodes_mut()
            .iter_mut()
            .zip(&transition.from)
        {
            node.current = interpolate(*from, node.target, transition.eased);
        }

        if progress >= 1.0 {
            self.finish_transition();
        }
    }

    pub fn appearance(&self, node: NodeRef) -> Result<ArcAppearance> {
        let index = self.hierarchy.resolve(node)?;
        Ok(self.appearance_at(index))
    }

    /// Appearance of every node, in hierarchy order.
    pub fn appearances(&self) -> Vec<ArcAppearance> {
        (0..self.hierarchy.len())
            .map(|index| self.appearance_at(index))
            .collect()
    }

    /// Topmost drawn arc under the polar point (`angle` radians clockwise from
    /// twelve o'clock, `radius` in rings from the center).
    pub fn hit_test(&self, angle: f64, radius: f64) -> Option<NodeRef> {
        self.hierarchy
            .nodes()
            .iter()
            .enumerate()
            .find(|(index, node)| {
                *index != self.focus.index()
                    && node.current.contains(angle, radius)
                    && self.appearance_at(*index).is_drawn()
            })
            .map(|(index, _)| self.hierarchy.handle(index))
    }

    pub(super) fn change_focus(&mut self, index: usize) {
        self.retarget(index);
        self.focus = self.hierarchy.handle(index);
        self.set_breadcrumb_for(index);
        self.close_selection_outside_focus();

        let id = self.hierarchy.nodes()[index].id.clone();
        debug!("focus -> {id}");
        self.events.push_back(SunburstEvent::FocusChanged { id });

        self.start_transition();
    }

    pub(super) fn retarget(&mut self, focus_index: usize) {
        let (focus_layout, focus_depth) = {
            let focus = &self.hierarchy.nodes()[focus_index];
            (focus.layout, focus.depth)
        };
        for node in self.hierarchy.nodes_mut() {
            node.target = relative_to(node.layout, focus_layout, focus_depth);
        }
    }

    /// Jumps every arc to its target without animating.
    pub(super) fn snap_to_targets(&mut self) {
        self.transition = None;
        for node in self.hierarchy.nodes_mut() {
            node.current = node.target;
        }
    }

    fn start_transition(&mut self) {
        if self.config.transition_secs <= 0.0 {
            self.snap_to_targets();
            self.fire_pending_activation();
            return;
        }

        // Restarting mid-flight continues from wherever the arcs are right now.
        let from = self
            .hierarchy
            .nodes()
            .iter()
            .map(|node| node.current)
            .collect();
        self.transition = Some(Transition {
            from,
            started_at: None,
            duration: self.config.transition_secs,
            eased: 0.0,
        });
    }

    fn finish_transition(&mut self) {
        self.snap_to_targets();
        self.fire_pending_activation();
    }

    fn fire_pending_activation(&mut self) {
        let Some(id) = self.pending_activation.take() else {
            return;
        };
        match self.index.get(&id) {
            Some(handle) => {
                self.activate_index(handle.index());
            }
            None => debug!("pending activation of {id} no longer resolves"),
        }
    }

    fn appearance_at(&self, index: usize) -> ArcAppearance {
        if index == self.focus.index() {
            return ArcAppearance::default();
        }

        let policy = &self.config.visibility;
        let node = &self.hierarchy.nodes()[index];
        let full = if node.is_leaf() {
            LEAF_ARC_OPACITY
        } else {
            BRANCH_ARC_OPACITY
        };

        let Some(transition) = &self.transition else {
            return ArcAppearance {
                arc_opacity: if policy.arc_visible(&node.current) {
                    full
                } else {
                    0.0
                },
                label_opacity: if policy.label_visible(&node.current) {
                    1.0
                } else {
                    0.0
                },
            };
        };

        if node.current.angular_span() <= 0.0 {
            return ArcAppearance::default();
        }

        let from = transition.from[index];
        ArcAppearance {
            arc_opacity: fade(
                policy.arc_visible(&from),
                policy.arc_visible(&node.target),
                full,
                transition.eased,
            ),
            label_opacity: fade(
                policy.label_visible(&from),
                policy.label_visible(&node.target),
                1.0,
                transition.eased,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::TAU;
    use std::sync::Arc;

    use crate::engine::{Sunburst, SunburstConfig, SunburstEvent};
    use crate::error::SunburstError;
    use crate::hierarchy::build_hierarchy;
    use crate::layout::Extent;
    use crate::tree::{RawNode, StaticSource};

    const EPS: f64 = 1e-9;

    fn tree() -> RawNode {
        RawNode::branch(
            "r",
            "Root",
            vec![
                RawNode::branch(
                    "a",
                    "A",
                    vec![
                        RawNode::leaf("b", "B", 6.0),
                        RawNode::branch(
                            "c",
                            "C",
                            vec![
                                RawNode::leaf("c1", "C1", 3.0),
                                RawNode::leaf("c2", "C2", 1.0),
                            ],
                        ),
                    ],
                ),
                RawNode::leaf("z", "Z", 10.0),
            ],
        )
    }

    fn sunburst(transition_secs: f64) -> Sunburst {
        let tree = tree();
        let source = Arc::new(StaticSource::new(tree.clone()));
        Sunburst::new(
            &tree,
            source,
            SunburstConfig {
                transition_secs,
                ..SunburstConfig::default()
            },
        )
        .expect("valid tree")
    }

    fn handle(sunburst: &Sunburst, id: &str) -> crate::hierarchy::NodeRef {
        sunburst.index().get(id).expect("id exists")
    }

    fn target(sunburst: &Sunburst, id: &str) -> Extent {
        sunburst.node_by_id(id).expect("id exists").target
    }

    #[test]
    fn focus_rescales_subtree_to_full_turn() {
        let mut sunburst = sunburst(0.0);
        sunburst.set_focus(handle(&sunburst, "a")).expect("live node");

        let b = target(&sunburst, "b");
        let c = target(&sunburst, "c");
        assert!(b.approx_eq(&Extent::new(0.0, TAU * 0.6, 1.0, 2.0), EPS));
        assert!(c.approx_eq(&Extent::new(TAU * 0.6, TAU, 1.0, 2.0), EPS));

        let z = target(&sunburst, "z");
        assert!(z.angular_span().abs() < EPS);
        assert_eq!((z.y0, z.y1), (0.0, 1.0));

        let root = target(&sunburst, "r");
        assert_eq!((root.y0, root.y1), (0.0, 0.0));
    }

    #[test]
    fn zooming_back_to_root_restores_layout() {
        let mut sunburst = sunburst(0.0);
        let original = sunburst
            .hierarchy()
            .iter()
            .map(|(_, node)| node.layout)
            .collect::<Vec<_>>();

        sunburst.set_focus(handle(&sunburst, "a")).expect("live node");
        sunburst.set_focus(handle(&sunburst, "c")).expect("live node");
        sunburst.zoom_out();
        let root = sunburst.hierarchy().root();
        sunburst.set_focus(root).expect("live node");

        for ((_, node), layout) in sunburst.hierarchy().iter().zip(&original) {
            assert!(node.target.approx_eq(layout, EPS), "{} drifted", node.id);
            assert!(node.current.approx_eq(layout, EPS));
        }
    }

    #[test]
    fn transition_interpolates_in_lockstep() {
        let mut sunburst = sunburst(1.0);
        let before = target(&sunburst, "b");
        sunburst.set_focus(handle(&sunburst, "a")).expect("live node");
        assert!(sunburst.is_animating());

        sunburst.tick(10.0);
        let b = sunburst.node_by_id("b").expect("b");
        assert_eq!(b.current, before);

        sunburst.tick(10.5);
        let b = sunburst.node_by_id("b").expect("b").clone();
        let c = sunburst.node_by_id("c").expect("c").clone();
        let halfway_b = crate::layout::interpolate(before, b.target, 0.5);
        assert!(b.current.approx_eq(&halfway_b, EPS));
        assert!((c.current.y0 - 1.5).abs() < EPS);

        sunburst.tick(11.0);
        assert!(!sunburst.is_animating());
        let b = sunburst.node_by_id("b").expect("b");
        assert_eq!(b.current, b.target);
    }

    #[test]
    fn refocus_mid_flight_restarts_from_current() {
        let mut sunburst = sunburst(1.0);
        sunburst.set_focus(handle(&sunburst, "a")).expect("live node");
        sunburst.tick(0.0);
        sunburst.tick(0.5);
        let midway = sunburst.node_by_id("b").expect("b").current;

        let root = sunburst.hierarchy().root();
        sunburst.set_focus(root).expect("live node");
        sunburst.tick(2.0);
        let b = sunburst.node_by_id("b").expect("b");
        assert_eq!(b.current, midway);

        sunburst.tick(3.0);
        let b = sunburst.node_by_id("b").expect("b");
        assert!(b.current.approx_eq(&b.layout, EPS));
    }

    #[test]
    fn leaving_arcs_fade_instead_of_cutting() {
        let mut sunburst = sunburst(1.0);
        let z = handle(&sunburst, "z");
        assert!(sunburst.appearance(z).expect("live").arc_opacity > 0.0);

        sunburst.set_focus(handle(&sunburst, "a")).expect("live node");
        sunburst.tick(0.0);
        let start = sunburst.appearance(z).expect("live");
        assert!((start.arc_opacity - 0.4).abs() < 1e-6);

        sunburst.tick(0.5);
        let middle = sunburst.appearance(z).expect("live");
        assert!(middle.arc_opacity > 0.0 && middle.arc_opacity < 0.4);

        sunburst.tick(1.0);
        assert_eq!(sunburst.appearance(z).expect("live").arc_opacity, 0.0);
    }

    #[test]
    fn entering_arcs_ramp_in() {
        let mut sunburst = sunburst(1.0);
        let c1 = handle(&sunburst, "c1");
        assert_eq!(sunburst.appearance(c1).expect("live").arc_opacity, 0.0);

        sunburst.set_focus(handle(&sunburst, "a")).expect("live node");
        sunburst.tick(0.0);
        assert_eq!(sunburst.appearance(c1).expect("live").arc_opacity, 0.0);
        sunburst.tick(0.5);
        let middle = sunburst.appearance(c1).expect("live").arc_opacity;
        assert!(middle > 0.0 && middle < 0.4);
        sunburst.tick(1.0);
        assert!((sunburst.appearance(c1).expect("live").arc_opacity - 0.4).abs() < 1e-6);
    }

    #[test]
    fn pending_activation_fires_when_transition_finishes() {
        let tree = RawNode::branch(
            "r",
            "Root",
            vec![RawNode::branch(
                "a",
                "A",
                vec![RawNode::leaf("b", "B", 2.0).with_detail("note", serde_json::json!(1))],
            )],
        );
        let mut sunburst = Sunburst::new(
            &tree,
            Arc::new(StaticSource::new(tree.clone())),
            SunburstConfig {
                transition_secs: 1.0,
                ..SunburstConfig::default()
            },
        )
        .expect("valid tree");

        sunburst.navigate_to("b").expect("exists");
        assert!(sunburst.is_animating());
        sunburst.tick(4.0);
        sunburst.tick(4.9);
        assert_eq!(sunburst.pending_activation(), Some("b"));
        assert!(sunburst.selection().is_none());

        sunburst.tick(5.0);
        assert!(!sunburst.is_animating());
        assert_eq!(sunburst.pending_activation(), None);
        assert_eq!(sunburst.selection().expect("open").id, "b");
    }

    #[test]
    fn focus_node_is_never_drawn() {
        let mut sunburst = sunburst(0.0);
        let a = handle(&sunburst, "a");
        sunburst.set_focus(a).expect("live node");
        assert!(!sunburst.appearance(a).expect("live").is_drawn());
    }

    #[test]
    fn stale_focus_is_rejected_without_side_effects() {
        let mut sunburst = sunburst(0.0);
        let (other, other_index) = build_hierarchy(&tree(), 42).expect("valid tree");
        let foreign = other_index.get("a").expect("a");
        assert_eq!(other.generation(), 42);

        let result = sunburst.set_focus(foreign);
        assert!(matches!(result, Err(SunburstError::StaleNode { .. })));
        assert_eq!(sunburst.focus(), sunburst.hierarchy().root());
        assert!(sunburst.drain_events().is_empty());
    }

    #[test]
    fn zoom_out_at_root_is_noop() {
        let mut sunburst = sunburst(0.0);
        sunburst.zoom_out();
        assert_eq!(sunburst.focus(), sunburst.hierarchy().root());
        assert!(sunburst.drain_events().is_empty());
    }

    #[test]
    fn breadcrumb_follows_focus() {
        let mut sunburst = sunburst(0.0);
        assert_eq!(sunburst.breadcrumb(), ["Root"]);
        sunburst.set_focus(handle(&sunburst, "c")).expect("live node");
        assert_eq!(sunburst.breadcrumb(), ["Root", "A", "C"]);
        assert_eq!(
            sunburst.drain_events(),
            [SunburstEvent::FocusChanged { id: "c".into() }]
        );
        sunburst.zoom_out();
        assert_eq!(sunburst.breadcrumb(), ["Root", "A"]);
    }

    #[test]
    fn hit_test_uses_current_extents() {
        let mut sunburst = sunburst(0.0);
        let z = sunburst.node_by_id("z").expect("z").current;
        assert_eq!(
            sunburst.hit_test(z.mid_angle(), 1.5),
            Some(handle(&sunburst, "z"))
        );
        assert_eq!(sunburst.hit_test(1.0, 0.5), None);

        sunburst.set_focus(handle(&sunburst, "a")).expect("live node");
        assert_eq!(sunburst.hit_test(0.1, 1.5), Some(handle(&sunburst, "b")));
        assert_eq!(sunburst.hit_test(0.1, 2.5), None);
        assert_eq!(sunburst.hit_test(TAU * 0.7, 2.5), Some(handle(&sunburst, "c1")));
    }
}
