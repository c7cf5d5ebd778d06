use eframe::egui::{Pos2, Response};

use sunburst_nav::hierarchy::NodeRef;

use super::super::render_utils::screen_to_polar;
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn hovered_node(
        &self,
        response: &Response,
        center: Pos2,
        ring_radius: f32,
    ) -> Option<NodeRef> {
        let pointer = response.hover_pos()?;
        let (angle, radius) = screen_to_polar(center, ring_radius, pointer);
        self.engine.hit_test(angle, radius)
    }

    pub(in crate::app) fn center_hovered(
        &self,
        response: &Response,
        center: Pos2,
        ring_radius: f32,
    ) -> bool {
        response
            .hover_pos()
            .is_some_and(|pointer| screen_to_polar(center, ring_radius, pointer).1 < 1.0)
    }

    pub(in crate::app) fn handle_sunburst_click(
        &mut self,
        response: &Response,
        center: Pos2,
        ring_radius: f32,
    ) {
        if !response.clicked() {
            return;
        }

        let Some(pointer) = response.interact_pointer_pos() else {
            return;
        };
        let (angle, radius) = screen_to_polar(center, ring_radius, pointer);
        if radius < 1.0 {
            self.engine.click_center();
            return;
        }

        let Some(node) = self.engine.hit_test(angle, radius) else {
            return;
        };
        if let Err(error) = self.engine.click_node(node) {
            self.report_error(&error);
        }
    }
}
