use std::f64::consts::PI;

use eframe::egui::emath::Rot2;
use eframe::egui::epaint::TextShape;
use eframe::egui::{
    Align2, Color32, CursorIcon, FontId, Painter, Pos2, Sense, Shape, Stroke, Ui, vec2,
};

use sunburst_nav::label::{breadcrumb_lines, ellipsize};
use sunburst_nav::layout::Extent;
use sunburst_nav::util::{branch_hue, format_weight};

use super::super::render_utils::{
    arc_color, arc_mesh, arc_outline, blend_color, draw_background, polar_to_screen,
};
use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) const RING_MARGIN: f32 = 12.0;
    pub(in crate::app) const LABEL_FONT_SIZE: f32 = 12.0;
    pub(in crate::app) const BREADCRUMB_FONT_SIZE: f32 = 13.0;
    pub(in crate::app) const LABEL_PADDING: f32 = 8.0;

    pub(in crate::app) fn draw_sunburst(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click());
        let painter = ui.painter_at(rect);

        let max_rings = self.engine.config().visibility.max_rings;
        let center = rect.center();
        let ring_span = rect.width().min(rect.height()) * 0.5 - Self::RING_MARGIN;
        let ring_radius = (ring_span / max_rings as f32).max(1.0);

        self.handle_sunburst_click(&response, center, ring_radius);
        self.hovered = self.hovered_node(&response, center, ring_radius);
        let center_hovered = self.center_hovered(&response, center, ring_radius);
        if self.hovered.is_some() || center_hovered {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }

        draw_background(&painter, rect, center, ring_radius, max_rings);

        let hierarchy = self.engine.hierarchy();
        let appearances = self.engine.appearances();
        let branch_count = hierarchy
            .node(hierarchy.root())
            .map(|root| root.children.len())
            .unwrap_or(0);
        let selected_id = self.engine.selection().map(|selection| selection.id.as_str());
        let label_font = FontId::proportional(Self::LABEL_FONT_SIZE);
        let selected_color = Color32::from_rgb(245, 206, 93);

        let mut labels = Vec::new();
        for ((handle, node), appearance) in hierarchy.iter().zip(&appearances) {
            if !appearance.is_drawn() {
                continue;
            }

            let hue = hierarchy
                .top_level_branch(handle)
                .ok()
                .flatten()
                .map(|branch| branch_hue(branch, branch_count));
            let mut color = arc_color(node.depth, hue);
            if self.hovered == Some(handle) {
                color = blend_color(color, Color32::WHITE, 0.25);
            }

            painter.add(Shape::mesh(arc_mesh(
                center,
                ring_radius,
                &node.current,
                color.gamma_multiply(appearance.arc_opacity),
            )));

            if selected_id == Some(node.id.as_str()) {
                painter.add(Shape::closed_line(
                    arc_outline(center, ring_radius, &node.current),
                    Stroke::new(2.0, selected_color),
                ));
            }

            if appearance.label_opacity > 0.0 {
                labels.push((node.name.as_str(), node.current, appearance.label_opacity));
            }
        }

        for (name, extent, opacity) in labels {
            draw_arc_label(
                &painter,
                center,
                ring_radius,
                &extent,
                name,
                &label_font,
                Color32::from_gray(238).gamma_multiply(opacity),
            );
        }

        let center_fill = if center_hovered {
            Color32::from_rgb(44, 52, 62)
        } else {
            Color32::from_rgb(30, 36, 44)
        };
        painter.circle_filled(center, (ring_radius - 2.0).max(1.0), center_fill);

        let breadcrumb_font = FontId::proportional(Self::BREADCRUMB_FONT_SIZE);
        let lines = breadcrumb_lines(self.engine.breadcrumb(), ring_radius * 1.6, |text| {
            painter
                .layout_no_wrap(text.to_owned(), breadcrumb_font.clone(), Color32::WHITE)
                .size()
                .x
        });
        let line_height = Self::BREADCRUMB_FONT_SIZE * 1.3;
        let first_line_y = center.y - (lines.len().saturating_sub(1) as f32 * line_height * 0.5);
        for (row, line) in lines.into_iter().enumerate() {
            painter.text(
                Pos2::new(center.x, first_line_y + row as f32 * line_height),
                Align2::CENTER_CENTER,
                line,
                breadcrumb_font.clone(),
                Color32::from_gray(230),
            );
        }

        let hovered_summary = self.hovered.and_then(|handle| {
            let names = hierarchy.ancestor_names(handle).ok()?;
            let node = hierarchy.node(handle).ok()?;
            Some(format!("{}  |  {}", names.join("/"), format_weight(node.weight)))
        });
        let can_zoom_out = self.engine.focus_node().parent.is_some();
        let hover_text = hovered_summary
            .or_else(|| (center_hovered && can_zoom_out).then(|| "Zoom out".to_owned()));

        if let Some(hover_text) = hover_text {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                hover_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}

/// Draws `text` along the radius through the middle of the arc, flipped on the
/// left half so it never reads upside down.
fn draw_arc_label(
    painter: &Painter,
    center: Pos2,
    ring_radius: f32,
    extent: &Extent,
    text: &str,
    font: &FontId,
    color: Color32,
) {
    let thickness = (extent.y1 - extent.y0) as f32 * ring_radius - ViewModel::LABEL_PADDING;
    let chord = extent.angular_span() as f32 * extent.mid_radius() as f32 * ring_radius;
    if thickness <= 0.0 || chord < font.size {
        return;
    }

    let Some(text) = ellipsize(text, thickness, |candidate| {
        painter
            .layout_no_wrap(candidate.to_owned(), font.clone(), color)
            .size()
            .x
    }) else {
        return;
    };

    let galley = painter.layout_no_wrap(text, font.clone(), color);
    let mid_angle = extent.mid_angle();
    let mut rotation = (mid_angle - PI / 2.0) as f32;
    if mid_angle > PI {
        rotation += std::f32::consts::PI;
    }

    let anchor = polar_to_screen(center, ring_radius, mid_angle, extent.mid_radius());
    let offset = Rot2::from_angle(rotation) * (galley.size() * 0.5);
    painter.add(TextShape::new(anchor - offset, galley, color).with_angle(rotation));
}
