use std::f64::consts::TAU;

use eframe::egui::epaint::{Hsva, Mesh};
use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, pos2};

use sunburst_nav::layout::Extent;

const PAD_ANGLE: f64 = 0.005;
const SEGMENTS_PER_RADIAN: f64 = 36.0;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

/// Rainbow by top-level branch for the two inner rings, grey ramp below.
pub(super) fn arc_color(depth: usize, branch_hue: Option<f32>) -> Color32 {
    match branch_hue {
        Some(hue) if depth < 3 => Hsva::new(hue, 0.62, 0.88, 1.0).into(),
        _ => {
            let shade = 196u8.saturating_sub((depth.saturating_sub(3) * 18).min(120) as u8);
            Color32::from_gray(shade)
        }
    }
}

pub(super) fn draw_background(
    painter: &Painter,
    rect: Rect,
    center: Pos2,
    ring_radius: f32,
    rings: f64,
) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let mut ring = 1.0;
    while ring <= rings {
        painter.circle_stroke(
            center,
            ring as f32 * ring_radius,
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        ring += 1.0;
    }
}

/// `angle` runs clockwise from twelve o'clock, `radius` is measured in rings.
pub(super) fn polar_to_screen(center: Pos2, ring_radius: f32, angle: f64, radius: f64) -> Pos2 {
    let distance = radius as f32 * ring_radius;
    pos2(
        center.x + distance * angle.sin() as f32,
        center.y - distance * angle.cos() as f32,
    )
}

pub(super) fn screen_to_polar(center: Pos2, ring_radius: f32, screen: Pos2) -> (f64, f64) {
    let offset = screen - center;
    let radius = (offset.length() / ring_radius.max(f32::EPSILON)) as f64;
    let angle = (offset.x as f64).atan2(-(offset.y as f64)).rem_euclid(TAU);
    (angle, radius)
}

/// Angular range actually painted, with a thin gap between neighbours.
fn padded_angles(extent: &Extent) -> (f64, f64) {
    let pad = (extent.angular_span() / 2.0).min(PAD_ANGLE) / 2.0;
    (extent.x0 + pad, extent.x1 - pad)
}

fn segment_count(start: f64, end: f64) -> usize {
    (((end - start) * SEGMENTS_PER_RADIAN).ceil() as usize).clamp(1, 256)
}

/// Outer radius keeps a one-pixel gap to the next ring.
fn painted_radii(extent: &Extent, ring_radius: f32) -> (f64, f64) {
    let inner = extent.y0.max(0.0);
    let outer = (extent.y1 - 1.0 / ring_radius.max(1.0) as f64).max(inner);
    (inner, outer)
}

pub(super) fn arc_mesh(center: Pos2, ring_radius: f32, extent: &Extent, color: Color32) -> Mesh {
    let mut mesh = Mesh::default();
    let (start, end) = padded_angles(extent);
    let (inner, outer) = painted_radii(extent, ring_radius);
    if end <= start || outer <= inner {
        return mesh;
    }

    let segments = segment_count(start, end);
    for step in 0..=segments {
        let angle = start + (end - start) * step as f64 / segments as f64;
        mesh.colored_vertex(polar_to_screen(center, ring_radius, angle, inner), color);
        mesh.colored_vertex(polar_to_screen(center, ring_radius, angle, outer), color);
    }
    for step in 0..segments as u32 {
        let base = step * 2;
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base + 1, base + 3, base + 2);
    }
    mesh
}

pub(super) fn arc_outline(center: Pos2, ring_radius: f32, extent: &Extent) -> Vec<Pos2> {
    let (start, end) = padded_angles(extent);
    let (inner, outer) = painted_radii(extent, ring_radius);
    let segments = segment_count(start, end);

    let angle_at = |step: usize| start + (end - start) * step as f64 / segments as f64;
    let mut points = (0..=segments)
        .map(|step| polar_to_screen(center, ring_radius, angle_at(step), outer))
        .collect::<Vec<_>>();
    points.extend(
        (0..=segments)
            .rev()
            .map(|step| polar_to_screen(center, ring_radius, angle_at(step), inner)),
    );
    points
}
