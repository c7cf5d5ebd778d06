use crate::layout::Extent;

pub const BRANCH_ARC_OPACITY: f32 = 0.6;
pub const LEAF_ARC_OPACITY: f32 = 0.4;

/// Decides which rings around the focus are drawn and labelled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisibilityPolicy {
    /// Outermost ring (counted from the focus) that is still drawn.
    pub max_rings: f64,
    /// Narrowest arc, in radians, that still gets a label.
    pub min_angular_span: f64,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            max_rings: 3.0,
            min_angular_span: 0.03,
        }
    }
}

impl VisibilityPolicy {
    pub fn arc_visible(&self, extent: &Extent) -> bool {
        extent.y1 <= self.max_rings && extent.y0 >= 1.0 && extent.x1 > extent.x0
    }

    pub fn label_visible(&self, extent: &Extent) -> bool {
        self.arc_visible(extent) && extent.angular_span() > self.min_angular_span
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ArcAppearance {
    pub arc_opacity: f32,
    pub label_opacity: f32,
}

impl ArcAppearance {
    pub fn is_drawn(&self) -> bool {
        self.arc_opacity > 0.0
    }
}

/// Opacity of an arc part that is `from_visible` before the transition and
/// `to_visible` after it, at eased progress `eased`.
pub fn fade(from_visible: bool, to_visible: bool, full: f32, eased: f64) -> f32 {
    let eased = eased.clamp(0.0, 1.0) as f32;
    match (from_visible, to_visible) {
        (true, true) => full,
        (false, true) => full * eased,
        (true, false) => full * (1.0 - eased),
        (false, false) => 0.0,
    }
}
