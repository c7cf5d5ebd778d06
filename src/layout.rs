use std::f64::consts::TAU;

/// Angular (`x0..x1`, radians) and radial (`y0..y1`, rings) bounds of one arc.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Extent {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl Extent {
    pub const fn new(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub fn angular_span(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn mid_angle(&self) -> f64 {
        (self.x0 + self.x1) * 0.5
    }

    pub fn mid_radius(&self) -> f64 {
        (self.y0 + self.y1) * 0.5
    }

    pub fn contains(&self, angle: f64, radius: f64) -> bool {
        angle >= self.x0 && angle < self.x1 && radius >= self.y0 && radius < self.y1
    }

    pub fn approx_eq(&self, other: &Extent, tolerance: f64) -> bool {
        (self.x0 - other.x0).abs() <= tolerance
            && (self.x1 - other.x1).abs() <= tolerance
            && (self.y0 - other.y0).abs() <= tolerance
            && (self.y1 - other.y1).abs() <= tolerance
    }
}

/// Splits `parent`'s angular span between children proportionally to `weights`,
/// one ring further out. The last child always closes exactly on `parent.x1`.
pub fn partition_children(parent: Extent, weights: &[f64]) -> Vec<Extent> {
    let total = weights.iter().sum::<f64>();
    let span = parent.angular_span();
    let y0 = parent.y1;
    let y1 = parent.y1 + 1.0;

    let mut extents = Vec::with_capacity(weights.len());
    let mut cursor = parent.x0;
    let mut accumulated = 0.0;
    for (index, weight) in weights.iter().enumerate() {
        accumulated += weight;
        let x1 = if index + 1 == weights.len() {
            parent.x1
        } else if total > 0.0 {
            parent.x0 + span * (accumulated / total)
        } else {
            parent.x0
        };
        extents.push(Extent::new(cursor, x1.max(cursor), y0, y1));
        cursor = x1.max(cursor);
    }
    extents
}

pub fn root_extent() -> Extent {
    Extent::new(0.0, TAU, 0.0, 1.0)
}

/// Re-expresses `node` as if `focus` were the root of the layout.
pub fn relative_to(node: Extent, focus: Extent, focus_depth: usize) -> Extent {
    let span = focus.angular_span();
    let depth = focus_depth as f64;
    let scale = |x: f64| {
        if span <= f64::EPSILON {
            return 0.0;
        }
        ((x - focus.x0) / span).clamp(0.0, 1.0) * TAU
    };

    Extent {
        x0: scale(node.x0),
        x1: scale(node.x1),
        y0: (node.y0 - depth).max(0.0),
        y1: (node.y1 - depth).max(0.0),
    }
}

pub fn interpolate(from: Extent, to: Extent, t: f64) -> Extent {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: f64, b: f64| a + (b - a) * t;
    Extent {
        x0: lerp(from.x0, to.x0),
        x1: lerp(from.x1, to.x1),
        y0: lerp(from.y0, to.y0),
        y1: lerp(from.y1, to.y1),
    }
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}
