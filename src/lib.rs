//! Radial focus+context navigation over a weighted tree.
//!
//! [`engine::Sunburst`] owns a laid-out [`hierarchy::Hierarchy`], the current
//! focus, the open detail selection and a background refresh pipeline fed by a
//! [`tree::TreeSource`]. Rendering backends only read extents and appearances
//! and forward clicks, navigation requests and frame ticks.

pub mod engine;
pub mod error;
pub mod hierarchy;
pub mod label;
pub mod layout;
pub mod tree;
pub mod util;
pub mod visibility;

pub use engine::{Sunburst, SunburstConfig, SunburstEvent};
pub use error::SunburstError;
