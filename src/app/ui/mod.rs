mod controls;
pub(super) mod details;
mod panels;
