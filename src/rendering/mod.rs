//! Rendering helpers for the static backend

pub mod layout;

pub use layout::{count_slides, measure_slide};
