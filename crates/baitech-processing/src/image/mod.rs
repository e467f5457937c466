//! Pixel-level image operations
//!
//! - Flattening transparent or palette images onto white (flatten)
//! - Aspect-preserving, non-upscaling downscale into a bounding box (resize)

pub mod flatten;
pub mod resize;

pub use flatten::flatten_onto_white;
pub use resize::{fit_within, target_dimensions};
