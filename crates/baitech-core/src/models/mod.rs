//! Data models shared by the image pipeline and the identifier generator.

mod identifier;
mod image;

pub use identifier::*;
pub use image::*;
