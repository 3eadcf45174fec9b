//! Cells and cell buffers.

pub mod buffer;
pub mod texel;

pub use buffer::PointBuffer;
pub use texel::Color;
pub use texel::Texel;
