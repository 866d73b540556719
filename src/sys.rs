pub mod geometry;
pub mod host;
