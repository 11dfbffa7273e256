pub mod clip;
pub mod driver;
pub mod fft;
pub mod geometry;
pub mod pass;

pub use clip::ClipStats;
pub use driver::{CHUNK_MAX, convolve, convolve_with_chunk};
pub use pass::run_pass;
