//! Numerical analysis of waveform captures

pub mod normalize;
pub mod stockwell;

pub use normalize::normalize;
pub use stockwell::{modified_stockwell_transform, MstResult};
