pub mod noise;
pub mod vco;

pub use noise::Noise;
pub use vco::Vco;
