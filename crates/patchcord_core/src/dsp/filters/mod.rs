pub mod svf;

pub use svf::Svf;
