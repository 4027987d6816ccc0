pub mod adsr;
pub mod lfo;

pub use adsr::Adsr;
pub use lfo::Lfo;
