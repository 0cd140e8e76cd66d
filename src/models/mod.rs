pub mod crop;
pub mod prediction;
pub mod schedule;
pub mod water;

pub use crop::*;
pub use prediction::*;
pub use schedule::*;
pub use water::*;
