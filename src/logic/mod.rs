pub mod dispatcher;
pub mod engine;
pub mod threshold;
pub mod water;

pub use dispatcher::Dispatcher;
pub use engine::{DecisionEngine, Outcome};
pub use threshold::needs_irrigation;
pub use water::compute_water_requirement;
