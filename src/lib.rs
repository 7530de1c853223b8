pub mod core;
pub mod model;
pub mod monte_carlo;

// Re-export commonly used types
pub use crate::core::error::SimError;
pub use crate::core::process::{Context, Directive, Process, ProcessRuntime, Wake};
pub use crate::core::resources::ResourcePool;
pub use crate::core::scheduler::EventScheduler;
pub use crate::core::types::{ProcessId, ResourceId, SimTime};
pub use crate::model::config::SupermarketConfig;
pub use crate::model::supermarket::SupermarketModel;
pub use crate::monte_carlo::{
    simulate, simulate_with_mode, ConcurrencyMode, ReplicationResult, SimulationSummary, Statistic,
};
