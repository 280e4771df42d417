//! Request orchestration: identity, retrieval, prompt assembly, generation, and persistence.

mod service;
pub mod types;

pub use service::{PlanningApi, PlanningService};
pub use types::{GeneratedPlan, InitError, PlanRecord, PlanRequest, PlanningError};
