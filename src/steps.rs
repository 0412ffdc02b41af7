//! Work-step scheduling: dependency resolution, build-queue ordering and
//! accumulation of generated subplans.

pub mod dependency;
pub mod merge;
pub mod queue;

pub use dependency::{resolve, DependencyMap};
pub use merge::SubplanMerger;
pub use queue::{schedule, BuildPlan, BuildQueue};
