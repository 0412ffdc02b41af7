//! Property tests for ordering, merging, mapping and the repair bound

pub mod mapping;
pub mod merging;
pub mod scheduling;
