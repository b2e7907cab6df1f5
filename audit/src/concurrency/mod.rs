//! Coordination primitives for the pipeline workers.

pub mod gate;
pub mod queue;
pub mod shutdown;
