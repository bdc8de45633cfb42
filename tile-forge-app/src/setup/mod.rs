//! Run setup and execution.

pub mod execution;
