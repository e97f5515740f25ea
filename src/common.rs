//! Defines some common pieces used across the pipeline.

/// Defines some checker functions.
pub(crate) mod checker;

/// Defines the countdown latch and signal shared by worker pools.
pub mod latch;

/// Defines the progress sinks.
pub mod reporter;

pub use latch::{CountDownLatch, Signal};
pub use reporter::{
    Reporter,
    ConsoleReporter,
    LogReporter,
    SilentReporter,
};
