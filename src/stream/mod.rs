//! Stream accumulation.

pub mod accumulator;

pub use accumulator::{AccumulatedTurn, DeltaAccumulator};
