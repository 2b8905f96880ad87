//! Run engine: the turn loop that drives agents, tools and handoffs.

pub mod events;
mod llm_phase;
pub mod runner;
mod tool_phase;
pub mod types;

pub use events::*;
pub use runner::*;
pub use types::*;
