//! Agent personas, the directory that holds them, and handoff tools.

pub mod agent;
pub mod directory;
pub mod handoff;

pub use agent::{Agent, DEFAULT_MODEL};
pub use directory::AgentDirectory;
pub use handoff::{handoff_tool, HandoffPolicy, HANDOFF_ARGUMENT};
