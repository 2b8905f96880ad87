//! Baton: streaming multi-agent orchestration.
//!
//! A run streams completions from a chat model for the active agent, folds
//! tool-call fragments into whole calls, executes them, and lets a tool call
//! hand the conversation to another agent by naming it in its arguments.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use baton::prelude::*;
//! use baton::transport::OpenAiTransport;
//!
//! # async fn example() -> baton::error::Result<()> {
//! let config = BatonConfig::load()?;
//! let directory = AgentDirectory::from_agents([
//!     Agent::simple("Engineer", "You write code."),
//!     Agent::simple("Designer", "You design interfaces."),
//! ])?;
//! let dispatcher = Dispatcher::handoffs_only(Arc::new(directory));
//! let orchestrator = Orchestrator::from_config(
//!     &config,
//!     Arc::new(OpenAiTransport::from_config(&config)?),
//!     Arc::new(dispatcher),
//! );
//!
//! let handle = orchestrator
//!     .run(RunRequest::new("Engineer", vec![Message::user("hello")]))
//!     .await?;
//! let response = handle.response().await?;
//! println!("{}: {:?}", response.agent.name, response.last_text());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod stream;
pub mod tools;
pub mod transport;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
