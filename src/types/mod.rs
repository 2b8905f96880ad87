//! Core types for baton.

pub mod context;
pub mod generation;
pub mod message;
pub mod stream;

pub use context::*;
pub use generation::*;
pub use message::*;
pub use stream::*;
