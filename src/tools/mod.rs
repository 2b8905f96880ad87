//! Tool declarations, argument decoding and dispatch.

pub mod arguments;
pub mod dispatcher;
pub mod tool;
pub mod types;

pub use arguments::ToolArguments;
pub use dispatcher::{Dispatch, Dispatcher, ToolHandler, ToolRegistry};
pub use tool::{FunctionTool, Tool, ToolContext, ToolOutput};
pub use types::{ParameterBuilder, ToolDeclaration, ToolParameters};
