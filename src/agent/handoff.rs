//! Synthetic handoff tools.

use crate::tools::{ToolDeclaration, ToolParameters};

/// Argument carrying the target agent of a generated handoff tool.
pub const HANDOFF_ARGUMENT: &str = "agentID";

/// Which directory members get a handoff tool on each agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffPolicy {
    /// One tool per other agent.
    #[default]
    Others,
    /// One tool per agent, including the agent itself.
    All,
}

/// Build the tool that transfers control to `target`.
pub fn handoff_tool(target: &str) -> ToolDeclaration {
    ToolDeclaration::new(
        target,
        format!("transfer to {target}"),
        ToolParameters::object()
            .string_enum(
                HANDOFF_ARGUMENT,
                format!("must be \"{target}\""),
                &[target],
                true,
            )
            .build(),
    )
}
