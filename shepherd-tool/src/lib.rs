#![deny(missing_docs)]
//! The five side-effecting tools the shepherd scheduler may invoke, and the
//! registry that dispatches to them.
//!
//! Every tool call funnels through [`ToolRegistry::execute`], which never
//! lets an error escape: success, expected failure, and thrown exceptions
//! all become a [`shepherd_types::ToolResult`].

mod registry;
mod tools;

pub use registry::{ToolContext, ToolDyn, ToolError, ToolRegistry};
pub use tools::{CalculatorTool, ListDirTool, ReadFileTool, RunCmdTool, WriteFileTool};

use shepherd_policy::PolicyEngine;
use std::sync::Arc;

/// Build the standard registry: `read_file`, `list_dir`, `write_file`,
/// `calculator`, `run_cmd`, all sharing the given policy engine.
pub fn default_registry(policy: Arc<PolicyEngine>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ReadFileTool::new(policy.clone())));
    registry.register(Arc::new(ListDirTool::new(policy.clone())));
    registry.register(Arc::new(WriteFileTool::new(policy.clone())));
    registry.register(Arc::new(CalculatorTool));
    registry.register(Arc::new(RunCmdTool::new(policy)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_five_tools() {
        let dir = tempfile::tempdir().unwrap();
        let policy = Arc::new(PolicyEngine::with_default_config(dir.path()));
        let registry = default_registry(policy);
        assert_eq!(registry.len(), 5);
        for name in ["read_file", "list_dir", "write_file", "calculator", "run_cmd"] {
            assert!(registry.get(name).is_some(), "missing tool: {name}");
        }
    }
}
