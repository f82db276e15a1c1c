use shepherd_types::ToolKind;

/// Map a registered tool name to its budget classification.
///
/// Unknown tool names classify as [`ToolKind::Other`] — classification
/// gates budget accounting, not registry dispatch, so an unrecognized name
/// simply gets no special cap.
pub fn classify_tool(tool_name: &str) -> ToolKind {
    match tool_name {
        "read_file" | "list_dir" => ToolKind::Read,
        "write_file" => ToolKind::Write,
        _ => ToolKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_tools() {
        assert_eq!(classify_tool("read_file"), ToolKind::Read);
        assert_eq!(classify_tool("list_dir"), ToolKind::Read);
        assert_eq!(classify_tool("write_file"), ToolKind::Write);
        assert_eq!(classify_tool("calculator"), ToolKind::Other);
        assert_eq!(classify_tool("run_cmd"), ToolKind::Other);
    }

    #[test]
    fn unknown_tool_classifies_as_other() {
        assert_eq!(classify_tool("totally_unknown"), ToolKind::Other);
    }
}
