//! Tool declaration mapping.

use crate::providers::types::{CoreTool, ToolDeclaration, ToolSet};

/// Build the name-keyed tool set handed to the provider.
///
/// A later declaration with an already-seen name replaces the earlier one in
/// place. Returns `None` for an absent or empty tool list so providers that
/// distinguish "no tools" from "empty tool set" see the former.
pub fn build_tool_set(tools: Option<&[ToolDeclaration]>) -> Option<ToolSet> {
    let mut set = ToolSet::new();
    for tool in tools.unwrap_or_default() {
        set.insert(
            tool.name.clone(),
            CoreTool {
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        );
    }

    if set.is_empty() { None } else { Some(set) }
}
