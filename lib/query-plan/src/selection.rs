use serde::{Deserialize, Serialize};

/// The selection shape of a fetch node's `requires` clause. Unlike a full
/// GraphQL selection set this carries no directives and no fragment spreads;
/// the planner always inlines fragments before emitting a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SelectionNode {
    Field(FieldSelection),
    InlineFragment(InlineFragmentSelection),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSelection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selections: Option<Vec<SelectionNode>>,
}

impl FieldSelection {
    /// The key this selection reads from / writes to in response data.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineFragmentSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_condition: Option<String>,
    pub selections: Vec<SelectionNode>,
}
