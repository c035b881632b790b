use serde::{Deserialize, Serialize};

use crate::path::{FlattenPathSegment, RewritePathSegment};
use crate::selection::SelectionNode;

/// A precomputed query plan: a tree with a single optional root node.
/// Produced by an external planner and consumed read-only for the duration
/// of one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryPlan {
    #[serde(default)]
    pub node: Option<PlanNode>,
}

/// The closed set of plan node kinds. Plans arrive as JSON tagged by `kind`;
/// an unrecognized tag fails deserialization instead of surfacing as a
/// runtime fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlanNode {
    Sequence(SequenceNode),
    Parallel(ParallelNode),
    Fetch(FetchNode),
    Flatten(FlattenNode),
    Condition(ConditionNode),
    Subscription(SubscriptionNode),
}

/// Children execute in order; each must fully settle before the next starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceNode {
    pub nodes: Vec<PlanNode>,
}

/// Children have no ordering dependency and may execute concurrently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelNode {
    pub nodes: Vec<PlanNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchNode {
    pub service_name: String,
    /// The operation document sent to the subgraph, as a string.
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub operation_kind: OperationKind,
    /// Names of outer-query variables this fetch consumes.
    #[serde(default)]
    pub variable_usages: Vec<String>,
    /// Selection describing what must be present on each entity before this
    /// fetch may run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<SelectionNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_rewrites: Option<Vec<FetchRewrite>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_rewrites: Option<Vec<FetchRewrite>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    #[default]
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
            OperationKind::Subscription => "subscription",
        }
    }
}

/// Projects a list-shaped path in the accumulated data into a flat batch of
/// entities for the child node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenNode {
    pub path: Vec<FlattenPathSegment>,
    pub node: Box<PlanNode>,
}

/// Exactly one branch executes, chosen by a boolean variable. Neither branch
/// executing is a valid outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionNode {
    pub condition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_clause: Option<Box<PlanNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub else_clause: Option<Box<PlanNode>>,
}

/// Wraps the primary node of a subscription plan; its result stream is passed
/// through without buffering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionNode {
    pub primary: Box<PlanNode>,
}

/// Rewrite instructions applied to entity representations before a fetch
/// (`input_rewrites`) or to fetched data after it (`output_rewrites`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FetchRewrite {
    ValueSetter(ValueSetter),
    KeyRenamer(KeyRenamer),
}

/// Walks `path` through a value and replaces the value at the tail with a
/// constant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSetter {
    pub path: Vec<RewritePathSegment>,
    pub set_value_to: serde_json::Value,
}

/// Same traversal, but the tail operation renames a key in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRenamer {
    pub path: Vec<RewritePathSegment>,
    pub rename_key_to: String,
}
