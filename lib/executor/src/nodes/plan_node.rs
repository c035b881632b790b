use futures::future::BoxFuture;
use graphweave_query_plan::{FlattenPathSegment, PlanNode};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::PlanExecutionError;
use crate::nodes::condition_node::ExecutableConditionNode;
use crate::nodes::fetch_node::ExecutableFetchNode;
use crate::nodes::flatten_node::ExecutableFlattenNode;
use crate::nodes::parallel_node::ExecutableParallelNode;
use crate::nodes::sequence_node::ExecutableSequenceNode;
use crate::response::ExecutionResult;

/// One step of plan interpretation. `root` is the data accumulated so far,
/// `path` is the flatten path leading to this node (empty at the top of the
/// plan), and the returned result is a patch the caller deep-merges onto its
/// own accumulated data.
pub trait ExecutablePlanNode {
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>>;
}

impl ExecutablePlanNode for PlanNode {
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>> {
        match self {
            PlanNode::Fetch(node) => node.execute(root, path, ctx),
            PlanNode::Flatten(node) => node.execute(root, path, ctx),
            PlanNode::Parallel(node) => node.execute(root, path, ctx),
            PlanNode::Sequence(node) => node.execute(root, path, ctx),
            PlanNode::Condition(node) => node.execute(root, path, ctx),
            // A subscription node below the plan root degenerates into its
            // primary; streaming only happens at the root.
            PlanNode::Subscription(node) => node.primary.execute(root, path, ctx),
        }
    }
}
