use futures::future::BoxFuture;
use graphweave_query_plan::{FlattenNode, FlattenPathSegment};
use serde_json::Value;
use tracing::instrument;

use crate::context::ExecutionContext;
use crate::error::PlanExecutionError;
use crate::nodes::plan_node::ExecutablePlanNode;
use crate::response::ExecutionResult;

pub trait ExecutableFlattenNode {
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>>;
}

impl ExecutableFlattenNode for FlattenNode {
    #[instrument(level = "debug", skip_all, name = "FlattenNode::execute", fields(
        path = ?self.path,
    ))]
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>> {
        let mut new_path = path;
        new_path.extend(self.path.iter().cloned());
        self.node.execute(root, new_path, ctx)
    }
}
