use futures::future::{join_all, BoxFuture};
use graphweave_query_plan::{FlattenPathSegment, ParallelNode};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::context::ExecutionContext;
use crate::deep_merge::deep_merge;
use crate::error::PlanExecutionError;
use crate::nodes::plan_node::ExecutablePlanNode;
use crate::response::ExecutionResult;

pub trait ExecutableParallelNode {
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>>;
}

impl ExecutableParallelNode for ParallelNode {
    #[instrument(level = "debug", skip_all, name = "ParallelNode::execute", fields(
        nodes_count = %self.nodes.len(),
    ))]
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>> {
        Box::pin(async move {
            // Children all observe the same snapshot of the data and run
            // concurrently. Patches merge in declaration order so that even
            // overlapping writes (which the planner is supposed to rule
            // out) resolve deterministically.
            let node_results = join_all(
                self.nodes
                    .iter()
                    .map(|node| node.execute(root, path.clone(), ctx)),
            )
            .await;
            let mut data = Value::Null;
            let mut errors = vec![];
            let mut extensions = Map::new();
            for node_result in node_results {
                let node_result = node_result?;
                if let Some(node_data) = node_result.data {
                    deep_merge(&mut data, node_data);
                }
                if let Some(node_errors) = node_result.errors {
                    errors.extend(node_errors);
                }
                if let Some(node_extensions) = node_result.extensions {
                    extensions.extend(node_extensions);
                }
            }
            Ok(ExecutionResult::new(
                Some(data),
                Some(errors),
                Some(extensions),
            ))
        })
    }
}
