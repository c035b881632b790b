use futures::future::BoxFuture;
use graphweave_query_plan::{FlattenPathSegment, SequenceNode};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::context::ExecutionContext;
use crate::deep_merge::deep_merge;
use crate::error::PlanExecutionError;
use crate::nodes::plan_node::ExecutablePlanNode;
use crate::response::ExecutionResult;

pub trait ExecutableSequenceNode {
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>>;
}

impl ExecutableSequenceNode for SequenceNode {
    #[instrument(level = "debug", skip_all, name = "SequenceNode::execute", fields(
        nodes_count = %self.nodes.len(),
    ))]
    fn execute<'a>(
        &'a self,
        root: &'a Value,
        path: Vec<FlattenPathSegment>,
        ctx: &'a ExecutionContext<'_>,
    ) -> BoxFuture<'a, Result<ExecutionResult, PlanExecutionError>> {
        Box::pin(async move {
            // Each child observes the data written by all earlier children,
            // so the sequence threads its own accumulated copy.
            let mut data = root.clone();
            let mut errors = vec![];
            let mut extensions = Map::new();
            for node in &self.nodes {
                let node_result = node.execute(&data, path.clone(), ctx).await?;
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
