//! Executes federated query plans against a set of subgraph executors.
//!
//! A [`QueryPlan`](graphweave_query_plan::QueryPlan) describes the fetches a
//! gateway must perform and how they compose. [`execute_query_plan`] walks
//! that plan, batches entity fetches, merges partial results, and projects
//! the merged data through the client operation into the final response.

use futures::stream::BoxStream;
use graphweave_query_plan::PlanNode;
use serde_json::Value;

pub mod context;
pub mod deep_merge;
pub mod error;
pub mod executors;
pub mod nodes;
pub mod projection;
pub mod requires;
pub mod response;
pub mod rewrites;
pub mod schema_metadata;
pub mod traverse;
pub mod variables;

#[cfg(test)]
mod tests;

pub use context::{build_execution_context, ExecutionContext, QueryPlanExecutionOptions};
pub use error::PlanExecutionError;
pub use executors::common::{
    SubgraphExecutor, SubgraphExecutorArc, SubgraphRequest, SubgraphResponse,
};
pub use executors::map::SubgraphExecutorMap;
pub use response::{ExecutionResult, GraphQLError};
pub use schema_metadata::{SchemaMetadata, SchemaWithMetadata};

use crate::nodes::plan_node::ExecutablePlanNode;
use crate::nodes::subscription_node::execute_subscription_stream;
use crate::projection::project_by_operation;

/// The outcome of executing a plan: a single response for queries and
/// mutations, or a stream of responses for subscriptions.
pub enum ExecutorOutput<'a> {
    Single(ExecutionResult),
    Stream(BoxStream<'a, ExecutionResult>),
}

/// Executes a query plan end to end. Returns `None` for an empty plan,
/// a single finalized result for queries and mutations, and a stream of
/// finalized results when the plan root is a subscription.
pub async fn execute_query_plan(
    options: QueryPlanExecutionOptions<'_>,
) -> Result<Option<ExecutorOutput<'_>>, PlanExecutionError> {
    let root_node = match &options.query_plan.node {
        Some(node) => node,
        None => return Ok(None),
    };
    let ctx = build_execution_context(
        options.document,
        options.operation_name,
        options.variables,
        options.schema_metadata,
        options.executors,
    )?;
    if let PlanNode::Subscription(subscription) = root_node {
        let stream = execute_subscription_stream(subscription, ctx).await?;
        return Ok(Some(ExecutorOutput::Stream(stream)));
    }
    let root = Value::Null;
    let result = root_node.execute(&root, Vec::new(), &ctx).await?;
    let finalized = finalize_result(&ctx, result)?;
    Ok(Some(ExecutorOutput::Single(finalized)))
}

/// Projects merged plan data through the client operation and normalizes
/// the result. Data is present only when the projected root object has at
/// least one key.
pub(crate) fn finalize_result(
    ctx: &ExecutionContext<'_>,
    result: ExecutionResult,
) -> Result<ExecutionResult, PlanExecutionError> {
    let mut errors = result.errors.unwrap_or_default();
    let data = match result.data {
        Some(data) if !data.is_null() => {
            match project_by_operation(&data, ctx, &mut errors)? {
                Value::Null => None,
                Value::Object(projected) if projected.is_empty() => None,
                projected => Some(projected),
            }
        }
        _ => None,
    };
    Ok(ExecutionResult::new(data, Some(errors), result.extensions))
}
