use futures::stream::BoxStream;
use futures::StreamExt;
use graphweave_query_plan::{FetchNode, PlanNode, SubscriptionNode};
use tracing::instrument;

use crate::context::ExecutionContext;
use crate::error::PlanExecutionError;
use crate::executors::common::{SubgraphRequest, SubgraphResponse};
use crate::nodes::fetch_node::{error_anchor, ExecutableFetchNode};
use crate::response::{relocate_subgraph_errors, ExecutionResult};
use crate::rewrites::ApplyFetchRewrite;

pub trait ExecutableSubscriptionNode {
    /// The fetch that opens the subscription. Anything else at the primary
    /// position is a malformed plan.
    fn primary_fetch(&self) -> Result<&FetchNode, PlanExecutionError>;
}

impl ExecutableSubscriptionNode for SubscriptionNode {
    fn primary_fetch(&self) -> Result<&FetchNode, PlanExecutionError> {
        match self.primary.as_ref() {
            PlanNode::Fetch(fetch) => Ok(fetch),
            _ => Err(PlanExecutionError::InvalidSubscriptionRoot),
        }
    }
}

/// Opens the subscription against the primary fetch's subgraph and yields one
/// finalized result per source event. The stream owns the execution context
/// so it can outlive the call that created it.
#[instrument(level = "debug", skip_all, name = "SubscriptionNode::execute")]
pub async fn execute_subscription_stream<'a>(
    node: &'a SubscriptionNode,
    ctx: ExecutionContext<'a>,
) -> Result<BoxStream<'a, ExecutionResult>, PlanExecutionError> {
    let fetch = node.primary_fetch()?;
    let variables = fetch.variables_from_usages(&ctx);
    let request = SubgraphRequest {
        query: &fetch.operation,
        operation_name: fetch.operation_name.as_deref(),
        operation_kind: fetch.operation_kind,
        variables: if variables.is_empty() {
            None
        } else {
            Some(variables)
        },
    };
    let response = ctx.executors.execute(&fetch.service_name, request).await;
    let source = match response {
        SubgraphResponse::Stream(stream) => stream,
        SubgraphResponse::Single(result) => futures::stream::once(async move { result }).boxed(),
    };
    let stream = async_stream::stream! {
        let mut source = source;
        while let Some(event) = source.next().await {
            yield finalize_subscription_event(&ctx, fetch, event);
        }
    };
    Ok(Box::pin(stream))
}

fn finalize_subscription_event(
    ctx: &ExecutionContext<'_>,
    fetch: &FetchNode,
    mut event: ExecutionResult,
) -> ExecutionResult {
    if let (Some(output_rewrites), Some(data)) = (&fetch.output_rewrites, event.data.as_mut()) {
        for rewrite in output_rewrites {
            rewrite.apply(ctx.schema_metadata, data);
        }
    }
    if let Some(errors) = event.errors.take() {
        event.errors = Some(relocate_subgraph_errors(
            errors,
            &[],
            None,
            &error_anchor(&fetch.operation),
        ));
    }
    match crate::finalize_result(ctx, event) {
        Ok(result) => result,
        Err(error) => ExecutionResult::from_error_message(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use graphweave_query_plan::SequenceNode;

    use super::*;

    #[test]
    fn rejects_a_non_fetch_primary() {
        let node = SubscriptionNode {
            primary: Box::new(PlanNode::Sequence(SequenceNode { nodes: vec![] })),
        };
        assert!(matches!(
            node.primary_fetch(),
            Err(PlanExecutionError::InvalidSubscriptionRoot)
        ));
    }
}
