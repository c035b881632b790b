use async_trait::async_trait;
use futures::stream::BoxStream;
use graphweave_query_plan::OperationKind;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::response::ExecutionResult;

/// A single request bound for one subgraph, borrowed from the fetch node
/// that produced it.
#[derive(Debug)]
pub struct SubgraphRequest<'a> {
    pub query: &'a str,
    pub operation_name: Option<&'a str>,
    pub operation_kind: OperationKind,
    pub variables: Option<Map<String, Value>>,
}

/// What a subgraph executor hands back: either a complete response or a
/// stream of them. Subscriptions produce streams; transports that deliver
/// regular responses incrementally may stream those too, in which case the
/// items are merged in arrival order.
pub enum SubgraphResponse {
    Single(ExecutionResult),
    Stream(BoxStream<'static, ExecutionResult>),
}

impl From<ExecutionResult> for SubgraphResponse {
    fn from(result: ExecutionResult) -> Self {
        SubgraphResponse::Single(result)
    }
}

#[async_trait]
pub trait SubgraphExecutor: Send + Sync {
    async fn execute(&self, request: SubgraphRequest<'_>) -> SubgraphResponse;
}

pub type SubgraphExecutorArc = Arc<dyn SubgraphExecutor>;

/// Adapts a plain function into an executor. Handy for in-process
/// subgraphs and tests.
pub struct FnSubgraphExecutor<F>(pub F);

#[async_trait]
impl<F> SubgraphExecutor for FnSubgraphExecutor<F>
where
    F: Fn(SubgraphRequest<'_>) -> SubgraphResponse + Send + Sync,
{
    async fn execute(&self, request: SubgraphRequest<'_>) -> SubgraphResponse {
        (self.0)(request)
    }
}
