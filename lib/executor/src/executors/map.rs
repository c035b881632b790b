use std::collections::HashMap;
use std::sync::Arc;

use tracing::{instrument, warn};

use crate::executors::common::{
    FnSubgraphExecutor, SubgraphExecutor, SubgraphExecutorArc, SubgraphRequest, SubgraphResponse,
};
use crate::response::ExecutionResult;

/// Registry of subgraph executors keyed by service name.
#[derive(Default)]
pub struct SubgraphExecutorMap {
    inner: HashMap<String, SubgraphExecutorArc>,
}

impl SubgraphExecutorMap {
    pub fn new() -> Self {
        SubgraphExecutorMap::default()
    }

    pub fn insert(
        &mut self,
        subgraph_name: impl Into<String>,
        executor: impl SubgraphExecutor + 'static,
    ) {
        self.insert_arc(subgraph_name, Arc::new(executor));
    }

    pub fn insert_arc(&mut self, subgraph_name: impl Into<String>, executor: SubgraphExecutorArc) {
        self.inner.insert(subgraph_name.into(), executor);
    }

    /// Registers a plain function as the executor for a subgraph.
    pub fn insert_fn<F>(&mut self, subgraph_name: impl Into<String>, executor_fn: F)
    where
        F: Fn(SubgraphRequest<'_>) -> SubgraphResponse + Send + Sync + 'static,
    {
        self.insert(subgraph_name, FnSubgraphExecutor(executor_fn));
    }

    /// Dispatches a request to the named subgraph. A missing executor is not
    /// fatal to the whole plan; it degrades into an error response for this
    /// one fetch.
    #[instrument(level = "trace", name = "subgraph_execute", skip_all, fields(subgraph_name = %subgraph_name))]
    pub async fn execute(
        &self,
        subgraph_name: &str,
        request: SubgraphRequest<'_>,
    ) -> SubgraphResponse {
        match self.inner.get(subgraph_name) {
            Some(executor) => executor.execute(request).await,
            None => {
                warn!("subgraph executor not found for subgraph: {}", subgraph_name);
                SubgraphResponse::Single(ExecutionResult::from_error_message(format!(
                    "Subgraph executor not found for subgraph: {}",
                    subgraph_name
                )))
            }
        }
    }
}
