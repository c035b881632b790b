use std::collections::HashMap;

use graphql_parser::query::{
    Definition, Document, FragmentDefinition, OperationDefinition, SelectionSet,
    VariableDefinition,
};
use graphweave_query_plan::{OperationKind, QueryPlan};
use serde_json::{Map, Value};

use crate::error::PlanExecutionError;
use crate::executors::map::SubgraphExecutorMap;
use crate::schema_metadata::SchemaMetadata;
use crate::variables::collect_variable_values;

/// Everything a plan execution needs, assembled once per request.
pub struct QueryPlanExecutionOptions<'a> {
    pub query_plan: &'a QueryPlan,
    pub document: &'a Document<'static, String>,
    pub operation_name: Option<&'a str>,
    pub variables: Option<Map<String, Value>>,
    pub schema_metadata: &'a SchemaMetadata,
    pub executors: &'a SubgraphExecutorMap,
}

/// Shared, read-only state threaded through node execution. Data and errors
/// accumulate in the results nodes return, not here, so parallel branches
/// can share the context freely.
pub struct ExecutionContext<'a> {
    pub schema_metadata: &'a SchemaMetadata,
    pub executors: &'a SubgraphExecutorMap,
    pub operation: &'a OperationDefinition<'static, String>,
    pub fragments: HashMap<&'a str, &'a FragmentDefinition<'static, String>>,
    pub variable_values: Option<Map<String, Value>>,
}

impl<'a> ExecutionContext<'a> {
    /// Looks up the runtime value of a condition variable.
    pub fn condition_variable(&self, variable_name: &str) -> Option<&Value> {
        self.variable_values
            .as_ref()
            .and_then(|variables| variables.get(variable_name))
    }
}

pub fn build_execution_context<'a>(
    document: &'a Document<'static, String>,
    operation_name: Option<&str>,
    variables: Option<Map<String, Value>>,
    schema_metadata: &'a SchemaMetadata,
    executors: &'a SubgraphExecutorMap,
) -> Result<ExecutionContext<'a>, PlanExecutionError> {
    let operation = select_operation(document, operation_name)?;
    let mut fragments = HashMap::new();
    for definition in &document.definitions {
        if let Definition::Fragment(fragment) = definition {
            fragments.insert(fragment.name.as_str(), fragment);
        }
    }
    let variable_values = collect_variable_values(
        operation_variable_definitions(operation),
        variables,
        schema_metadata,
    )?;
    Ok(ExecutionContext {
        schema_metadata,
        executors,
        operation,
        fragments,
        variable_values,
    })
}

fn select_operation<'a>(
    document: &'a Document<'static, String>,
    operation_name: Option<&str>,
) -> Result<&'a OperationDefinition<'static, String>, PlanExecutionError> {
    let mut operations = document.definitions.iter().filter_map(|definition| {
        match definition {
            Definition::Operation(operation) => Some(operation),
            Definition::Fragment(_) => None,
        }
    });
    match operation_name {
        Some(name) => operations
            .find(|operation| operation_name_of(operation) == Some(name))
            .ok_or_else(|| PlanExecutionError::UnknownOperation(name.to_string())),
        None => {
            let first = operations.next().ok_or(PlanExecutionError::OperationMissing)?;
            if operations.next().is_some() {
                return Err(PlanExecutionError::AmbiguousOperation);
            }
            Ok(first)
        }
    }
}

pub fn operation_name_of<'a>(
    operation: &'a OperationDefinition<'static, String>,
) -> Option<&'a str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref(),
    }
}

pub fn operation_kind_of(operation: &OperationDefinition<'static, String>) -> OperationKind {
    match operation {
        OperationDefinition::SelectionSet(_) | OperationDefinition::Query(_) => {
            OperationKind::Query
        }
        OperationDefinition::Mutation(_) => OperationKind::Mutation,
        OperationDefinition::Subscription(_) => OperationKind::Subscription,
    }
}

pub fn operation_selection_set<'a>(
    operation: &'a OperationDefinition<'static, String>,
) -> &'a SelectionSet<'static, String> {
    match operation {
        OperationDefinition::SelectionSet(selection_set) => selection_set,
        OperationDefinition::Query(query) => &query.selection_set,
        OperationDefinition::Mutation(mutation) => &mutation.selection_set,
        OperationDefinition::Subscription(subscription) => &subscription.selection_set,
    }
}

pub fn operation_variable_definitions<'a>(
    operation: &'a OperationDefinition<'static, String>,
) -> &'a [VariableDefinition<'static, String>] {
    match operation {
        OperationDefinition::SelectionSet(_) => &[],
        OperationDefinition::Query(query) => &query.variable_definitions,
        OperationDefinition::Mutation(mutation) => &mutation.variable_definitions,
        OperationDefinition::Subscription(subscription) => &subscription.variable_definitions,
    }
}
