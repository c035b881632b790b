pub mod display;
pub mod nodes;
pub mod path;
pub mod selection;

pub use nodes::{
    ConditionNode, FetchNode, FetchRewrite, FlattenNode, KeyRenamer, OperationKind, PlanNode,
    QueryPlan, SequenceNode, ParallelNode, SubscriptionNode, ValueSetter,
};
pub use path::{FlattenPathSegment, RewritePathSegment};
pub use selection::{FieldSelection, InlineFragmentSelection, SelectionNode};
