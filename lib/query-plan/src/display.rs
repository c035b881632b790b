use std::fmt::{Display, Formatter as FmtFormatter, Result as FmtResult};

use crate::nodes::{FetchNode, FlattenNode, PlanNode, QueryPlan};

pub(crate) fn get_indent(depth: usize) -> String {
    "  ".repeat(depth)
}

pub trait PrettyDisplay {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult;
}

impl Display for QueryPlan {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        self.pretty_fmt(f, 0)
    }
}

impl Display for PlanNode {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        self.pretty_fmt(f, 0)
    }
}

impl PrettyDisplay for QueryPlan {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        writeln!(f, "{indent}QueryPlan {{")?;
        if let Some(node) = &self.node {
            node.pretty_fmt(f, depth + 1)?;
        }
        writeln!(f, "{indent}}},")?;
        Ok(())
    }
}

impl PrettyDisplay for FetchNode {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        writeln!(f, "{indent}Fetch(service: \"{}\") {{", self.service_name)?;
        for line in self.operation.lines() {
            writeln!(f, "{indent}  {line}")?;
        }
        writeln!(f, "{indent}}},")?;
        Ok(())
    }
}

impl PrettyDisplay for FlattenNode {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        writeln!(
            f,
            "{indent}Flatten(path: \"{}\") {{",
            self.path
                .iter()
                .map(|segment| segment.to_string())
                .collect::<Vec<String>>()
                .join(".")
        )?;
        self.node.pretty_fmt(f, depth + 1)?;
        writeln!(f, "{indent}}},")?;
        Ok(())
    }
}

impl PrettyDisplay for PlanNode {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        match self {
            PlanNode::Fetch(node) => node.pretty_fmt(f, depth),
            PlanNode::Flatten(node) => node.pretty_fmt(f, depth),
            PlanNode::Sequence(node) => pretty_fmt_list(f, depth, "Sequence", &node.nodes),
            PlanNode::Parallel(node) => pretty_fmt_list(f, depth, "Parallel", &node.nodes),
            PlanNode::Condition(node) => {
                let indent = get_indent(depth);
                writeln!(f, "{indent}Condition(if: ${}) {{", node.condition)?;
                if let Some(if_clause) = &node.if_clause {
                    if_clause.pretty_fmt(f, depth + 1)?;
                }
                if let Some(else_clause) = &node.else_clause {
                    writeln!(f, "{indent}}} else {{")?;
                    else_clause.pretty_fmt(f, depth + 1)?;
                }
                writeln!(f, "{indent}}},")?;
                Ok(())
            }
            PlanNode::Subscription(node) => {
                let indent = get_indent(depth);
                writeln!(f, "{indent}Subscription {{")?;
                node.primary.pretty_fmt(f, depth + 1)?;
                writeln!(f, "{indent}}},")?;
                Ok(())
            }
        }
    }
}

fn pretty_fmt_list(
    f: &mut FmtFormatter<'_>,
    depth: usize,
    variant: &str,
    nodes: &[PlanNode],
) -> FmtResult {
    let indent = get_indent(depth);
    writeln!(f, "{indent}{variant} {{")?;
    for node in nodes {
        node.pretty_fmt(f, depth + 1)?;
    }
    writeln!(f, "{indent}}},")?;
    Ok(())
}
