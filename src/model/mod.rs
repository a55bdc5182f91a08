//! Quality-model graph boundary
//!
//! The verifier sees a quality model only through two capabilities:
//! [`GraphBuilder::build_graph`] distills a fresh graph of factor and
//! finding nodes, and [`QualityGraph::evaluate`] computes a factor's exact
//! value. [`DensityModel`] is the built-in implementation; tests plug in
//! scripted graphs.

mod density;
mod finding;

pub use density::{DensityGraph, DensityModel, FactorDefinition, ModelDefinition, RuleDefinition};
pub use finding::{Finding, FindingNode};

use crate::error::Result;
use crate::tree::CodeTree;
use rust_decimal::Decimal;

/// A distilled quality-model graph
pub trait QualityGraph {
    /// Finding nodes in a stable order
    fn finding_nodes(&self) -> Vec<&FindingNode>;

    /// Finding node for `rule`, if the graph has one
    fn finding_node_mut(&mut self, rule: &str) -> Option<&mut FindingNode>;

    /// True if a factor node's name matches `name` case-insensitively
    fn has_factor(&self, name: &str) -> bool;

    /// Exact value of the factor named `aspect`
    ///
    /// Fails with `AspectNotFound` when no factor matches.
    fn evaluate(&self, aspect: &str, tree: &CodeTree) -> Result<Decimal>;

    /// Rule names of every finding node
    fn finding_rules(&self) -> Vec<String> {
        self.finding_nodes()
            .iter()
            .map(|node| node.rule_name().to_string())
            .collect()
    }

    /// Total findings attached across all finding nodes
    fn finding_count(&self) -> usize {
        self.finding_nodes().iter().map(|node| node.len()).sum()
    }
}

/// Distills fresh graphs from a quality model
pub trait GraphBuilder {
    type Graph: QualityGraph;

    fn build_graph(&self) -> Result<Self::Graph>;
}
