//! Built-in finding-density quality model
//!
//! A factor's value is the product of its child factors' values, scaled by
//! `max(0, 1 - Σ weight(rule) × findings(rule) × 1000 / project LOC)` over
//! the rules it owns. All arithmetic is exact decimal, so a graph with no
//! findings evaluates every factor to exactly 1.
//!
//! # Example model
//!
//! ```toml
//! [[factor]]
//! name = "Reliability"
//! findings = ["NullDereference"]
//!
//! [[rule]]
//! name = "NullDereference"
//! weight = 0.08
//! ```

use super::{FindingNode, GraphBuilder, QualityGraph};
use crate::error::{Result, VerifierError};
use crate::tree::{CodeTree, Metric};
use anyhow::Context;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const DEFAULT_MODEL: &str = include_str!("../../models/default-model.toml");

/// Factor entry of a model file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct FactorDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Child factor names
    #[serde(default)]
    pub factors: Vec<String>,
    /// Rule names whose findings lower this factor
    #[serde(default)]
    pub findings: Vec<String>,
}

/// Rule entry of a model file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RuleDefinition {
    pub name: String,
    /// Value lost per finding per thousand lines
    pub weight: f64,
}

/// Parsed model file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelDefinition {
    #[serde(rename = "factor", default)]
    pub factors: Vec<FactorDefinition>,
    #[serde(rename = "rule", default)]
    pub rules: Vec<RuleDefinition>,
}

#[derive(Debug, Clone)]
struct FactorNode {
    name: String,
    children: Vec<usize>,
    rules: Vec<usize>,
}

/// Validated model that distills [`DensityGraph`]s
#[derive(Debug, Clone)]
pub struct DensityModel {
    factors: Vec<FactorNode>,
    rules: Vec<String>,
    weights: Vec<Decimal>,
}

impl DensityModel {
    /// Load a model from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read quality model {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid quality model {}", path.display()))
    }

    /// Load a model from a TOML string
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let definition: ModelDefinition =
            toml::from_str(content).context("Failed to parse quality model TOML")?;
        Ok(Self::new(definition)?)
    }

    /// Model embedded in the binary
    pub fn default_model() -> anyhow::Result<Self> {
        Self::from_toml_str(DEFAULT_MODEL).context("Failed to parse embedded default-model.toml")
    }

    /// Resolve names and reject dangling references and cycles
    pub fn new(definition: ModelDefinition) -> Result<Self> {
        let mut factor_index = HashMap::new();
        for (i, factor) in definition.factors.iter().enumerate() {
            if factor_index
                .insert(fold(&factor.name), i)
                .is_some()
            {
                return Err(VerifierError::Model(format!(
                    "duplicate factor '{}'",
                    factor.name
                )));
            }
        }

        let mut rule_index = HashMap::new();
        let mut weights = Vec::with_capacity(definition.rules.len());
        for (i, rule) in definition.rules.iter().enumerate() {
            if rule_index.insert(rule.name.clone(), i).is_some() {
                return Err(VerifierError::Model(format!("duplicate rule '{}'", rule.name)));
            }
            let weight = Decimal::from_f64(rule.weight)
                .filter(|w| !w.is_sign_negative())
                .ok_or_else(|| {
                    VerifierError::Model(format!(
                        "rule '{}' has invalid weight {}",
                        rule.name, rule.weight
                    ))
                })?;
            weights.push(weight);
        }

        let mut factors = Vec::with_capacity(definition.factors.len());
        for factor in &definition.factors {
            let children = factor
                .factors
                .iter()
                .map(|child| {
                    factor_index.get(&fold(child)).copied().ok_or_else(|| {
                        VerifierError::Model(format!(
                            "factor '{}' references unknown factor '{}'",
                            factor.name, child
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let rules = factor
                .findings
                .iter()
                .map(|rule| {
                    rule_index.get(rule).copied().ok_or_else(|| {
                        VerifierError::Model(format!(
                            "factor '{}' references unknown rule '{}'",
                            factor.name, rule
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            factors.push(FactorNode {
                name: factor.name.clone(),
                children,
                rules,
            });
        }

        check_acyclic(&factors)?;

        Ok(DensityModel {
            factors,
            rules: definition.rules.into_iter().map(|r| r.name).collect(),
            weights,
        })
    }

    pub fn factor_names(&self) -> Vec<&str> {
        self.factors.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn rule_names(&self) -> &[String] {
        &self.rules
    }
}

fn check_acyclic(factors: &[FactorNode]) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Active,
        Done,
    }

    fn visit(factors: &[FactorNode], marks: &mut [Mark], i: usize) -> Result<()> {
        match marks[i] {
            Mark::Done => return Ok(()),
            Mark::Active => {
                return Err(VerifierError::Model(format!(
                    "factor '{}' is part of a cycle",
                    factors[i].name
                )))
            }
            Mark::Unvisited => {}
        }
        marks[i] = Mark::Active;
        for &child in &factors[i].children {
            visit(factors, marks, child)?;
        }
        marks[i] = Mark::Done;
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; factors.len()];
    for i in 0..factors.len() {
        visit(factors, &mut marks, i)?;
    }
    Ok(())
}

impl GraphBuilder for DensityModel {
    type Graph = DensityGraph;

    fn build_graph(&self) -> Result<DensityGraph> {
        Ok(DensityGraph {
            factors: self.factors.clone(),
            findings: self.rules.iter().map(|r| FindingNode::new(r)).collect(),
            weights: self.weights.clone(),
        })
    }
}

/// Graph distilled from a [`DensityModel`]
#[derive(Debug, Clone)]
pub struct DensityGraph {
    factors: Vec<FactorNode>,
    findings: Vec<FindingNode>,
    weights: Vec<Decimal>,
}

impl DensityGraph {
    fn factor_index(&self, name: &str) -> Option<usize> {
        self.factors
            .iter()
            .position(|f| fold(&f.name) == fold(name))
    }

    fn factor_value(&self, index: usize, loc: Decimal) -> Result<Decimal> {
        let node = &self.factors[index];
        let overflow = || VerifierError::Evaluation {
            aspect: node.name.clone(),
            reason: "arithmetic overflow".to_string(),
        };

        let mut value = Decimal::ONE;
        for &child in &node.children {
            value = value
                .checked_mul(self.factor_value(child, loc)?)
                .ok_or_else(overflow)?;
        }

        let mut weighted = Decimal::ZERO;
        for &r in &node.rules {
            let count = Decimal::from(self.findings[r].len());
            weighted = self.weights[r]
                .checked_mul(count)
                .and_then(|w| weighted.checked_add(w))
                .ok_or_else(overflow)?;
        }
        if weighted.is_zero() {
            return Ok(value);
        }

        if loc <= Decimal::ZERO {
            return Err(VerifierError::Evaluation {
                aspect: node.name.clone(),
                reason: "project has no measured lines of code".to_string(),
            });
        }
        let penalty = weighted
            .checked_mul(Decimal::from(1000))
            .and_then(|w| w.checked_div(loc))
            .ok_or_else(overflow)?;
        let remaining = Decimal::ONE
            .checked_sub(penalty)
            .ok_or_else(overflow)?
            .max(Decimal::ZERO);
        value.checked_mul(remaining).ok_or_else(overflow)
    }
}

impl QualityGraph for DensityGraph {
    fn finding_nodes(&self) -> Vec<&FindingNode> {
        self.findings.iter().collect()
    }

    fn finding_node_mut(&mut self, rule: &str) -> Option<&mut FindingNode> {
        self.findings.iter_mut().find(|n| n.rule_name() == rule)
    }

    fn has_factor(&self, name: &str) -> bool {
        self.factor_index(name).is_some()
    }

    fn evaluate(&self, aspect: &str, tree: &CodeTree) -> Result<Decimal> {
        let index = self
            .factor_index(aspect)
            .ok_or_else(|| VerifierError::AspectNotFound(aspect.to_string()))?;

        let loc = tree
            .root()
            .metrics
            .get(&Metric::Loc)
            .copied()
            .and_then(Decimal::from_f64)
            .unwrap_or(Decimal::ZERO);

        self.factor_value(index, loc)
    }
}

/// Case folding shared by duplicate detection and factor lookup
fn fold(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Finding;
    use crate::tree::{LocationKind, MetricTable};

    const MODEL: &str = r#"
        [[factor]]
        name = "Quality"
        factors = ["Reliability", "Security"]

        [[factor]]
        name = "Reliability"
        findings = ["NullDereference"]

        [[factor]]
        name = "Security"
        findings = ["SqlInjection"]

        [[rule]]
        name = "NullDereference"
        weight = 0.5

        [[rule]]
        name = "SqlInjection"
        weight = 0.25
    "#;

    fn tree_with_loc(loc: f64) -> CodeTree {
        let mut tree = CodeTree::new("Project:Test");
        let root = tree.root_id();
        tree.add_file(root, "/a/B.x", 10).unwrap();
        let mut metrics = MetricTable::new();
        metrics.insert(Metric::Loc, loc);
        tree.project_mut(root).metrics = metrics;
        tree
    }

    #[test]
    fn test_empty_graph_evaluates_to_one() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let graph = model.build_graph().unwrap();
        let tree = tree_with_loc(1000.0);

        for aspect in ["Quality", "reliability", "SECURITY"] {
            assert_eq!(graph.evaluate(aspect, &tree).unwrap(), Decimal::ONE);
        }
    }

    #[test]
    fn test_findings_lower_factor_value() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let mut graph = model.build_graph().unwrap();
        let tree = tree_with_loc(1000.0);
        let location = tree.location_at(LocationKind::File, 0).unwrap();

        graph
            .finding_node_mut("NullDereference")
            .unwrap()
            .add_finding(Finding::new("NullDereference", location));

        // 1 - 0.5 * 1 * 1000 / 1000
        assert_eq!(
            graph.evaluate("Reliability", &tree).unwrap(),
            Decimal::new(5, 1)
        );
        assert_eq!(graph.evaluate("Security", &tree).unwrap(), Decimal::ONE);
        assert_eq!(graph.evaluate("Quality", &tree).unwrap(), Decimal::new(5, 1));
    }

    #[test]
    fn test_value_is_floored_at_zero() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let mut graph = model.build_graph().unwrap();
        let tree = tree_with_loc(100.0);
        let location = tree.location_at(LocationKind::File, 0).unwrap();

        let node = graph.finding_node_mut("SqlInjection").unwrap();
        for _ in 0..3 {
            node.add_finding(Finding::new("SqlInjection", location));
        }
        assert_eq!(graph.evaluate("Security", &tree).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_missing_aspect() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let graph = model.build_graph().unwrap();
        let err = graph
            .evaluate("Portability", &tree_with_loc(10.0))
            .unwrap_err();
        assert!(matches!(err, VerifierError::AspectNotFound(_)));
        assert!(!graph.has_factor("Portability"));
    }

    #[test]
    fn test_findings_without_loc_fail() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let mut graph = model.build_graph().unwrap();
        let tree = tree_with_loc(0.0);
        let location = tree.location_at(LocationKind::File, 0).unwrap();
        graph
            .finding_node_mut("SqlInjection")
            .unwrap()
            .add_finding(Finding::new("SqlInjection", location));

        let err = graph.evaluate("Security", &tree).unwrap_err();
        assert!(matches!(err, VerifierError::Evaluation { .. }));
    }

    #[test]
    fn test_huge_weight_overflow_is_evaluation_error() {
        let toml = r#"
            [[factor]]
            name = "R"
            findings = ["Heavy"]

            [[rule]]
            name = "Heavy"
            weight = 1e26
        "#;
        let model = DensityModel::from_toml_str(toml).unwrap();
        let mut graph = model.build_graph().unwrap();
        let tree = tree_with_loc(1000.0);
        let location = tree.location_at(LocationKind::File, 0).unwrap();
        graph
            .finding_node_mut("Heavy")
            .unwrap()
            .add_finding(Finding::new("Heavy", location));

        let err = graph.evaluate("R", &tree).unwrap_err();
        assert!(
            matches!(err, VerifierError::Evaluation { ref aspect, ref reason }
                if aspect == "R" && reason.contains("overflow"))
        );
    }

    #[test]
    fn test_non_ascii_factor_names_fold_consistently() {
        let duplicate = r#"
            [[factor]]
            name = "Ärger"

            [[factor]]
            name = "ärger"
        "#;
        assert!(DensityModel::from_toml_str(duplicate).is_err());

        let toml = r#"
            [[factor]]
            name = "Überblick"
            factors = ["ärger"]

            [[factor]]
            name = "Ärger"
        "#;
        let model = DensityModel::from_toml_str(toml).unwrap();
        let graph = model.build_graph().unwrap();
        assert!(graph.has_factor("ÜBERBLICK"));
        assert!(graph.has_factor("ärger"));
        assert_eq!(
            graph.evaluate("überblick", &tree_with_loc(10.0)).unwrap(),
            Decimal::ONE
        );
    }

    #[test]
    fn test_fresh_graphs_share_no_findings() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let tree = tree_with_loc(1000.0);
        let location = tree.location_at(LocationKind::File, 0).unwrap();

        let mut first = model.build_graph().unwrap();
        first
            .finding_node_mut("SqlInjection")
            .unwrap()
            .add_finding(Finding::new("SqlInjection", location));

        let second = model.build_graph().unwrap();
        assert_eq!(first.finding_count(), 1);
        assert_eq!(second.finding_count(), 0);
        assert_eq!(
            second.finding_rules(),
            vec!["NullDereference".to_string(), "SqlInjection".to_string()]
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let toml = r#"
            [[factor]]
            name = "A"
            factors = ["B"]

            [[factor]]
            name = "B"
            factors = ["A"]
        "#;
        let err = DensityModel::from_toml_str(toml).unwrap_err();
        assert!(format!("{:#}", err).contains("cycle"));
    }

    #[test]
    fn test_unknown_rule_rejected() {
        let toml = r#"
            [[factor]]
            name = "A"
            findings = ["Missing"]
        "#;
        assert!(DensityModel::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let toml = r#"
            [[rule]]
            name = "R"
            weight = -1.0
        "#;
        assert!(DensityModel::from_toml_str(toml).is_err());
    }

    #[test]
    fn test_default_model_loads() {
        let model = DensityModel::default_model().unwrap();
        let names = model.factor_names();
        for aspect in ["Quality", "Maintainability", "Reliability", "Security"] {
            assert!(names.contains(&aspect), "missing {}", aspect);
        }
        assert!(model.rule_names().len() >= 10);
    }
}
