//! Random finding injection
//!
//! For every selected rule, draw `1..=max_findings_per_item` candidates and
//! accept each with `finding_probability`. An accepted candidate lands on a
//! uniformly chosen location kind (method, type or file) and a uniformly
//! chosen instance of that kind. Only the graph's finding nodes change; the
//! tree is read-only here.
//!
//! The acceptance probability applies in every selection mode, `ALL`
//! included.

use crate::config::{FindingSelection, VerifierConfig};
use crate::model::{Finding, QualityGraph};
use crate::tree::{CodeTree, Location, LocationKind};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Findings attached during one injection pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionSummary {
    /// Rule name → findings attached
    pub attached: BTreeMap<String, usize>,
}

impl InjectionSummary {
    pub fn total(&self) -> usize {
        self.attached.values().sum()
    }
}

/// Binds random findings to tree locations
#[derive(Debug, Clone)]
pub struct FindingInjector {
    selection: FindingSelection,
    max_per_item: u32,
    probability: f64,
}

impl FindingInjector {
    pub fn new(config: &VerifierConfig) -> Self {
        FindingInjector {
            selection: config.finding_selection(),
            max_per_item: config.max_findings_per_item.max(1),
            probability: config.finding_probability,
        }
    }

    /// Attach findings to `graph` using locations from `tree`
    pub fn link_findings<G, R>(
        &self,
        graph: &mut G,
        tree: &CodeTree,
        rng: &mut R,
    ) -> InjectionSummary
    where
        G: QualityGraph + ?Sized,
        R: Rng + ?Sized,
    {
        let mut summary = InjectionSummary::default();

        let kinds: Vec<LocationKind> = LocationKind::ALL
            .into_iter()
            .filter(|&kind| tree.count(kind) > 0)
            .collect();
        if kinds.is_empty() {
            debug!("tree has no linkable locations, skipping injection");
            return summary;
        }

        for rule in self.select_rules(&*graph, rng) {
            let Some(node) = graph.finding_node_mut(&rule) else {
                trace!(rule = %rule, "configured rule not in graph");
                continue;
            };

            let candidates = rng.gen_range(1..=self.max_per_item);
            let mut attached = 0;
            for _ in 0..candidates {
                if rng.gen::<f64>() >= self.probability {
                    continue;
                }
                if let Some(location) = random_location(tree, &kinds, rng) {
                    trace!(
                        rule = %rule,
                        location = %tree.location_name(location),
                        "attached finding"
                    );
                    node.add_finding(Finding::new(&rule, location));
                    attached += 1;
                }
            }
            summary.attached.insert(rule, attached);
        }

        trace!(total = summary.total(), "linked findings");
        summary
    }

    /// Rule names participating in this pass
    fn select_rules<G, R>(&self, graph: &G, rng: &mut R) -> Vec<String>
    where
        G: QualityGraph + ?Sized,
        R: Rng + ?Sized,
    {
        match &self.selection {
            FindingSelection::Any(max) => {
                let mut rules = graph.finding_rules();
                rules.shuffle(rng);
                rules.truncate(*max);
                rules
            }
            FindingSelection::All => graph.finding_rules(),
            FindingSelection::Rules(rules) => rules.clone(),
        }
    }
}

fn random_location<R: Rng + ?Sized>(
    tree: &CodeTree,
    kinds: &[LocationKind],
    rng: &mut R,
) -> Option<Location> {
    let kind = *kinds.choose(rng)?;
    let index = rng.gen_range(0..tree.count(kind));
    tree.location_at(kind, index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DensityModel, GraphBuilder};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    const MODEL: &str = r#"
        [[factor]]
        name = "Reliability"
        findings = ["A", "B", "C", "D"]

        [[rule]]
        name = "A"
        weight = 0.1
        [[rule]]
        name = "B"
        weight = 0.1
        [[rule]]
        name = "C"
        weight = 0.1
        [[rule]]
        name = "D"
        weight = 0.1
    "#;

    fn tree() -> CodeTree {
        let mut tree = CodeTree::new("Project:Test");
        let root = tree.root_id();
        let file = tree.add_file(root, "/p/A.x", 20).unwrap();
        let ty = tree.add_type(file, "A", "p.A", 2, 20);
        tree.add_method(ty, "a", false, 3, 10);
        tree.add_method(ty, "b", false, 11, 20);
        tree
    }

    fn config(selection: &[&str], probability: f64) -> VerifierConfig {
        VerifierConfig {
            findings_to_verify: selection.iter().map(|s| s.to_string()).collect(),
            max_findings_activated_for_any: 2,
            max_findings_per_item: 3,
            finding_probability: probability,
            ..VerifierConfig::default()
        }
    }

    #[test]
    fn test_zero_probability_attaches_nothing() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let tree = tree();
        let injector = FindingInjector::new(&config(&["ALL"], 0.0));
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..100 {
            let mut graph = model.build_graph().unwrap();
            let summary = injector.link_findings(&mut graph, &tree, &mut rng);
            assert_eq!(summary.total(), 0);
            assert_eq!(graph.finding_count(), 0);
        }
    }

    #[test]
    fn test_certain_probability_fills_every_candidate() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let tree = tree();
        let injector = FindingInjector::new(&config(&["ALL"], 1.0));
        let mut rng = StdRng::seed_from_u64(2);

        let mut graph = model.build_graph().unwrap();
        let summary = injector.link_findings(&mut graph, &tree, &mut rng);

        assert_eq!(summary.attached.len(), 4);
        for node in graph.finding_nodes() {
            assert!((1..=3).contains(&node.len()));
            for finding in node.findings() {
                assert_eq!(finding.rule, node.rule_name());
            }
        }
        assert_eq!(summary.total(), graph.finding_count());
    }

    #[test]
    fn test_any_respects_rule_cap() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let tree = tree();
        let injector = FindingInjector::new(&config(&["any"], 1.0));
        let mut rng = StdRng::seed_from_u64(3);

        let mut chosen = HashSet::new();
        for _ in 0..50 {
            let mut graph = model.build_graph().unwrap();
            let summary = injector.link_findings(&mut graph, &tree, &mut rng);
            assert_eq!(summary.attached.len(), 2);
            chosen.extend(summary.attached.keys().cloned());
        }
        // shuffling reaches every rule eventually
        assert_eq!(chosen.len(), 4);
    }

    #[test]
    fn test_explicit_rules_skip_unknown_names() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let tree = tree();
        let injector = FindingInjector::new(&config(&["B", "Nope"], 1.0));
        let mut rng = StdRng::seed_from_u64(4);

        let mut graph = model.build_graph().unwrap();
        let summary = injector.link_findings(&mut graph, &tree, &mut rng);
        assert_eq!(summary.attached.keys().collect::<Vec<_>>(), vec!["B"]);
        assert_eq!(graph.finding_nodes()[0].len(), 0);
        assert!(graph.finding_nodes()[1].len() >= 1);
    }

    #[test]
    fn test_locations_reference_existing_nodes() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let tree = tree();
        let injector = FindingInjector::new(&config(&["ALL"], 1.0));
        let mut rng = StdRng::seed_from_u64(5);

        let mut kinds = HashSet::new();
        for _ in 0..30 {
            let mut graph = model.build_graph().unwrap();
            injector.link_findings(&mut graph, &tree, &mut rng);
            for node in graph.finding_nodes() {
                for finding in node.findings() {
                    let kind = finding.location.kind();
                    let index = match finding.location {
                        Location::Method(id) => id.index(),
                        Location::Type(id) => id.index(),
                        Location::File(id) => id.index(),
                    };
                    assert!(index < tree.count(kind));
                    kinds.insert(kind);
                }
            }
        }
        assert_eq!(kinds.len(), 3);
    }

    #[test]
    fn test_empty_tree_attaches_nothing() {
        let model = DensityModel::from_toml_str(MODEL).unwrap();
        let tree = CodeTree::new("Project:Test");
        let injector = FindingInjector::new(&config(&["ALL"], 1.0));
        let mut rng = StdRng::seed_from_u64(6);

        let mut graph = model.build_graph().unwrap();
        let summary = injector.link_findings(&mut graph, &tree, &mut rng);
        assert_eq!(summary.total(), 0);
    }
}
