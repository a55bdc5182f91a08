//! Experiment orchestration
//!
//! A run walks a fixed sequence of phases:
//!
//! ```text
//! GENERATE → AGGREGATE_METRICS → VALIDATE
//!     → { BUILD_GRAPH → LINK_FINDINGS → EVALUATE → RECORD } × num_executions
//!     → SUMMARIZE → REPORT
//! ```
//!
//! VALIDATE evaluates every configured aspect on a graph with no findings,
//! where each must be exactly 1. The trial loop rebuilds a fresh graph per
//! execution and drops it before the next one, so no finding survives its
//! trial. Any error aborts the run: sample vectors must have equal length
//! for the statistics to mean anything.

pub mod statistics;

use crate::config::VerifierConfig;
use crate::error::{Result, VerifierError};
use crate::generator::{generator_for, ProjectGenerator};
use crate::injector::FindingInjector;
use crate::metrics::MetricsAggregator;
use crate::model::{GraphBuilder, QualityGraph};
use crate::report::{SummaryRow, ValidationRow, VerificationReport};
use crate::tree::CodeTree;
use rand::{Rng, RngCore};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;
use tracing::{info, trace, warn};

/// Value every aspect is compared against
pub const REFERENCE_VALUE: f32 = 1.0;

/// Phases of a verification run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Generate,
    AggregateMetrics,
    Validate,
    Trials,
    Summarize,
    Report,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Generate => "GENERATE",
            Phase::AggregateMetrics => "AGGREGATE_METRICS",
            Phase::Validate => "VALIDATE",
            Phase::Trials => "TRIALS",
            Phase::Summarize => "SUMMARIZE",
            Phase::Report => "REPORT",
        };
        f.write_str(name)
    }
}

/// Per-aspect sample vectors, one column per configured aspect
///
/// Samples are `f32`, so aspect values within about `6e-8` of 1 are stored
/// as exactly `1.0` and summarize with a p-value of 1.
pub type SampleMatrix = Vec<Vec<f32>>;

/// Drives generation, validation and the repeated-trial loop
pub struct ModelVerifier<'a, B: GraphBuilder> {
    config: &'a VerifierConfig,
    builder: &'a B,
    injector: FindingInjector,
}

impl<'a, B: GraphBuilder> ModelVerifier<'a, B> {
    pub fn new(config: &'a VerifierConfig, builder: &'a B) -> Result<Self> {
        config.validate()?;
        Ok(ModelVerifier {
            config,
            builder,
            injector: FindingInjector::new(config),
        })
    }

    /// Generate a tree, measure it, and verify the model against it
    pub fn run(&self, rng: &mut dyn RngCore) -> Result<VerificationReport> {
        info!(phase = %Phase::Generate, "Generating code tree");
        let mut tree = generator_for(self.config).generate(rng)?;

        info!(phase = %Phase::AggregateMetrics, "Adding metrics to tree");
        MetricsAggregator::new().aggregate(&mut tree, rng)?;

        self.verify(&tree, rng)
    }

    /// Validate, run every trial, and summarize against an existing tree
    pub fn verify<R: Rng + ?Sized>(
        &self,
        tree: &CodeTree,
        rng: &mut R,
    ) -> Result<VerificationReport> {
        let validation = self.validate_model(tree)?;
        let samples = self.execute_experiment(tree, rng)?;
        let summary = self.summarize(&samples)?;

        Ok(VerificationReport {
            validation,
            summary,
        })
    }

    /// Evaluate every aspect on a graph with no findings attached
    pub fn validate_model(&self, tree: &CodeTree) -> Result<Vec<ValidationRow>> {
        info!(phase = %Phase::Validate, "Validating model");
        let graph = self.builder.build_graph()?;
        self.check_aspects(&graph)?;

        let values = self.evaluate_aspects(&graph, tree)?;
        let rows: Vec<ValidationRow> = self
            .config
            .quality_aspects
            .iter()
            .zip(values)
            .map(|(aspect, value)| ValidationRow::new(aspect, value))
            .collect();

        for row in rows.iter().filter(|r| !r.is_zero) {
            warn!(aspect = %row.aspect, value = %row.value, "aspect is not 1 without findings");
        }
        Ok(rows)
    }

    /// Run `num_executions` trials and collect one sample per aspect each
    pub fn execute_experiment<R: Rng + ?Sized>(
        &self,
        tree: &CodeTree,
        rng: &mut R,
    ) -> Result<SampleMatrix> {
        let executions = self.config.num_executions;
        info!(phase = %Phase::Trials, executions, "Evaluating results");

        let mut samples: SampleMatrix = self
            .config
            .quality_aspects
            .iter()
            .map(|_| Vec::with_capacity(executions))
            .collect();

        for trial in 0..executions {
            let mut graph = self.builder.build_graph()?;
            let injected = self.injector.link_findings(&mut graph, tree, rng);
            let values = self.evaluate_aspects(&graph, tree)?;

            for ((column, value), aspect) in samples
                .iter_mut()
                .zip(values)
                .zip(&self.config.quality_aspects)
            {
                let sample = value.to_f32().ok_or_else(|| VerifierError::Evaluation {
                    aspect: aspect.clone(),
                    reason: format!("value {} is not representable as f32", value),
                })?;
                column.push(sample);
            }
            trace!(trial, findings = injected.total(), "completed trial");
        }

        Ok(samples)
    }

    /// Mean, standard deviation and t-test per aspect
    pub fn summarize(&self, samples: &[Vec<f32>]) -> Result<Vec<SummaryRow>> {
        info!(phase = %Phase::Summarize, "Summarizing samples");
        self.config
            .quality_aspects
            .iter()
            .zip(samples)
            .map(|(aspect, column)| {
                let test = statistics::one_sample_ttest(column, REFERENCE_VALUE)?;
                Ok(SummaryRow::new(aspect, &test))
            })
            .collect()
    }

    fn check_aspects(&self, graph: &B::Graph) -> Result<()> {
        for aspect in &self.config.quality_aspects {
            if !graph.has_factor(aspect) {
                return Err(VerifierError::AspectNotFound(aspect.clone()));
            }
        }
        Ok(())
    }

    fn evaluate_aspects(&self, graph: &B::Graph, tree: &CodeTree) -> Result<Vec<Decimal>> {
        self.config
            .quality_aspects
            .iter()
            .map(|aspect| graph.evaluate(aspect, tree))
            .collect()
    }
}
