//! Bottom-up metrics for a generated tree
//!
//! Method statement counts (NOS) are the only sampled metric: they are drawn
//! from `(size, 1.25 * size, 2 * size)` so statement density is not a fixed
//! function of line count. Every other value is an exact sum of child
//! metrics already computed.
//!
//! | Level   | LOC            | NOS        | NOM / NOF / NOV       | NC            |
//! |---------|----------------|------------|-----------------------|---------------|
//! | Method  | end - start    | sampled    | -                     | -             |
//! | Type    | end - start    | Σ methods  | owned counts          | -             |
//! | File    | file length    | Σ types    | Σ types               | owned types   |
//! | Project | Σ files + subs | Σ          | Σ                     | Σ             |

use crate::error::Result;
use crate::sampler::Triangular;
use crate::tree::{CodeTree, FileId, Metric, MetricTable, ProjectId, TypeId};
use rand::Rng;
use tracing::debug;

/// Computes metric tables for every node of a [`CodeTree`]
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsAggregator;

impl MetricsAggregator {
    pub fn new() -> Self {
        MetricsAggregator
    }

    /// Aggregate the whole forest starting at the root project
    pub fn aggregate<R: Rng + ?Sized>(&self, tree: &mut CodeTree, rng: &mut R) -> Result<()> {
        let root = tree.root_id();
        let totals = self.aggregate_project(tree, root, rng)?;
        debug!(
            loc = totals.get(&Metric::Loc).copied().unwrap_or(0.0),
            nos = totals.get(&Metric::Nos).copied().unwrap_or(0.0),
            "aggregated project metrics"
        );
        Ok(())
    }

    fn aggregate_project<R: Rng + ?Sized>(
        &self,
        tree: &mut CodeTree,
        project: ProjectId,
        rng: &mut R,
    ) -> Result<MetricTable> {
        let mut totals = zeroed(&Metric::ALL);

        let subs = tree.project(project).sub_projects.clone();
        for sub in subs {
            let child = self.aggregate_project(tree, sub, rng)?;
            accumulate(&mut totals, &child, &Metric::ALL);
        }

        let files = tree.project(project).files.clone();
        for file in files {
            let child = self.aggregate_file(tree, file, rng)?;
            accumulate(&mut totals, &child, &Metric::ALL);
        }

        tree.project_mut(project).metrics = totals.clone();
        Ok(totals)
    }

    fn aggregate_file<R: Rng + ?Sized>(
        &self,
        tree: &mut CodeTree,
        file: FileId,
        rng: &mut R,
    ) -> Result<MetricTable> {
        const SUMMED: [Metric; 4] = [Metric::Nos, Metric::Nom, Metric::Nof, Metric::Nov];
        let mut totals = zeroed(&SUMMED);

        let types = tree.file(file).types.clone();
        for &ty in &types {
            let child = self.aggregate_type(tree, ty, rng)?;
            accumulate(&mut totals, &child, &SUMMED);
        }

        totals.insert(Metric::Loc, f64::from(tree.file(file).length));
        totals.insert(Metric::Nc, types.len() as f64);
        tree.file_mut(file).metrics = totals.clone();
        Ok(totals)
    }

    fn aggregate_type<R: Rng + ?Sized>(
        &self,
        tree: &mut CodeTree,
        ty: TypeId,
        rng: &mut R,
    ) -> Result<MetricTable> {
        let methods = tree.type_node(ty).methods.clone();
        let mut statements = 0.0;

        for method in methods.iter().copied() {
            let (start, end) = {
                let m = tree.method(method);
                (m.start, m.end)
            };
            let size = f64::from(end - start);
            let nos = f64::from(Triangular::new(size, 1.25 * size, 2.0 * size)?.sample(rng));

            let metrics = &mut tree.method_mut(method).metrics;
            metrics.insert(Metric::Loc, size);
            metrics.insert(Metric::Nos, nos);
            statements += nos;
        }

        let node = tree.type_node(ty);
        let mut table = MetricTable::new();
        table.insert(Metric::Loc, f64::from(node.end - node.start));
        table.insert(Metric::Nos, statements);
        table.insert(Metric::Nom, node.methods.len() as f64);
        table.insert(Metric::Nof, node.fields.len() as f64);
        table.insert(Metric::Nov, node.fields.len() as f64);

        tree.type_mut(ty).metrics = table.clone();
        Ok(table)
    }
}

fn zeroed(metrics: &[Metric]) -> MetricTable {
    metrics.iter().map(|&m| (m, 0.0)).collect()
}

fn accumulate(totals: &mut MetricTable, child: &MetricTable, metrics: &[Metric]) {
    for metric in metrics {
        let value = child.get(metric).copied().unwrap_or(0.0);
        *totals.entry(*metric).or_insert(0.0) += value;
    }
}
