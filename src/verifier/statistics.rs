// Statistical summary of repeated trials using aprender and trueno
//
// - trueno::Vector for SIMD mean and variance
// - aprender's one-sample t-test against the reference value
// - Sample standard deviation (n - 1 denominator); trueno reports the
//   population variance, so it is rescaled by n / (n - 1)
//
// A constant sample has no variance and the t statistic is undefined. The
// p-value is then 1.0 when the constant equals the reference (the test
// cannot reject equality) and 0.0 otherwise.

use crate::error::{Result, VerifierError};
use trueno::Vector;

/// Significance level for rejecting equality with the reference value
pub const SIGNIFICANCE_LEVEL: f32 = 0.025;

/// Result of a one-sample two-sided t-test
#[derive(Debug, Clone, PartialEq)]
pub struct OneSampleTest {
    /// Number of samples
    pub n: usize,

    pub mean: f32,

    /// Sample standard deviation
    pub std_dev: f32,

    /// t-statistic value (0 or ±inf for constant samples)
    pub statistic: f32,

    /// p-value (two-tailed)
    pub pvalue: f32,

    /// Degrees of freedom
    pub df: f32,
}

impl OneSampleTest {
    /// True when the test rejects equality at [`SIGNIFICANCE_LEVEL`]
    pub fn rejects(&self) -> bool {
        self.pvalue < SIGNIFICANCE_LEVEL
    }
}

/// Test whether `samples` are drawn from a distribution with mean `reference`
///
/// # Example
/// ```
/// use qmverify::verifier::statistics::one_sample_ttest;
///
/// let samples = vec![1.0; 50];
/// let result = one_sample_ttest(&samples, 1.0).unwrap();
/// assert_eq!(result.std_dev, 0.0);
/// assert_eq!(result.pvalue, 1.0);
/// assert!(!result.rejects());
/// ```
pub fn one_sample_ttest(samples: &[f32], reference: f32) -> Result<OneSampleTest> {
    if samples.len() < 2 {
        return Err(VerifierError::Statistics(format!(
            "Need at least 2 samples for t-test, got {}",
            samples.len()
        )));
    }

    let n = samples.len();
    let df = (n - 1) as f32;

    let first = samples[0];
    if samples.iter().all(|&x| x == first) {
        let (statistic, pvalue) = if first == reference {
            (0.0, 1.0)
        } else if first > reference {
            (f32::INFINITY, 0.0)
        } else {
            (f32::NEG_INFINITY, 0.0)
        };
        return Ok(OneSampleTest {
            n,
            mean: first,
            std_dev: 0.0,
            statistic,
            pvalue,
            df,
        });
    }

    let vector = Vector::from_slice(samples);
    let mean = vector
        .mean()
        .map_err(|e| VerifierError::Statistics(format!("Failed to compute mean: {}", e)))?;
    let population_variance = vector
        .variance()
        .map_err(|e| VerifierError::Statistics(format!("Failed to compute variance: {}", e)))?;
    let std_dev = (population_variance * n as f32 / df).max(0.0).sqrt();

    let ttest = aprender::stats::hypothesis::ttest_1samp(samples, reference)
        .map_err(|e| VerifierError::Statistics(format!("Failed to compute t-test: {}", e)))?;

    Ok(OneSampleTest {
        n,
        mean,
        std_dev,
        statistic: ttest.statistic,
        pvalue: ttest.pvalue,
        df: ttest.df,
    })
}
