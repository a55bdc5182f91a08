//! Report rows and plain-text rendering
//!
//! Two fixed-width tables: the validation table (each aspect's value with
//! no findings attached) and the summary table (sample statistics and the
//! t-test verdict per aspect). Both are also serializable for `--format json`.

use crate::verifier::statistics::OneSampleTest;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::io::{self, Write};

pub const VALIDATION_HEADER: &str =
    "Quality Aspect                      Value      1 - Value     Zero? ";
pub const SUMMARY_HEADER: &str =
    "Quality Aspect                     Mean       StdDev      p-val    p < 0.025";

const VALIDATION_RULE_WIDTH: usize = 67;
const SUMMARY_RULE_WIDTH: usize = 76;

const VALUE_SCALE: u32 = 7;
const DIFFERENCE_SCALE: u32 = 5;

/// Validation result for one aspect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRow {
    pub aspect: String,

    /// Value rounded half-up to 7 decimal places
    pub value: Decimal,

    /// `1 - value`, rounded half-up to 5 decimal places
    pub difference: Decimal,

    /// True when the unrounded difference is exactly zero; a value shown as
    /// `1.0000000` can still be `false`
    pub is_zero: bool,
}

impl ValidationRow {
    pub fn new(aspect: &str, observed: Decimal) -> Self {
        let exact = Decimal::ONE - observed;
        ValidationRow {
            aspect: aspect.to_string(),
            value: observed
                .round_dp_with_strategy(VALUE_SCALE, RoundingStrategy::MidpointAwayFromZero),
            difference: exact
                .round_dp_with_strategy(DIFFERENCE_SCALE, RoundingStrategy::MidpointAwayFromZero),
            is_zero: exact.is_zero(),
        }
    }

    pub fn render(&self) -> String {
        let value = format!("{:.*}", VALUE_SCALE as usize, self.value);
        let difference = format!("{:.*}", DIFFERENCE_SCALE as usize, self.difference);
        format!(
            "{:>30.30}    {:>9.9}    {:>9.9}     {}",
            self.aspect, value, difference, self.is_zero
        )
    }
}

/// Sample statistics for one aspect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub aspect: String,
    pub samples: usize,
    pub mean: f32,
    pub std_dev: f32,
    pub p_value: f32,

    /// p-value below the significance level
    pub significant: bool,
}

impl SummaryRow {
    pub fn new(aspect: &str, test: &OneSampleTest) -> Self {
        SummaryRow {
            aspect: aspect.to_string(),
            samples: test.n,
            mean: test.mean,
            std_dev: test.std_dev,
            p_value: test.pvalue,
            significant: test.rejects(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{:>30.30}    {:.5}    {:.5}    {:.5}     {}",
            self.aspect, self.mean, self.std_dev, self.p_value, self.significant
        )
    }
}

/// Everything a completed run reports
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub validation: Vec<ValidationRow>,
    pub summary: Vec<SummaryRow>,
}

impl VerificationReport {
    /// True when every aspect evaluated to exactly 1 without findings
    pub fn model_is_valid(&self) -> bool {
        self.validation.iter().all(|row| row.is_zero)
    }

    pub fn validation_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "-".repeat(VALIDATION_RULE_WIDTH),
            VALIDATION_HEADER.to_string(),
            "-".repeat(VALIDATION_RULE_WIDTH),
        ];
        lines.extend(self.validation.iter().map(ValidationRow::render));
        lines.push("-".repeat(VALIDATION_RULE_WIDTH));
        lines
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            "-".repeat(SUMMARY_RULE_WIDTH),
            SUMMARY_HEADER.to_string(),
            "-".repeat(SUMMARY_RULE_WIDTH),
        ];
        lines.extend(self.summary.iter().map(SummaryRow::render));
        lines.push("-".repeat(SUMMARY_RULE_WIDTH));
        lines.push(String::new());
        lines
    }

    /// Both tables, validation first
    pub fn write_text<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for line in self.validation_lines().iter().chain(&self.summary_lines()) {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }
}
