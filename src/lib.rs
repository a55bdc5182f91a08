//! qmverify - statistical verification of software quality models
//!
//! Generates a synthetic project tree, measures it, and repeatedly injects
//! random findings into fresh quality-model graphs. Each configured quality
//! aspect must evaluate to exactly 1 with no findings; with findings, the
//! sampled values are tested against 1 with a one-sample t-test.

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod injector;
pub mod metrics;
pub mod model;
pub mod report;
pub mod sampler;
pub mod tree;
pub mod verifier;

pub use error::{Result, VerifierError};
