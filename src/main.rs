use anyhow::{Context, Result};
use clap::Parser;
use qmverify::cli::{Cli, OutputFormat};
use qmverify::config::VerifierConfig;
use qmverify::model::DensityModel;
use qmverify::report::VerificationReport;
use qmverify::verifier::{ModelVerifier, Phase};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` forces TRACE
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<VerifierConfig> {
    let mut config = match &cli.config {
        Some(path) => VerifierConfig::from_file(path)?,
        None => VerifierConfig::default(),
    };
    cli.apply_overrides(&mut config);
    config
        .validate()
        .context("Invalid configuration after command-line overrides")?;
    Ok(config)
}

fn load_model(config: &VerifierConfig) -> Result<DensityModel> {
    let model = match &config.quality_model {
        Some(path) => DensityModel::from_file(path)?,
        None => DensityModel::default_model()?,
    };
    debug!(
        factors = ?model.factor_names(),
        rules = model.rule_names().len(),
        "Loaded quality model"
    );
    Ok(model)
}

fn emit<W: Write>(report: &VerificationReport, format: OutputFormat, out: &mut W) -> Result<()> {
    match format {
        OutputFormat::Text => report.write_text(out)?,
        OutputFormat::Json => report.write_json(out)?,
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    let model = load_model(&config)?;

    let mut rng = match config.seed {
        Some(seed) => {
            info!(seed, "Using fixed seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let verifier = ModelVerifier::new(&config, &model)?;
    let report = verifier.run(&mut rng).map_err(|err| {
        let message = if err.is_configuration() {
            "Configuration does not fit the quality model"
        } else {
            "Verification run failed"
        };
        anyhow::Error::new(err).context(message)
    })?;

    info!(phase = %Phase::Report, "Writing results");
    emit(&report, cli.format, &mut io::stdout().lock())?;

    if let Some(path) = &cli.output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create results file: {}", path.display()))?;
        emit(&report, cli.format, &mut BufWriter::new(file))?;
    }

    if !report.model_is_valid() {
        warn!("Model does not evaluate to 1 without findings");
    }
    Ok(())
}
