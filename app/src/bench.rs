use std::path::Path;

use common::{
    config::{Config, Executor},
    engine::engine_from_name,
    error::{PipelineError, Stage},
    job::{Job, emit_jobs},
    record::{collect_records, write_records},
    runner::{makefile, run_jobs},
    sweep::Axis,
};
use eyre::{Context, Result};
use tokio::fs::read_to_string;
use tracing::{debug, info};

/// Command line settings that win over the sweep file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub engine: Option<String>,
    pub jobs: Option<usize>,
    pub executor: Option<Executor>,
}

pub async fn load_config(config_file: &Path, overrides: Overrides) -> Result<Config> {
    let yaml = read_to_string(config_file)
        .await
        .with_context(|| format!("Reading {}", config_file.display()))?;
    let mut config = Config::from_yaml(&yaml)?;
    if let Some(engine) = overrides.engine {
        config.engine = engine_from_name(&engine)?;
    }
    if let Some(jobs) = overrides.jobs {
        config.settings.jobs = Some(jobs);
    }
    if let Some(executor) = overrides.executor {
        config.settings.executor = executor;
    }
    debug!("Loaded sweep {} with engine {}", config.name, config.engine.name());
    Ok(config)
}

fn jobs(config: &Config) -> Result<(Vec<Job>, Axis)> {
    let jobs = emit_jobs(&config.sweep, &*config.engine, &config.settings)?;
    Ok((jobs, config.sweep.axis()?))
}

pub async fn run_benchmark(config: Config, progress: bool) -> Result<()> {
    let (jobs, axis) = jobs(&config).wrap_err(Stage::SweepGeneration)?;

    run_jobs(&jobs, &*config.engine, &config.settings, progress)
        .await
        .wrap_err(Stage::JobExecution)?;
    info!("Finished {} jobs of {}", jobs.len(), config.name);

    let results = config.settings.root.join(&config.settings.results);
    aggregate(&results, &config.settings.output, axis, Some(jobs.len())).await?;
    println!("Results written to {}", config.settings.output.display());
    Ok(())
}

/// Gathers the per-job files of `results` into one sorted array at `output`.
/// A batch of `expected` jobs must have left a record for each of them.
pub async fn aggregate(
    results: &Path,
    output: &Path,
    axis: Axis,
    expected: Option<usize>,
) -> Result<()> {
    let records = collect_records(results)
        .await
        .wrap_err(Stage::Aggregation)?;
    info!("Collected {} records from {}", records.len(), results.display());
    if let Some(expected) = expected.filter(|n| records.len() < *n) {
        let missing = PipelineError::MissingRecords {
            expected,
            found: records.len(),
        };
        return Err(missing).wrap_err(Stage::Aggregation);
    }
    write_records(output, &records, axis)
        .await
        .wrap_err(Stage::Aggregation)
}

/// Shows what `bench` would run without running it
pub fn print_jobs(config: &Config) -> Result<()> {
    let (jobs, _) = jobs(config).wrap_err(Stage::SweepGeneration)?;
    match config.settings.executor {
        Executor::Make => print!("{}", makefile(&jobs, &config.settings)),
        Executor::Local => {
            for job in &jobs {
                println!(
                    "{}: {} {}",
                    job.id,
                    job.invocation.program,
                    job.invocation.args.join(" ")
                );
            }
        }
    }
    Ok(())
}
