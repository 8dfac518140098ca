use std::{fmt::Write as _, io::ErrorKind, path::Path};

use eyre::{Context, Result, bail};
use futures::{TryStreamExt, stream};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::{
    fs::{create_dir_all, remove_dir_all, write},
    process::Command,
};
use tracing::{debug, info, warn};

use crate::{
    config::{Executor, Settings},
    engine::{Engine, ScratchIsolation},
    error::PipelineError,
    job::Job,
    util::{run_program, shell_quote},
};

pub const MAKEFILE_NAME: &str = "bench.mk";

/// Number of jobs allowed in flight, `None` leaves the choice to `make`
pub fn concurrency(engine: &dyn Engine, settings: &Settings) -> Result<Option<usize>> {
    let shared = engine.scratch() == ScratchIsolation::Shared;
    match settings.jobs {
        Some(0) => bail!("jobs must be at least 1"),
        Some(jobs) if shared && jobs > 1 => bail!(PipelineError::SharedScratch {
            engine: engine.name(),
            jobs,
        }),
        Some(jobs) => Ok(Some(jobs)),
        None if shared => Ok(Some(1)),
        None => match settings.executor {
            Executor::Make => Ok(None),
            Executor::Local => Ok(Some(num_cpus::get())),
        },
    }
}

/// Creates the sweep root and empties scratch and results from earlier batches
pub async fn prepare_root(settings: &Settings) -> Result<()> {
    let root = &settings.root;
    create_dir_all(root)
        .await
        .with_context(|| format!("Creating {}", root.display()))?;
    if !root.join(&settings.programs).exists() {
        warn!(
            "Programs dir {} does not exist",
            root.join(&settings.programs).display()
        );
    }
    reset_dir(&root.join(&settings.scratch)).await?;
    reset_dir(&root.join(&settings.results)).await?;
    Ok(())
}

async fn reset_dir(dir: &Path) -> Result<()> {
    remove_dir_if_exists(dir).await?;
    create_dir_all(dir)
        .await
        .with_context(|| format!("Creating {}", dir.display()))
}

async fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match remove_dir_all(dir).await {
        Err(err) if err.kind() != ErrorKind::NotFound => {
            Err(err).with_context(|| format!("Removing {}", dir.display()))
        }
        _ => Ok(()),
    }
}

/// Runs the whole batch, returning the first failure
pub async fn run_jobs(
    jobs: &[Job],
    engine: &dyn Engine,
    settings: &Settings,
    progress: bool,
) -> Result<()> {
    let bound = concurrency(engine, settings)?;
    prepare_root(settings).await?;
    info!(
        "Running {} jobs with {} (executor={}, jobs={})",
        jobs.len(),
        engine.name(),
        settings.executor,
        bound.map_or("MAKEFLAGS".to_owned(), |x| x.to_string())
    );

    match settings.executor {
        Executor::Make => run_make(jobs, settings, bound).await,
        Executor::Local => run_local(jobs, settings, bound.unwrap_or(1), progress).await,
    }
}

/// One phony rule per job plus an `all` target depending on every job
pub fn makefile(jobs: &[Job], settings: &Settings) -> String {
    let root = shell_quote(&settings.root.to_string_lossy());
    let mut mk = String::new();
    _ = writeln!(mk, ".PHONY: all");
    _ = write!(mk, "all:");
    for job in jobs {
        _ = write!(mk, " \\\n\t{}", job.id);
    }
    _ = writeln!(mk);

    for job in jobs {
        let scratch = shell_quote(&settings.root.join(&job.paths.scratch).to_string_lossy());
        let cmd = std::iter::once(&job.invocation.program)
            .chain(job.invocation.args.iter())
            .map(|x| shell_quote(x))
            .collect::<Vec<_>>()
            .join(" ");
        _ = writeln!(mk);
        _ = writeln!(mk, ".PHONY: {}", job.id);
        _ = writeln!(mk, "{}:", job.id);
        _ = writeln!(mk, "\tmkdir -p {scratch}");
        _ = writeln!(mk, "\tcd {root} && {cmd}");
        _ = writeln!(mk, "\trm -rf {scratch}");
    }
    mk
}

async fn run_make(jobs: &[Job], settings: &Settings, bound: Option<usize>) -> Result<()> {
    let mk_path = settings.root.join(MAKEFILE_NAME);
    write(&mk_path, makefile(jobs, settings))
        .await
        .with_context(|| format!("Writing {}", mk_path.display()))?;

    let mut args = vec!["-f".to_owned(), mk_path.to_string_lossy().into_owned()];
    if let Some(bound) = bound {
        args.push(format!("-j{bound}"));
    }
    args.push("all".to_owned());
    debug!("make {}", args.join(" "));

    // make stops scheduling new rules once one fails
    let status = Command::new("make")
        .args(&args)
        .kill_on_drop(true)
        .status()
        .await
        .context("Spawning make")?;
    if !status.success() {
        bail!(PipelineError::JobFailed {
            program: "make".to_owned(),
            status,
            job: None,
        });
    }
    Ok(())
}

async fn run_local(jobs: &[Job], settings: &Settings, bound: usize, progress: bool) -> Result<()> {
    let pb = if progress {
        let pb = ProgressBar::new(jobs.len() as u64);
        pb.set_style(ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}",
        )?);
        Some(pb)
    } else {
        None
    };

    let root = settings.root.as_path();
    let result = stream::iter(jobs.iter().map(Ok::<_, eyre::Report>))
        .try_for_each_concurrent(bound, |job| {
            let pb = pb.clone();
            async move {
                run_job(root, job).await?;
                if let Some(pb) = pb {
                    pb.inc(1);
                }
                Ok::<_, eyre::Report>(())
            }
        })
        .await;

    if let Some(pb) = &pb {
        match &result {
            Ok(()) => pb.finish_with_message("done"),
            Err(_) => pb.abandon_with_message("failed"),
        }
    }
    result
}

async fn run_job(root: &Path, job: &Job) -> Result<()> {
    let scratch = root.join(&job.paths.scratch);
    create_dir_all(&scratch)
        .await
        .with_context(|| format!("Creating {}", scratch.display()))?;
    run_program(
        &job.invocation.program,
        &job.invocation.args,
        root,
        Some(job.id.as_str()),
    )
    .await?;
    remove_dir_if_exists(&scratch).await?;
    debug!("Done with {}", job.id);
    Ok(())
}
