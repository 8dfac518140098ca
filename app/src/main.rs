use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use comparative::{Layout, render_grid, render_summary};
use common::{config::Executor, error::Stage, record::load_result_sets, sweep::Axis};
use eyre::{Context, Result};
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod bench;

/// Crates whose logs follow `RUST_LOG` unless a `--log` directive names them
const MODULES: [&str; 5] = [
    "common",
    "default_engines",
    "vc_fee",
    "wasmtime_runner",
    "comparative",
];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value_t = false)]
    no_progress: bool,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Args)]
struct SweepArgs {
    #[arg(short, long, default_value = "sweep.yaml")]
    config_file: PathBuf,
    /// Execution engine, replaces the one in the sweep file
    #[arg(long)]
    engine: Option<String>,
    /// Maximum number of jobs in flight
    #[arg(short, long)]
    jobs: Option<usize>,
    /// `make` or `local`
    #[arg(long)]
    executor: Option<Executor>,
}

impl SweepArgs {
    fn overrides(&self) -> bench::Overrides {
        bench::Overrides {
            engine: self.engine.clone(),
            jobs: self.jobs,
            executor: self.executor,
        }
    }
}

#[derive(Args)]
struct PlotArgs {
    /// Output SVG
    output: PathBuf,
    /// Result sets to compare, as `label=path`
    #[arg(required = true)]
    sets: Vec<String>,
    /// `block-size` or `size`
    #[arg(long, default_value = "block-size")]
    axis: Axis,
    /// YAML file with facets, palette and cell size. Without one the grid
    /// shows the facets present in the results
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Plot every other set relative to this one
    #[arg(long)]
    baseline: Option<String>,
}

impl PlotArgs {
    fn layout(&self) -> Result<Option<Layout>> {
        self.layout.as_deref().map(Layout::load).transpose()
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sweep and aggregate its results
    Bench(SweepArgs),
    /// Print the jobs of a sweep without running them
    Print(SweepArgs),
    /// Collect per-job result files into one sorted array
    Aggregate {
        /// Directory of per-job records
        results: PathBuf,
        /// Aggregated JSON output
        output: PathBuf,
        #[arg(long, default_value = "block-size")]
        axis: Axis,
    },
    /// Grid of throughput plots, one cell per facet
    Graph(PlotArgs),
    /// Single plot of selected facets relative to a baseline
    Summary(PlotArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "vfs-bench.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("vfs_bench={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    default_engines::init_engines();

    let result = match args.command {
        Commands::Bench(sweep) => {
            match bench::load_config(&sweep.config_file, sweep.overrides())
                .await
                .wrap_err(Stage::SweepGeneration)
            {
                Ok(config) => bench::run_benchmark(config, !args.no_progress).await,
                Err(err) => Err(err),
            }
        }
        Commands::Print(sweep) => bench::load_config(&sweep.config_file, sweep.overrides())
            .await
            .wrap_err(Stage::SweepGeneration)
            .and_then(|config| bench::print_jobs(&config)),
        Commands::Aggregate {
            results,
            output,
            axis,
        } => bench::aggregate(&results, &output, axis, None).await,
        Commands::Graph(plot) => graph(&plot, false).await,
        Commands::Summary(plot) => graph(&plot, true).await,
    };

    if let Err(err) = result {
        error!("{err:#?}");
        return Err(err);
    }
    Ok(())
}

async fn graph(plot: &PlotArgs, summary: bool) -> Result<()> {
    let layout = plot.layout().wrap_err(Stage::Rendering)?;
    let sets = load_result_sets(&plot.sets)
        .await
        .wrap_err(Stage::Rendering)?;
    let baseline = plot.baseline.as_deref();
    if summary {
        render_summary(&plot.output, &sets, layout.as_ref(), plot.axis, baseline)
    } else {
        render_grid(&plot.output, &sets, layout.as_ref(), plot.axis, baseline)
    }
    .wrap_err(Stage::Rendering)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plot_arguments() {
        let cli = Cli::try_parse_from([
            "vfs-bench",
            "graph",
            "out.svg",
            "wasmtime=wasmtime.json",
            "vc-fee=vc-fee.json",
            "--axis",
            "size",
            "--baseline",
            "wasmtime",
        ])
        .unwrap();
        let Commands::Graph(plot) = cli.command else {
            panic!("expected graph");
        };
        assert_eq!(plot.output, PathBuf::from("out.svg"));
        assert_eq!(plot.sets.len(), 2);
        assert_eq!(plot.axis, Axis::Size);
        assert_eq!(plot.baseline.as_deref(), Some("wasmtime"));
        assert_eq!(plot.layout().unwrap(), None);

        // at least one result set is needed
        assert!(Cli::try_parse_from(["vfs-bench", "summary", "out.svg"]).is_err());
        assert!(Cli::try_parse_from(["vfs-bench", "graph", "out.svg", "a=b", "--axis", "depth"]).is_err());
    }

    #[test]
    fn sweep_arguments() {
        let cli = Cli::try_parse_from([
            "vfs-bench",
            "--no-progress",
            "bench",
            "-c",
            "block-sizes.yaml",
            "--engine",
            "vc-fee",
            "--executor",
            "local",
            "-j",
            "1",
        ])
        .unwrap();
        assert!(cli.no_progress);
        let Commands::Bench(sweep) = cli.command else {
            panic!("expected bench");
        };
        let overrides = sweep.overrides();
        assert_eq!(sweep.config_file, PathBuf::from("block-sizes.yaml"));
        assert_eq!(overrides.engine.as_deref(), Some("vc-fee"));
        assert_eq!(overrides.jobs, Some(1));
        assert_eq!(overrides.executor, Some(Executor::Local));
    }

    #[tokio::test]
    async fn malformed_pair_names_rendering() {
        let plot = PlotArgs {
            output: PathBuf::from("out.svg"),
            sets: vec!["no-separator".to_owned()],
            axis: Axis::BlockSize,
            layout: None,
            baseline: None,
        };
        let err = graph(&plot, false).await.unwrap_err();
        assert_eq!(err.to_string(), Stage::Rendering.to_string());
        assert!(matches!(
            err.root_cause().downcast_ref::<common::error::PipelineError>(),
            Some(common::error::PipelineError::MalformedPair(_))
        ));
    }
    #[tokio::test]
    async fn unwritable_output_names_rendering() {
        let dir = tempfile::tempdir().unwrap();
        let results = dir.path().join("results.json");
        tokio::fs::write(
            &results,
            r#"[{"name":"read_inorder","size":1024,"block_size":64,"runtime":1.0}]"#,
        )
        .await
        .unwrap();

        let mut plot = PlotArgs {
            output: dir.path().join("graph.svg"),
            sets: vec![format!("native={}", results.display())],
            axis: Axis::BlockSize,
            layout: None,
            baseline: None,
        };
        graph(&plot, false).await.unwrap();
        assert!(plot.output.exists());

        plot.output = dir.path().join("missing/graph.svg");
        let err = graph(&plot, false).await.unwrap_err();
        assert_eq!(err.to_string(), Stage::Rendering.to_string());
    }
}
