use clap::{Args, Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fusion_eval::config::{ConfigManager, CONFIG_FILE_NAME};
use fusion_eval::evaluation::{
    generate_test_configuration, write_report, write_test_configuration, Evaluator, HostProbe,
    HostSnapshot, Report, SystemProbe,
};
use fusion_eval::runner::EvaluatorCommand;
use fusion_eval::server::ServerSettings;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the weight and folder dashboard
    Serve(ServeArgs),
    /// Evaluate all dimensions and write a report
    Evaluate(EvaluateArgs),
    /// Write a test configuration derived from the current weights
    TestConfig(TestConfigArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "FUSION_EVAL_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    #[arg(short, long, env = "FUSION_EVAL_PORT", default_value_t = 5000)]
    port: u16,

    /// Folder holding reports and generated test configurations
    #[arg(long, env = "FUSION_EVAL_SOURCE_DIR", default_value = "reports")]
    source_dir: PathBuf,

    /// Folder of test configurations mounted for the test runner
    #[arg(long, env = "FUSION_EVAL_TARGET_DIR", default_value = "test_configs")]
    target_dir: PathBuf,

    /// Command run by the dashboard's evaluator button
    /// (defaults to this binary's `evaluate` subcommand)
    #[arg(long, env = "FUSION_EVAL_EVALUATOR_CMD")]
    evaluator_cmd: Option<String>,

    /// Working directory of the evaluator process
    #[arg(long, env = "FUSION_EVAL_EVALUATOR_DIR")]
    evaluator_dir: Option<PathBuf>,

    /// Kill the evaluator after this long, e.g. "60s" or "2m"
    #[arg(long, env = "FUSION_EVAL_EVALUATOR_TIMEOUT", default_value = "60s", value_parser = humantime::parse_duration)]
    evaluator_timeout: Duration,

    /// Open the dashboard in the default browser once listening
    #[arg(long)]
    open: bool,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    /// Folder the report and test configuration are written to
    #[arg(short, long, env = "FUSION_EVAL_OUTPUT_DIR", default_value = "reports")]
    output_dir: PathBuf,

    /// Skip the simulated per-dimension delay
    #[arg(long)]
    no_delay: bool,
}

#[derive(Args, Debug)]
struct TestConfigArgs {
    #[arg(short, long, env = "FUSION_EVAL_OUTPUT_DIR", default_value = "reports")]
    output_dir: PathBuf,
}

#[derive(Parser, Debug)]
#[command(name = "fusion-eval")]
#[command(about = "Weighted multi-dimension evaluation with a web dashboard", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the evaluation config
    #[arg(short, long, global = true, env = "FUSION_EVAL_CONFIG", default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Serve(args) => serve(cli.config, args).await,
        Commands::Evaluate(args) => evaluate(cli.config, args).await,
        Commands::TestConfig(args) => test_config(cli.config, args).await,
    };
    std::process::exit(code);
}

async fn serve(config_path: PathBuf, args: ServeArgs) -> i32 {
    let evaluator = match &args.evaluator_cmd {
        Some(line) => EvaluatorCommand::from_command_line(line, args.evaluator_timeout)
            .map_err(anyhow::Error::from),
        None => EvaluatorCommand::current_exe(config_path.clone(), args.source_dir.clone())
            .map(|cmd| EvaluatorCommand {
                timeout: args.evaluator_timeout,
                ..cmd
            })
            .map_err(anyhow::Error::from),
    };
    let evaluator = match evaluator {
        Ok(cmd) => EvaluatorCommand {
            working_dir: args.evaluator_dir,
            ..cmd
        },
        Err(e) => {
            error!(error = %e, "invalid evaluator command");
            return EXIT_CONFIG;
        }
    };

    let addr = SocketAddr::new(args.host, args.port);
    let settings = ServerSettings {
        config_path,
        source_dir: args.source_dir,
        target_dir: args.target_dir,
        evaluator,
    };

    let listener = match fusion_eval::server::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %format!("{:#}", e), "cannot listen on configured address");
            return EXIT_CONFIG;
        }
    };

    if args.open {
        let url = fusion_eval::browser::dashboard_url(addr);
        if let Err(e) = fusion_eval::browser::open_url(&url) {
            warn!(error = %format!("{:#}", e), "could not open browser");
        }
    }

    match fusion_eval::server::serve(listener, settings).await {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "dashboard stopped");
            EXIT_FAILURE
        }
    }
}

/// Take a host snapshot off the async executor; falls back to an idle
/// snapshot when the host cannot be probed.
async fn host_snapshot(probe: Arc<dyn HostProbe>) -> HostSnapshot {
    let outcome = tokio::task::spawn_blocking(move || probe.snapshot()).await;
    match outcome {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            warn!(error = %format!("{:#}", e), "host probe failed, using idle snapshot");
            HostSnapshot::default()
        }
        Err(e) => {
            warn!(error = %e, "host probe task failed, using idle snapshot");
            HostSnapshot::default()
        }
    }
}

async fn evaluate(config_path: PathBuf, args: EvaluateArgs) -> i32 {
    let config = ConfigManager::load(&config_path);
    let probe: Arc<dyn HostProbe> = Arc::new(SystemProbe);

    let snapshot = host_snapshot(Arc::clone(&probe)).await;
    let document = generate_test_configuration(&config, &snapshot);
    match write_test_configuration(&args.output_dir, &document) {
        Ok(path) => info!(path = %path.display(), "wrote test configuration"),
        Err(e) => {
            error!(error = %format!("{:#}", e), "failed to write test configuration");
            return EXIT_FAILURE;
        }
    }

    let target_url = config.target_url().to_string();
    let generate_report = config.generate_report();
    let evaluator = Evaluator::new(config, probe).simulate_latency(!args.no_delay);

    let run = match evaluator.run().await {
        Ok(run) => run,
        Err(e) => {
            error!(error = %format!("{:#}", e), "evaluation failed");
            return EXIT_FAILURE;
        }
    };

    let report = Report::from_run(run, &target_url);
    println!(
        "{}",
        fusion_eval::output::format_report(&report, fusion_eval::output::should_use_colors())
    );

    if generate_report {
        match write_report(&args.output_dir, &report) {
            Ok(path) => info!(path = %path.display(), "wrote evaluation report"),
            Err(e) => {
                error!(error = %format!("{:#}", e), "failed to write report");
                return EXIT_FAILURE;
            }
        }
    }

    EXIT_SUCCESS
}

async fn test_config(config_path: PathBuf, args: TestConfigArgs) -> i32 {
    let config = ConfigManager::load(&config_path);
    let snapshot = host_snapshot(Arc::new(SystemProbe)).await;
    let document = generate_test_configuration(&config, &snapshot);

    match write_test_configuration(&args.output_dir, &document) {
        Ok(path) => {
            println!("{}", path.display());
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "failed to write test configuration");
            EXIT_FAILURE
        }
    }
}
