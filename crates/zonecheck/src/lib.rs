// # zonecheck - Cloudflare DNS API checks
//
// Thin integration layer behind the `zone-info`, `dns-verify` and
// `dns-verify-legacy` binaries. Each binary only calls [`launch`].
//
// The layer is responsible for:
// 1. Parsing flags and reading configuration from environment variables
// 2. Installing logging (stderr) and, with `--trace`, the request observer
// 3. Building a current-thread runtime and the Cloudflare client
// 4. Printing the report as one JSON line on stdout
//
// All sequencing logic lives in `zonecheck-core`.
//
// ## Example
//
// ```bash
// export CLOUDFLARE_API_TOKEN=your_token
// dns-verify --zone example.com --trace
// ```

pub mod cli;
pub mod config;
pub mod run;

use std::process::ExitCode;

use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub use cli::{Args, Program};
pub use config::Config;

/// Exit codes for the different ways a run can end
///
/// - 0: Report printed
/// - 1: Configuration or usage error
/// - 2: Runtime error (a fatal remote failure)
/// - 3: The zone already holds reserved test records; report printed, nothing changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    ZoneConflict = 3,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status as u8)
    }
}

/// Entry point shared by the binaries
pub fn launch(program: Program) -> ExitCode {
    let args = match cli::parse(program, std::env::args_os()) {
        Ok(args) => args,
        Err(status) => return status.into(),
    };

    if program.requires_zone() && args.zone.is_none() {
        eprintln!("error: --zone is required\n\n{}", program.usage());
        return ExitStatus::ConfigError.into();
    }

    let config = match Config::from_env(program, args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ExitStatus::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return ExitStatus::ConfigError.into();
    }

    let filter = match EnvFilter::try_new(config.log_directives()) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid log filter: {}", e);
            return ExitStatus::ConfigError.into();
        }
    };

    // stdout carries the report only
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitStatus::ConfigError.into();
    }

    for warning in config.warnings() {
        warn!("{}", warning);
    }

    info!("Starting {}", program.name());

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ExitStatus::RuntimeError.into();
        }
    };

    rt.block_on(run_program(&config)).into()
}

async fn run_program(config: &Config) -> ExitStatus {
    let client = match run::build_client(config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Cloudflare client: {}", e);
            return ExitStatus::ConfigError;
        }
    };

    let report = match run::execute(config.program, config.zone.as_deref(), &client).await {
        Ok(report) => report,
        Err(e) => {
            error!("{} failed: {}", config.program.name(), e);
            return ExitStatus::RuntimeError;
        }
    };

    if let Err(e) = report.write_to(std::io::stdout().lock()) {
        error!("Failed to write report: {}", e);
        return ExitStatus::RuntimeError;
    }

    if report.conflicts.is_empty() {
        ExitStatus::Success
    } else {
        ExitStatus::ZoneConflict
    }
}
