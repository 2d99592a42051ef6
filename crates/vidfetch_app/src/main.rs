use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use vidfetch_app::{AppConfig, Cli, Coordinator};
use vidfetch_core::JobRequest;
use vidfetch_engine::{ensure_output_dir, EngineHandle};
use vidfetch_logging::{vid_info, vid_warn};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = AppConfig::resolve(&cli).context("loading configuration")?;

    vidfetch_logging::initialize(
        config.log_destination()?,
        config.log_level()?,
        config.log_file.as_deref(),
    );
    vid_info!("vidfetch {} starting", env!("CARGO_PKG_VERSION"));

    let request = JobRequest {
        url: cli.url.clone(),
        quality: config.quality()?,
        format: config.format()?,
    };
    if config.auto_retrieve {
        ensure_output_dir(&config.output_dir).with_context(|| {
            format!("creating output directory {}", config.output_dir.display())
        })?;
    }

    let (engine, events) =
        EngineHandle::new(config.engine_settings()).context("building HTTP client")?;
    let mut coordinator = Coordinator::new(engine, events, config.auto_retrieve);
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            vid_warn!("Cannot listen for Ctrl-C: {}", err);
            std::future::pending::<()>().await;
        }
    };
    let outcome = coordinator.run(request, interrupt).await;

    vid_info!("Finished: {:?}", outcome);
    if outcome.is_success() {
        println!("{outcome}");
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{outcome}");
        Ok(ExitCode::FAILURE)
    }
}
