//! Skinmaker - custom champion skin generation CLI.

use std::process;

use clap::Parser;
use serde::Serialize;

use skinmaker::cli::{Cli, Command, GenerateArgs};
use skinmaker::config::{self, Config};
use skinmaker::context::ServiceContext;
use skinmaker::error::SkinError;
use skinmaker::handler::{
    FailureResponse, Handler, HandlerConfig, HealthReport, SkinMode, SkinRequest,
};
use skinmaker::model::validate_model;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            print_json(&FailureResponse::from_error(&e));
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Returns `Ok(false)` when the command ran but reports an unhealthy state.
async fn run(cli: Cli) -> Result<bool, SkinError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(SkinError::Config)?;
    log::debug!("Config: {}", config_path.display());

    match cli.command {
        Command::Generate(args) => generate(&config, args).await.map(|()| true),
        Command::Health => {
            let report = HealthReport::check(&config);
            print_json(&report);
            if !report.is_ok() {
                eprintln!("Error: no Gemini API key. Set GEMINI_API_KEY or add it to config file.");
            }
            Ok(report.is_ok())
        }
    }
}

async fn generate(config: &Config, args: GenerateArgs) -> Result<(), SkinError> {
    let handler_config =
        HandlerConfig::resolve(config, args.model.as_deref(), args.upload_dir.as_deref());
    let mode = if args.local { SkinMode::Local } else { SkinMode::Ai };

    let (generator, recording_session) = match mode {
        SkinMode::Local => (None, None),
        SkinMode::Ai => {
            validate_model(&handler_config.model).map_err(SkinError::InvalidArgument)?;
            log::debug!("Model: {}", handler_config.model);
            let (ctx, session) = ServiceContext::from_env(config)?;
            (Some(ctx.generator), session)
        }
    };

    let handler = Handler::new(handler_config, generator);
    let request = SkinRequest { photo: args.photo, champion: args.champion, mode };
    let result = handler.generate_skin(&request).await;
    drop(handler);

    if let Some(session) = recording_session {
        match session.finish() {
            Ok(path) => log::info!("Cassette saved: {}", path.display()),
            Err(e) => log::warn!("Failed to save cassette: {e}"),
        }
    }

    print_json(&result?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("Failed to serialize response: {e}"),
    }
}
