// SPDX-FileCopyrightText: © 2025 FrameKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use clap::{Parser, Subcommand};
use framekit_core::ServiceRegistry;
use schemars::schema_for;
use tracing::{error, info, warn};

use crate::config;

type LogInitFn = fn(&config::LogConfig) -> Result<(), Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "framekit.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Renders the configured tracks to image files
    Render(RenderArgs),
    /// Lists the built-in services and their parameter schemas as JSON
    Services,
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

impl Default for Commands {
    fn default() -> Self {
        Self::Render(RenderArgs::default())
    }
}

/// Command-line overrides for `[render]`.
#[derive(clap::Args, Debug, Default)]
pub struct RenderArgs {
    /// Number of frames to render
    #[arg(long)]
    pub frames: Option<i64>,
    /// Maximum frames rendered concurrently
    #[arg(long)]
    pub threads: Option<usize>,
    /// Output directory
    #[arg(long)]
    pub out: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate a default config file and print it to stdout
    Default,
    /// Generate a JSON schema for the config and print it to stdout
    Schema,
}

/// Registry with every built-in service.
pub fn builtin_registry() -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    framekit_nodes::register_services(&mut registry);
    registry
}

/// Applies command-line overrides on top of the loaded configuration.
pub fn apply_overrides(config: &mut config::Config, args: &RenderArgs) {
    if let Some(frames) = args.frames {
        config.render.frames = frames;
    }
    if let Some(threads) = args.threads {
        config.render.threads = threads;
    }
    if let Some(out) = &args.out {
        config.render.out_dir.clone_from(out);
    }
}

/// Handle the "render" command
/// Exits the process on error with status code 1
// Allow eprintln before logging is initialized (CLI output)
#[allow(clippy::disallowed_macros)]
async fn handle_render_command(config_path: &str, args: &RenderArgs, init_logging: LogInitFn) {
    let config_result = match config::load(config_path) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        },
    };
    let mut config = config_result.config;
    apply_overrides(&mut config, args);

    if let Err(e) = init_logging(&config.log) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Some(missing_file) = &config_result.file_missing {
        warn!(config_path = %missing_file, "Config file not found, using defaults");
    }

    if let Err(e) = config.frame.validate() {
        error!(error = %e, "Invalid [frame] configuration");
        std::process::exit(1);
    }
    framekit_core::set_frame_defaults(config.frame.clone());

    info!(
        frames = config.render.frames,
        threads = config.render.threads,
        out_dir = %config.render.out_dir,
        tracks = config.render.tracks.len(),
        "Starting framekit render"
    );

    let registry = builtin_registry();
    let producer = match crate::render::build_producer(&registry, &config.render) {
        Ok(producer) => producer,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Failed to build tracks");
            std::process::exit(1);
        },
    };

    if let Err(e) = crate::render::render(producer, &config.render).await {
        error!(error = %format!("{e:#}"), "Render failed");
        std::process::exit(1);
    }
}

/// Handle the "services" command - print service definitions to stdout
// Allow println for CLI output to stdout (intentional)
#[allow(clippy::disallowed_macros)]
fn handle_services_command() {
    let definitions = builtin_registry().definitions();
    match serde_json::to_string_pretty(&definitions) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to serialize service definitions: {e}");
            std::process::exit(1);
        },
    }
}

/// Handle the "config default" command - print default config to stdout
// Allow println for CLI output to stdout (intentional)
#[allow(clippy::disallowed_macros)]
fn handle_config_default_command() {
    match config::generate_default() {
        Ok(toml_string) => {
            println!("# Default framekit configuration file");
            println!("{toml_string}");
        },
        Err(e) => {
            eprintln!("Failed to generate default config: {e}");
            std::process::exit(1);
        },
    }
}

/// Handle the "config schema" command - print JSON schema to stdout
// Allow println for CLI output to stdout (intentional)
#[allow(clippy::disallowed_macros)]
fn handle_config_schema_command() {
    let schema = schema_for!(config::Config);
    match serde_json::to_string_pretty(&schema) {
        Ok(json) => {
            println!("{json}");
        },
        Err(e) => {
            eprintln!("Failed to generate config schema: {e}");
            std::process::exit(1);
        },
    }
}

/// Handle CLI commands
pub async fn handle_command(cli: &Cli, init_logging: LogInitFn) {
    let default_command = Commands::default();
    match cli.command.as_ref().unwrap_or(&default_command) {
        Commands::Render(args) => {
            handle_render_command(&cli.config, args, init_logging).await;
        },
        Commands::Services => {
            handle_services_command();
        },
        Commands::Config(ConfigCommands::Default) => {
            handle_config_default_command();
        },
        Commands::Config(ConfigCommands::Schema) => {
            handle_config_schema_command();
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_render_overrides() {
        let cli = Cli::parse_from(["framekit", "-c", "x.toml", "render", "--frames", "3", "--out", "/tmp/o"]);
        assert_eq!(cli.config, "x.toml");
        let Some(Commands::Render(args)) = cli.command else { panic!("expected render") };

        let mut config = config::Config::default();
        apply_overrides(&mut config, &args);
        assert_eq!(config.render.frames, 3);
        assert_eq!(config.render.out_dir, "/tmp/o");
        assert_eq!(config.render.threads, 4);
    }

    #[test]
    fn no_subcommand_means_render() {
        let cli = Cli::parse_from(["framekit"]);
        assert!(cli.command.is_none());
        assert!(matches!(Commands::default(), Commands::Render(_)));
    }

    #[test]
    fn builtin_registry_lists_services() {
        assert!(builtin_registry().contains("core::mix"));
    }
}
