#![deny(unsafe_code)]

//! hostlink CLI: drive a host application's UI subsystem from the shell.

mod script;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use hostlink_config::AppConfig;
use hostlink_core::{AttentionContext, Catalogue, Dispatcher, HostClient, Scope};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// hostlink: a command transport for agents driving a host's UI editor.
#[derive(Parser)]
#[command(name = "hostlink", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "hostlink.toml")]
    config: PathBuf,

    /// Override `host.port` from the configuration.
    #[arg(long)]
    port: Option<u16>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the advertised tool definitions as JSON.
    Tools {
        /// List every registered operation, ignoring the catalogue.
        #[arg(long)]
        all: bool,
    },

    /// Run one operation and print its response.
    Call {
        /// Operation name.
        operation: String,

        /// Parameters as a JSON object.
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Preset an attention scope, e.g. `--with asset=/Game/UI/WBP_Main`.
        #[arg(long = "with", value_name = "SCOPE=VALUE")]
        with: Vec<String>,
    },

    /// Run a JSON script of operations sharing one attention context.
    Run {
        script: PathBuf,

        /// Stop at the first failed step.
        #[arg(long)]
        stop_on_error: bool,
    },

    /// Translate tag markup into a widget document without contacting the host.
    Translate { file: PathBuf },

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, found) = load_config(&cli.config).await?;
    if let Some(port) = cli.port {
        config.host.port = port;
    }

    // Logs go to stderr; stdout carries JSON only.
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
    if !found {
        info!(path = %cli.config.display(), "Config file not found, using defaults");
    }

    match cli.command {
        Commands::Tools { all } => cmd_tools(&config, all).await?,
        Commands::Call {
            operation,
            params,
            with,
        } => cmd_call(&config, &operation, &params, &with).await?,
        Commands::Run {
            script,
            stop_on_error,
        } => cmd_run(&config, &script, stop_on_error).await?,
        Commands::Translate { file } => cmd_translate(&file).await?,
        Commands::Config { show } => {
            println!("{}", config_report(&cli.config, &config, show, found)?)
        }
    }

    Ok(())
}

async fn dispatcher(config: &AppConfig) -> Result<Dispatcher> {
    let client = HostClient::from_config(&config.host)?;
    let mut dispatcher = Dispatcher::new(client);
    if let Some(path) = &config.catalogue.path {
        let catalogue = Catalogue::load(dispatcher.registry(), Path::new(path)).await?;
        dispatcher.set_catalogue(catalogue);
    }
    Ok(dispatcher)
}

async fn cmd_tools(config: &AppConfig, all: bool) -> Result<()> {
    let dispatcher = dispatcher(config).await?;
    let definitions = if all {
        dispatcher.registry().definitions()
    } else {
        dispatcher.tool_definitions()
    };
    let out = json!({
        "system_instruction": dispatcher.catalogue().system_instruction(),
        "tools": definitions,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn cmd_call(config: &AppConfig, operation: &str, params: &str, with: &[String]) -> Result<()> {
    let params: Value = serde_json::from_str(params).context("--params must be valid JSON")?;
    let dispatcher = dispatcher(config).await?;
    let ctx = AttentionContext::new();
    for preset in with {
        let (scope, value) = parse_preset(preset)?;
        ctx.set(scope, value).await;
    }

    let response = dispatcher.dispatch(&ctx, operation, params).await;
    println!("{}", serde_json::to_string_pretty(&response.to_value())?);
    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_run(config: &AppConfig, path: &Path, stop_on_error: bool) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read script '{}'", path.display()))?;
    let steps = script::parse(&text)?;
    let dispatcher = dispatcher(config).await?;
    let ctx = AttentionContext::new();

    info!(steps = steps.len(), "Running script");
    let (results, all_ok) = script::run(&dispatcher, &ctx, steps, stop_on_error).await;
    for result in &results {
        println!("{}", serde_json::to_string(result)?);
    }
    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

async fn cmd_translate(path: &Path) -> Result<()> {
    let markup = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read markup '{}'", path.display()))?;
    let doc = hostlink_core::markup::translate(&markup)?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

/// Output of the `config` subcommand.
fn config_report(path: &Path, config: &AppConfig, show: bool, found: bool) -> Result<String> {
    if show {
        return toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"));
    }
    if found {
        Ok(format!("Configuration at '{}' is valid.", path.display()))
    } else {
        Ok(format!("No configuration at '{}'; using defaults.", path.display()))
    }
}

/// Load the config file, or defaults when it does not exist.
async fn load_config(path: &Path) -> Result<(AppConfig, bool)> {
    if path.exists() {
        let config = AppConfig::load(path)
            .await
            .with_context(|| format!("invalid configuration '{}'", path.display()))?;
        Ok((config, true))
    } else {
        Ok((AppConfig::default(), false))
    }
}

fn parse_preset(preset: &str) -> Result<(Scope, String)> {
    let Some((name, value)) = preset.split_once('=') else {
        bail!("expected SCOPE=VALUE, got '{preset}'");
    };
    let scope = match name.trim() {
        "asset" => Scope::Asset,
        "animation" => Scope::Animation,
        "widget" => Scope::Widget,
        "material" => Scope::Material,
        other => bail!("unknown scope '{other}' (expected asset, animation, widget or material)"),
    };
    Ok((scope, value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostlink_test_utils::config::{TempCatalogue, TestConfigBuilder};
    use hostlink_test_utils::MockHost;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_preset() {
        assert_eq!(
            parse_preset("asset=/Game/A").unwrap(),
            (Scope::Asset, "/Game/A".to_string())
        );
        assert_eq!(parse_preset("widget = Title").unwrap().0, Scope::Widget);
        assert!(parse_preset("asset").is_err());
        assert!(parse_preset("camera=Main").is_err());
    }

    #[tokio::test]
    async fn test_missing_config_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let (config, found) = load_config(&dir.path().join("absent.toml")).await.unwrap();
        assert!(!found);
        assert_eq!(config.host.port, AppConfig::default().host.port);
    }

    #[tokio::test]
    async fn test_config_report_distinguishes_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let absent = dir.path().join("absent.toml");
        let (config, found) = load_config(&absent).await.unwrap();
        let report = config_report(&absent, &config, false, found).unwrap();
        assert!(report.starts_with("No configuration at"), "{report}");
        assert!(!report.contains("valid"));

        let present = dir.path().join("hostlink.toml");
        tokio::fs::write(&present, "[host]\nport = 55600\n").await.unwrap();
        let (config, found) = load_config(&present).await.unwrap();
        let report = config_report(&present, &config, false, found).unwrap();
        assert!(report.ends_with("is valid."), "{report}");

        let shown = config_report(&present, &config, true, found).unwrap();
        assert!(shown.contains("port = 55600"), "{shown}");
    }

    #[tokio::test]
    async fn test_dispatcher_applies_catalogue() {
        let catalogue = TempCatalogue::with_json(r#"{"tools": [{"name": "save_asset"}]}"#).await;
        let host = MockHost::start().await;
        let config = TestConfigBuilder::new()
            .host_port(host.port())
            .catalogue_path(&catalogue.path)
            .build();

        let dispatcher = dispatcher(&config).await.unwrap();
        let names: Vec<_> = dispatcher
            .tool_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["save_asset"]);
        assert_eq!(dispatcher.transport().endpoint(), host.endpoint());
    }

    #[tokio::test]
    async fn test_config_selects_wire_settings() {
        let host = MockHost::builder()
            .framing(hostlink_core::Framing::TextSentinel)
            .start()
            .await;
        let config = TestConfigBuilder::new()
            .host_addr("127.0.0.1")
            .host_port(host.port())
            .framing("text")
            .reassembly("speculative")
            .timeouts_ms(500, 1500, 400)
            .log_level("debug")
            .build();
        config.validate().unwrap();

        let dispatcher = dispatcher(&config).await.unwrap();
        assert_eq!(
            dispatcher.transport().framing(),
            hostlink_core::Framing::TextSentinel
        );
        let resp = dispatcher
            .dispatch(&AttentionContext::new(), "ping", json!({}))
            .await;
        assert!(resp.is_success());
        assert_eq!(host.commands(), vec!["ping"]);
    }
}
