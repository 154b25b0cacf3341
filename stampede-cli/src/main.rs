use anyhow::{Context, Result};
use clap::Parser;
use stampede_config::{ConfigLoader, LogFormat, StampedeConfig};
use stampede_core::scenario::Scenario;
use stampede_engine::{render_text, Orchestrator};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Cli, Commands, ConfigCommands, ScenarioCommands};

/// Exit code when the run completed but one or more thresholds failed.
const EXIT_THRESHOLDS_FAILED: u8 = 1;

/// Exit code for configuration or runtime errors.
const EXIT_ERROR: u8 = 2;

/// Load configuration from file or use defaults
fn load_config(config_path: Option<&PathBuf>) -> Result<StampedeConfig> {
    let loader = ConfigLoader::new();

    match config_path {
        Some(path) => {
            if path.exists() {
                info!("Loading configuration from: {:?}", path);
                loader
                    .from_file(path)
                    .context(format!("Failed to load configuration from {:?}", path))
            } else {
                warn!("Configuration file not found: {:?}. Using defaults.", path);
                loader
                    .from_env()
                    .context("Failed to load configuration from environment")
            }
        }
        None => {
            debug!("No configuration file specified. Loading from environment or defaults.");
            loader
                .from_env()
                .context("Failed to load configuration from environment")
        }
    }
}

/// Initialize tracing with the configured format and an optional CLI level override
fn init_tracing(config: &StampedeConfig, log_level: Option<&str>) {
    let level = log_level.unwrap_or_else(|| config.logging.level.as_str());

    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', falling back to 'info'", level);
        EnvFilter::new("info")
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_file(config.logging.include_location)
        .with_line_number(config.logging.include_location);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// Load a scenario file, or fall back to the built-in storefront journey
fn load_scenario(scenario_path: Option<&PathBuf>) -> Result<Scenario> {
    match scenario_path {
        Some(path) => {
            info!("Loading scenario from: {:?}", path);
            Scenario::from_yaml_file(path)
                .with_context(|| format!("Failed to load scenario from {:?}", path))
        }
        None => {
            debug!("No scenario file specified. Using built-in storefront journey.");
            Ok(Scenario::storefront())
        }
    }
}

/// Fold `stampede run` flags into the loaded configuration.
///
/// `--duration` and `--users` are shortcuts for the synthesized load
/// envelope; when either is given, explicit stages from the configuration
/// file give way to them.
fn apply_run_overrides(
    config: &mut StampedeConfig,
    base_url: Option<&str>,
    out_json: Option<PathBuf>,
    duration: Option<&str>,
    users: Option<u32>,
) -> Result<()> {
    if let Some(url) = base_url {
        config.target.base_url = url.to_string();
    }

    if let Some(path) = out_json {
        config.output.report_json = Some(path);
    }

    if (duration.is_some() || users.is_some()) && !config.load.stages.is_empty() {
        warn!("Explicit stages in configuration are replaced by --duration/--users overrides");
        config.load.stages.clear();
    }

    if let Some(span) = duration {
        config.load.sustain = humantime::parse_duration(span)
            .map_err(|e| anyhow::anyhow!("Invalid --duration value '{}': {}", span, e))?;
    }

    if let Some(count) = users {
        config.load.spawn_users = count;
    }

    Ok(())
}

/// Execute a load test run and report whether all thresholds passed
async fn handle_run(
    config: StampedeConfig,
    scenario_path: Option<&PathBuf>,
    no_summary: bool,
) -> Result<bool> {
    let scenario = load_scenario(scenario_path)?;

    info!(
        "Running scenario '{}' against {}",
        scenario.name, config.target.base_url
    );

    // Ctrl-C drains active sessions and still produces a report.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, draining active sessions");
            let _ = shutdown_tx.send(true);
        }
    });

    let show_summary = config.output.summary && !no_summary;

    let orchestrator = Orchestrator::new(config, scenario);
    let result = orchestrator
        .run_with_shutdown(shutdown_rx)
        .await
        .context("Failed to execute load test")?;

    if show_summary {
        println!("{}", render_text(&result));
    }

    if !result.passed {
        error!("One or more thresholds failed");
    }

    Ok(result.passed)
}

/// Handle scenario display
fn handle_scenario_show(scenario_path: Option<&PathBuf>) -> Result<()> {
    let scenario = load_scenario(scenario_path)?;

    println!("scenario '{}' ({} steps)", scenario.name, scenario.steps.len());
    for (index, step) in scenario.steps.iter().enumerate() {
        let mut notes = Vec::new();
        if let Some(requires) = &step.requires {
            notes.push(format!("requires {}", requires));
        }
        for extract in &step.extract {
            notes.push(format!("extracts {} from {}", extract.key, extract.pointer));
        }
        if step.expect_status != 200 {
            notes.push(format!("expects {}", step.expect_status));
        }

        let annotations = if notes.is_empty() {
            String::new()
        } else {
            format!("  ({})", notes.join(", "))
        };

        println!(
            "  {}. {} {} {}{}",
            index + 1,
            step.name,
            step.method,
            step.path,
            annotations
        );
    }

    Ok(())
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match load_config(Some(config_file)) {
        Ok(_config) => {
            println!("✅ Configuration file is valid");
            info!("Configuration validation passed");
            Ok(())
        }
        Err(e) => {
            println!("❌ Configuration validation failed: {}", e);
            error!("Configuration validation failed: {}", e);
            Err(e)
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(output: &PathBuf, force: bool) -> Result<()> {
    info!("Generating sample configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }

    fs::write(output, StampedeConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("✅ Sample configuration generated at: {:?}", output);
    println!("📝 Edit the file to point at your target and tune the load profile");
    println!(
        "🔧 Validate with: stampede config validate --config-file {:?}",
        output
    );

    Ok(())
}

/// Handle configuration display
fn handle_config_show(config_file: Option<&PathBuf>, format: &str) -> Result<()> {
    info!("Showing configuration (format: {})", format);

    let config = load_config(config_file)?;

    match format.to_lowercase().as_str() {
        "yaml" | "yml" => {
            let yaml_output =
                serde_yaml::to_string(&config).context("Failed to serialize to YAML")?;
            println!("{}", yaml_output);
        }
        "json" => {
            let json_output =
                serde_json::to_string_pretty(&config).context("Failed to serialize to JSON")?;
            println!("{}", json_output);
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown output format: {}. Valid formats: yaml, json",
                format
            ));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_command(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_THRESHOLDS_FAILED),
        Err(e) => {
            // Tracing may not be initialized when configuration loading fails.
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Dispatch the parsed command line; `Ok(false)` means thresholds failed.
async fn run_command(cli: Cli) -> Result<bool> {
    let config = load_config(cli.config.as_ref())?;
    init_tracing(&config, cli.log_level.as_deref());

    info!("Stampede CLI starting");

    match cli.command {
        Some(Commands::Run {
            base_url,
            scenario,
            out_json,
            duration,
            users,
            no_summary,
        }) => {
            let mut run_config = config;
            apply_run_overrides(
                &mut run_config,
                base_url.as_deref(),
                out_json,
                duration.as_deref(),
                users,
            )?;
            run_config
                .validate_all()
                .context("Configuration invalid after applying command-line overrides")?;

            handle_run(run_config, scenario.as_ref(), no_summary).await
        }
        Some(Commands::Scenario { scenario_cmd }) => match scenario_cmd {
            ScenarioCommands::Show { scenario } => {
                handle_scenario_show(scenario.as_ref())?;
                Ok(true)
            }
        },
        Some(Commands::Config { config_cmd }) => match config_cmd {
            ConfigCommands::Validate { config_file } => {
                handle_config_validate(&config_file)?;
                Ok(true)
            }
            ConfigCommands::Generate { output, force } => {
                handle_config_generate(&output, force)?;
                Ok(true)
            }
            ConfigCommands::Show { config_file, format } => {
                handle_config_show(config_file.as_ref(), &format)?;
                Ok(true)
            }
        },
        None => {
            // If no subcommand is provided, print help
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            cmd.print_help().context("Failed to print help")?;
            Ok(true)
        }
    }
}
