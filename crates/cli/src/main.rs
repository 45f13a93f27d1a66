mod commands;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use bamboo_cli_api::{ApiError, BambooClient, ClientOptions, DEFAULT_HOST};
use bamboo_cli_config::{password_env_var, Config, Profile};
use bamboo_cli_output::{OutputFormat, OutputRenderer};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bamboo-cli", version, about = "Command-line client for the Bamboo CI server", long_about = None)]
struct Cli {
    /// Profile to use from config file
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Path to config file (defaults to ~/.bamboo-cli/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Bamboo server URL, overriding the profile (e.g. http://bamboo.example.com:8085)
    #[arg(long, env = "BAMBOO_HOST", global = true)]
    host: Option<String>,

    /// Username for basic authentication, overriding the profile
    #[arg(long, env = "BAMBOO_USERNAME", global = true)]
    username: Option<String>,

    /// Prompt for the password when none is configured
    #[arg(long, global = true)]
    ask_password: bool,

    /// Output format for command results
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: BambooCommand,
}

#[derive(Subcommand, Debug, Clone)]
enum BambooCommand {
    /// Check that the server answers and accepts the credentials
    Login(commands::login::LoginArgs),
    /// Plan commands
    #[command(subcommand)]
    Plan(commands::plan::PlanCommand),
    /// Build commands
    #[command(subcommand)]
    Build(commands::build::BuildCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug)?;

    if let Err(err) = run(cli).await {
        if let Some(hint) = err.downcast_ref::<ApiError>().and_then(ApiError::suggestion) {
            eprintln!("hint: {hint}");
        }
        return Err(err);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_ref())?;
    let renderer = OutputRenderer::new(cli.output);
    let profile = resolve_active_profile(&cli, &config)?;
    let client = build_client(&profile)?;

    match cli.command {
        BambooCommand::Login(args) => {
            let target = commands::login::SaveTarget {
                config,
                path: cli.config.as_deref(),
                profile: profile.name.as_deref().unwrap_or(DEFAULT_PROFILE),
                host: &profile.host,
                username: profile.username.as_deref(),
            };
            commands::login::execute(args, &client, &renderer, target).await
        }
        BambooCommand::Plan(command) => commands::plan::execute(command, &client, &renderer).await,
        BambooCommand::Build(command) => {
            commands::build::execute(command, &client, &renderer).await
        }
    }
}

fn init_tracing(debug: bool) -> Result<()> {
    let default = if debug {
        "info,bamboo_cli=debug,bamboo_cli_api=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("failed to initialize logger: {err}"))
}

/// Profile name used when `login --save` runs without any configured profile.
const DEFAULT_PROFILE: &str = "default";

struct ActiveProfile {
    name: Option<String>,
    host: String,
    username: Option<String>,
    password: Option<String>,
    options: ClientOptions,
}

fn saves_profile(command: &BambooCommand) -> bool {
    matches!(command, BambooCommand::Login(args) if args.save)
}

fn non_empty(value: String) -> Option<String> {
    (!value.trim().is_empty()).then_some(value)
}

fn resolve_active_profile(cli: &Cli, config: &Config) -> Result<ActiveProfile> {
    let (name, profile) = match config.resolve_profile(cli.profile.as_deref()) {
        Some((name, profile)) => (Some(name), profile.clone()),
        None if cli.profile.is_some() && !saves_profile(&cli.command) => {
            bail!(
                "Profile '{}' is not configured in {}",
                cli.profile.as_deref().unwrap_or_default(),
                cli.config
                    .clone()
                    .unwrap_or_else(Config::default_path)
                    .display()
            )
        }
        None => (cli.profile.as_deref(), Profile::default()),
    };
    debug!(profile = name.unwrap_or("<none>"), "Resolved profile");

    let host = cli
        .host
        .clone()
        .or(profile.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());
    let username = cli.username.clone().or(profile.username).and_then(non_empty);

    // Password lookup: profile-specific env var → generic env var → config → prompt
    let mut password = name
        .and_then(|name| std::env::var(password_env_var(name)).ok())
        .and_then(non_empty)
        .or_else(|| std::env::var("BAMBOO_PASSWORD").ok().and_then(non_empty))
        .or(profile.password.and_then(non_empty));

    if password.is_none() && username.is_some() && cli.ask_password {
        let prompted = rpassword::prompt_password("Bamboo password: ")
            .context("Unable to read password")?;
        password = non_empty(prompted);
    }

    let mut options = ClientOptions {
        max_pages: profile.max_pages,
        max_chain_depth: profile.max_chain_depth,
        ..Default::default()
    };
    if let Some(secs) = profile.timeout_secs {
        options.timeout = Duration::from_secs(secs);
    }

    Ok(ActiveProfile {
        name: name.map(str::to_string),
        host,
        username,
        password,
        options,
    })
}

fn build_client(profile: &ActiveProfile) -> Result<BambooClient> {
    let client = BambooClient::with_options(&profile.host, profile.options.clone())?;

    Ok(match (&profile.username, &profile.password) {
        (Some(username), Some(password)) => client.with_basic_auth(username, password),
        _ => client,
    })
}
