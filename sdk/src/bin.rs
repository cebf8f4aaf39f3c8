//! Binary entry point for `aci`.
//!
//! A thin command-line front end over the SDK: every subcommand maps to one
//! client operation and prints the result as pretty JSON on stdout. Logs go
//! to stderr.

use std::path::PathBuf;

use aci_sdk::{
    meta_function_schemas, Aci, ClientConfig, InferenceProvider, SearchAppsParams,
    SearchFunctionsParams,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

/// aci: search, inspect and execute ACI functions.
///
/// Configuration comes from an optional TOML file and `AIPOLABS_*`
/// environment variables; flags override both.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Config file path (optional).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// API key; overrides the config file and `AIPOLABS_API_KEY`.
    #[arg(long, hide_env_values = true, env = "AIPOLABS_API_KEY")]
    api_key: Option<String>,
    /// Base URL of the API.
    #[arg(long)]
    base_url: Option<String>,
    /// Tool-schema format for definitions (`openai` or `anthropic`).
    #[arg(long)]
    provider: Option<InferenceProvider>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// - No flag: WARN level
    /// - -v: INFO level
    /// - -vv: DEBUG level
    /// - -vvv or more: TRACE level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search apps by intent.
    SearchApps {
        #[arg(long)]
        intent: Option<String>,
        /// Only apps the agent is allowed to use.
        #[arg(long)]
        allowed_only: bool,
        /// Embed each app's functions.
        #[arg(long)]
        include_functions: bool,
        /// Restrict to a category (repeatable).
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Show an app and its functions.
    GetApp { name: String },
    /// Search functions by intent.
    SearchFunctions {
        /// Restrict to an app (repeatable).
        #[arg(long = "app")]
        app_names: Vec<String>,
        #[arg(long)]
        intent: Option<String>,
        /// Only functions of apps with a linked account.
        #[arg(long)]
        configured_only: bool,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Print a function's tool definition.
    Definition { name: String },
    /// Execute a function.
    Execute {
        name: String,
        /// Arguments as a JSON object.
        #[arg(long, default_value = "{}")]
        args: String,
        /// Linked account owner whose credentials are used.
        #[arg(long)]
        owner: String,
    },
    /// Dispatch a tool call the way an agent would (meta functions included).
    Call {
        name: String,
        #[arg(long, default_value = "{}")]
        args: String,
        #[arg(long)]
        owner: String,
    },
    /// Print the meta-function tool schemas.
    MetaSchemas,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn parse_args(raw: &str) -> anyhow::Result<Value> {
    serde_json::from_str(raw).map_err(|e| anyhow::anyhow!("--args is not valid JSON: {e}"))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;
    tracing::debug!(?config, "loaded configuration");
    let output = dispatch(args.command, config)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Config file and environment first, then command-line overrides.
fn load_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(api_key) = &args.api_key {
        config = config.with_api_key(api_key.clone());
    }
    if let Some(base_url) = &args.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(provider) = args.provider {
        config = config.with_inference_provider(provider);
    }
    Ok(config)
}

fn dispatch(command: Command, config: ClientConfig) -> anyhow::Result<Value> {
    // Schemas are static, so they work without an API key.
    match command {
        Command::MetaSchemas => to_json(&meta_function_schemas(config.inference_provider)),
        command => run(&Aci::new(config)?, command),
    }
}

fn run(aci: &Aci, command: Command) -> anyhow::Result<Value> {
    match command {
        Command::SearchApps {
            intent,
            allowed_only,
            include_functions,
            categories,
            limit,
            offset,
        } => to_json(&aci.search_apps(&SearchAppsParams {
            intent,
            allowed_apps_only: allowed_only,
            include_functions,
            categories: (!categories.is_empty()).then_some(categories),
            limit,
            offset,
        })?),
        Command::GetApp { name } => to_json(&aci.get_app(&name)?),
        Command::SearchFunctions {
            app_names,
            intent,
            configured_only,
            limit,
            offset,
        } => to_json(&aci.search_functions(&SearchFunctionsParams {
            app_names: (!app_names.is_empty()).then_some(app_names),
            intent,
            configured_only,
            limit,
            offset,
        })?),
        Command::Definition { name } => Ok(aci.get_function_definition(&name)?),
        Command::Execute { name, args, owner } => {
            to_json(&aci.execute_function(&name, &parse_args(&args)?, &owner)?)
        }
        Command::Call { name, args, owner } => {
            Ok(aci.handle_function_call(&name, &parse_args(&args)?, &owner)?)
        }
        Command::MetaSchemas => Ok(Value::Array(aci.meta_function_schemas())),
    }
}
