use clap::{Parser, Subcommand};
use colored::*;
use moodline::api::Server;
use moodline::builder::{LLMBackend, MoodlineBuilder};
use moodline::config::{Settings, ENV_API_KEY};
use moodline::secret_store::SecretStore;
use moodline::{GenerationResult, Theme};
use spinners::{Spinner, Spinners};
use std::io::IsTerminal;
use std::str::FromStr;

/// Command line arguments for the moodline CLI
#[derive(Parser)]
#[clap(
    name = "moodline",
    about = "Generate short themed messages with an LLM, falling back gracefully"
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,

    /// LLM provider name (openrouter, groq)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Comma-separated model ladder, tried left to right
    #[arg(long, global = true)]
    models: Option<String>,

    /// API key for the provider
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Base URL for the API
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Attempts per model before moving down the ladder
    #[arg(long, global = true)]
    max_attempts: Option<usize>,

    /// Full passes over the ladder
    #[arg(long, global = true)]
    max_passes: Option<usize>,

    /// Temperature setting
    #[arg(long, global = true)]
    temperature: Option<f32>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one message
    Generate {
        /// Theme: wholesome or dark
        theme: String,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the HTTP API
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: String,
    },
    /// Store a secret (e.g. OPENROUTER_API_KEY)
    Set { key: String, value: String },
    /// Show a stored secret
    Get { key: String },
    /// Delete a stored secret
    Delete { key: String },
}

/// Merges CLI flags over environment settings and resolves the API key,
/// looking at the flag, then the environment, then the secret store.
fn resolve_settings(args: &CliArgs) -> Result<Settings, Box<dyn std::error::Error>> {
    let mut settings = Settings::from_env()?;

    if let Some(provider) = &args.provider {
        settings.backend = LLMBackend::from_str(provider)?;
        settings.api_key = std::env::var(ENV_API_KEY)
            .or_else(|_| std::env::var(settings.backend.api_key_env()))
            .ok();
    }
    if let Some(models) = &args.models {
        settings.models = Some(models.parse()?);
    }
    if let Some(url) = &args.base_url {
        settings.base_url = Some(url.clone());
    }
    if let Some(n) = args.max_attempts {
        settings.policy.max_attempts_per_model = n;
    }
    if let Some(n) = args.max_passes {
        settings.policy.max_passes = n;
    }

    settings.api_key = args.api_key.clone().or(settings.api_key).or_else(|| {
        SecretStore::new()
            .ok()
            .and_then(|store| store.api_key_for(&settings.backend).cloned())
    });

    Ok(settings)
}

fn print_result(result: &GenerationResult, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    match result {
        GenerationResult::Validated {
            candidate, model, ..
        } => {
            println!("{}", candidate.final_message.bright_green());
            println!(
                "{}",
                format!("model: {model}  score: {}", candidate.score).dimmed()
            );
        }
        GenerationResult::Fallback { message } => {
            println!("{}", message.yellow());
            println!("{}", "(canned fallback)".dimmed());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    moodline::init_logging();
    let args = CliArgs::parse();

    match &args.command {
        Command::Set { key, value } => {
            let mut store = SecretStore::new()?;
            store.set(key, value)?;
            println!("{} Secret '{}' has been set.", "✓".bright_green(), key);
            return Ok(());
        }
        Command::Get { key } => {
            let store = SecretStore::new()?;
            match store.get(key) {
                Some(value) => println!("{key}: {value}"),
                None => println!("{} Secret '{}' not found", "!".bright_yellow(), key),
            }
            return Ok(());
        }
        Command::Delete { key } => {
            let mut store = SecretStore::new()?;
            store.delete(key)?;
            println!("{} Secret '{}' has been deleted.", "✓".bright_green(), key);
            return Ok(());
        }
        Command::Generate { .. } | Command::Serve { .. } => {}
    }

    let settings = resolve_settings(&args)?;
    let mut builder = MoodlineBuilder::from_settings(&settings);
    if let Some(t) = args.temperature {
        builder = builder.temperature(t);
    }
    let orchestrator = builder.build()?;

    match args.command {
        Command::Generate { theme, json } => {
            // Fail on a bad theme before starting the spinner.
            let theme = Theme::from_str(&theme)?;
            let interactive = std::io::stdout().is_terminal() && !json;
            let mut sp = interactive
                .then(|| Spinner::new(Spinners::Dots12, "Thinking...".bright_magenta().to_string()));
            let result = orchestrator.generate(theme).await;
            if let Some(sp) = sp.as_mut() {
                sp.stop_with_message(String::new());
            }
            print_result(&result, json)?;
        }
        Command::Serve { addr } => {
            println!(
                "{} serving on {} with ladder [{}]",
                "moodline".bright_cyan(),
                addr,
                orchestrator.ladder()
            );
            Server::new(orchestrator).run(&addr).await?;
        }
        Command::Set { .. } | Command::Get { .. } | Command::Delete { .. } => {}
    }

    Ok(())
}
