use std::fs;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use tma_core::auth::hash_password;
use tma_core::prompts::instruction_for;
use tma_core::AnalysisType;
use tma_core::AuthState;
use tma_core::Framework;
use tma_core::SessionAction;
use tma_core::Urgency;
use tma_core::UserAction;
use tma_core::ViewTab;
use tma_exec::AnalysisInvoker;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod host;
mod settings;
mod ui;

use host::Host;

const LOG_ENV: &str = "TMA_LOG";
const DEFAULT_LOG_FILTER: &str = "tma=info";

#[derive(Parser)]
#[command(name = "tma", version)]
#[command(about = "Transformation Management Assistant: change management analysis backed by a language model")]
struct Cli {
    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Answer with canned offline output instead of calling the model service
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal session (default)
    Tui,
    /// Authenticate and run a single analysis
    Analyze {
        /// risk_detection, change_guidance, team_analysis or recommendations
        #[arg(long = "type", value_name = "TAG")]
        analysis_type: String,
        /// Preferred framework for change guidance (adkar, kotter, prosci, mckinsey)
        #[arg(long)]
        framework: Option<String>,
        /// Urgency for recommendations (low, medium, high, critical)
        #[arg(long)]
        urgency: Option<String>,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// Print the logged record as JSON
        #[arg(long)]
        json: bool,
        text: String,
    },
    /// Print the SHA-256 digest of a password for the [auth] config table
    HashPassword { password: String },
    /// List analysis types and their instructions
    Prompts,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);
    let _log_guard = init_tracing(matches!(command, Commands::Tui))?;

    match command {
        Commands::HashPassword { password } => {
            println!("{}", hash_password(&password));
            Ok(())
        }
        Commands::Prompts => {
            for kind in AnalysisType::ALL {
                println!("{} ({})\n  {}\n", kind.label(), kind.tag(), instruction_for(kind));
            }
            Ok(())
        }
        Commands::Tui => {
            let host = build_host(cli.config, cli.offline)?;
            ui::run(host)
        }
        Commands::Analyze {
            analysis_type,
            framework,
            urgency,
            username,
            password,
            json,
            text,
        } => {
            let mut host = build_host(cli.config, cli.offline)?;
            let request = OneShot {
                analysis_type: AnalysisType::from_tag(&analysis_type)
                    .with_context(|| format!("unknown analysis type {analysis_type:?}"))?,
                framework: match framework {
                    Some(raw) => Framework::parse(&raw)
                        .with_context(|| format!("unknown framework {raw:?}"))?,
                    None => Framework::default(),
                },
                urgency: match urgency {
                    Some(raw) => {
                        Urgency::parse(&raw).with_context(|| format!("unknown urgency {raw:?}"))?
                    }
                    None => Urgency::default(),
                },
                text,
            };
            run_analyze(&mut host, &username, &password, request, json)
        }
    }
}

/// Logs go to a file while the TUI owns the terminal, otherwise to stderr.
fn init_tracing(tui: bool) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if !tui {
        builder.with_writer(std::io::stderr).init();
        return Ok(None);
    }

    let Some(path) = settings::log_path() else {
        builder.with_writer(std::io::sink).init();
        return Ok(None);
    };
    let dir = path.parent().map(PathBuf::from).unwrap_or_default();
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let file_name = path.file_name().map(PathBuf::from).unwrap_or_default();
    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    builder.with_writer(writer).with_ansi(false).init();
    Ok(Some(guard))
}

fn build_host(config: Option<PathBuf>, offline: bool) -> Result<Host> {
    let settings = settings::load(config.as_deref())?;
    let invoker =
        AnalysisInvoker::from_settings(&settings.config.model, settings.api_key.clone(), offline)
            .context("failed to set up model provider")?;
    tracing::info!(
        provider = invoker.provider_name().unwrap_or("none"),
        model = %settings.config.model.model,
        "session starting"
    );
    Ok(Host::new(&settings, invoker))
}

struct OneShot {
    analysis_type: AnalysisType,
    framework: Framework,
    urgency: Urgency,
    text: String,
}

fn run_analyze(
    host: &mut Host,
    username: &str,
    password: &str,
    request: OneShot,
    json: bool,
) -> Result<()> {
    let user = SessionAction::User;
    host.dispatch(user(UserAction::LoginPaste(username.to_string())));
    host.dispatch(user(UserAction::LoginToggleField));
    host.dispatch(user(UserAction::LoginPaste(password.to_string())));
    host.dispatch(user(UserAction::LoginSubmit));
    if let AuthState::LoggedOut(form) = &host.state.auth {
        bail!("{}", form.error.as_deref().unwrap_or("Invalid credentials. Please try again."));
    }

    host.dispatch(user(UserAction::SelectTab(ViewTab::Analysis(request.analysis_type))));
    host.dispatch(user(UserAction::SetFramework(request.framework)));
    host.dispatch(user(UserAction::SetUrgency(request.urgency)));
    host.dispatch(user(UserAction::InputPaste(request.text)));
    host.dispatch_blocking(user(UserAction::SubmitAnalysis));

    let Some(record) = host.state.log.all().last() else {
        let message = host
            .state
            .banner
            .as_ref()
            .map(|banner| banner.message.to_string())
            .unwrap_or_else(|| "analysis did not run".to_string());
        bail!(message);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
    } else {
        println!("{}", record.output_text);
    }
    Ok(())
}
