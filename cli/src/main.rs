use std::io::Write;
use std::time::Duration;

use clap::{Parser, Subcommand};

use cuelight_cli::{CliContext, commands, readline};
use cuelight_core::spawn_action_sweep;

#[tokio::main]
async fn main() -> Result<(), String> {
    cuelight_cli::logging::init();

    let ctx = CliContext::new().await?;
    let _sweep = spawn_action_sweep(
        &ctx.hub,
        Duration::from_millis(ctx.config.sweep_interval_ms),
    );
    tracing::info!(session = %ctx.session, "hub ready");

    loop {
        let line = readline()?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &ctx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(version, about = "cuelight control console")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a timer
    Create {
        #[arg(short, long)]
        title: Option<String>,
        /// Duration in seconds
        #[arg(short, long)]
        duration: Option<u64>,
        /// countdown, countup, or clock
        #[arg(short, long)]
        kind: Option<String>,
    },
    List,
    Select {
        id: String,
    },
    Start {
        id: String,
    },
    Pause {
        id: String,
    },
    Reset {
        id: String,
    },
    Delete {
        id: String,
    },
    /// Add a scheduled action to a timer
    AddAction {
        timer: String,
        /// Remaining time in seconds at which the action fires
        #[arg(short, long)]
        at: u64,
        /// message, color, or both
        #[arg(short, long)]
        kind: Option<String>,
        #[arg(short, long)]
        message: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(short, long)]
        flash: bool,
    },
    Actions {
        timer: String,
    },
    /// Broadcast a message to all viewers
    Say {
        text: String,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(short, long)]
        flash: bool,
        #[arg(short, long)]
        timer: Option<String>,
    },
    Messages,
    Status {
        value: String,
    },
    Visitors {
        #[arg(default_value_t = 1)]
        add: u32,
    },
    VisitorsReset,
    /// Print broadcasts received since the last call
    Events,
    /// Render the current timer for a while
    Watch {
        #[arg(default_value_t = 10)]
        seconds: u64,
    },
    Config,
    Exit,
}

async fn respond(line: &str, ctx: &CliContext) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "cuelight".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Commands::Create {
            title,
            duration,
            kind,
        }) => commands::create_timer(ctx, title, duration, kind).await,
        Some(Commands::List) => commands::list_timers(ctx).await,
        Some(Commands::Select { id }) => commands::select_timer(ctx, &id).await,
        Some(Commands::Start { id }) => commands::start_timer(ctx, &id).await,
        Some(Commands::Pause { id }) => commands::pause_timer(ctx, &id).await,
        Some(Commands::Reset { id }) => commands::reset_timer(ctx, &id).await,
        Some(Commands::Delete { id }) => commands::delete_timer(ctx, &id).await,
        Some(Commands::AddAction {
            timer,
            at,
            kind,
            message,
            color,
            flash,
        }) => commands::add_action(ctx, &timer, at, kind, message, color, flash).await,
        Some(Commands::Actions { timer }) => commands::list_actions(ctx, &timer).await,
        Some(Commands::Say {
            text,
            color,
            flash,
            timer,
        }) => commands::send_message(ctx, text, color, flash, timer).await,
        Some(Commands::Messages) => commands::list_messages(ctx).await,
        Some(Commands::Status { value }) => commands::set_status(ctx, value).await,
        Some(Commands::Visitors { add }) => commands::add_visitors(ctx, add).await,
        Some(Commands::VisitorsReset) => commands::reset_visitors(ctx).await,
        Some(Commands::Events) => commands::show_events(ctx).await,
        Some(Commands::Watch { seconds }) => commands::watch(ctx, seconds).await,
        Some(Commands::Config) => commands::show_config(ctx).await,
        Some(Commands::Exit) => Ok(true),
        None => Ok(false),
    }
}
