use std::io::{BufRead, Write};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use ai_mall_client::models::ReportPriority;
use ai_mall_client::service::{
    AccountService, ActiveSession, ChatService, Confirm, NotificationService, RemoveOutcome, SupportService,
};
use ai_mall_client::storage::{SessionStore, SharedStorage};
use ai_mall_client::{view, ApiClient, ClientConfig};

/// Asks on the terminal; anything but `y`/`yes` declines.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

#[derive(Parser)]
#[command(name = "ai_mall")]
#[command(about = "AI Mall client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login { email: String, password: String },
    /// Forget the stored session
    Logout,
    /// Show the signed-in profile
    Whoami,
    /// List marketplace agents
    Agents,
    /// List chat sessions
    Sessions,
    /// Send a chat message
    Chat {
        /// Session id, or `new` to start one
        session: String,
        #[arg(required = true, trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Follow a session live until Ctrl-C
    Watch { session_id: String },
    /// Delete a chat session
    DeleteSession {
        session_id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Show notifications
    Notifications,
    /// File a support report
    Report {
        report_type: String,
        /// low, medium or high
        #[arg(value_parser = parse_priority)]
        priority: ReportPriority,
        #[arg(required = true, trailing_var_arg = true)]
        description: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_mall_client=info,ai_mall=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // ── Wiring ────────────────────────────────────────────────────────────────
    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let storage = SharedStorage::open(&config.data_dir)
        .with_context(|| format!("Failed to open local storage in {}", config.data_dir.display()))?;
    let session = SessionStore::new(storage);
    let api = ApiClient::new(&config, session.clone())?;
    info!("Backend: {}", api.base_url());

    match cli.command {
        Commands::Login { email, password } => {
            let user = AccountService::new(api).login(&email, &password).await?;
            println!("✓ Signed in as {} <{}> ({})", user.name, user.email, user.role);
        }
        Commands::Logout => {
            AccountService::new(api).logout().await?;
            println!("✓ Signed out");
        }
        Commands::Whoami => match session.current() {
            None => println!("Guest"),
            Some(_) => {
                let user = AccountService::new(api).profile().await?;
                println!("{} <{}> ({})", user.name, user.email, user.role);
            }
        },
        Commands::Agents => {
            for agent in api.list_agents().await? {
                let category = agent.category.as_deref().unwrap_or("uncategorized");
                println!("{}  {} [{category}]", agent.id, agent.agent_name);
            }
        }
        Commands::Sessions => {
            let chat = ChatService::new(api, &config);
            let sessions = chat.list_sessions().await?;
            for line in view::sidebar_lines(&sessions, &chat.active()) {
                println!("{line}");
            }
        }
        Commands::Chat { session, message } => {
            let chat = ChatService::new(api, &config);
            chat.open(parse_session(&session)).await;
            let text = message.join(" ");
            match chat.send_message(&text).await {
                Ok(_) => {
                    for line in chat.conversation().read(view::timeline_lines) {
                        println!("{line}");
                    }
                }
                Err(e) => {
                    eprintln!("✗ {e}");
                    if let Some(input) = e.unsent_input() {
                        eprintln!("  Not sent: {input}");
                    }
                    chat.close().await;
                    std::process::exit(1);
                }
            }
            chat.close().await;
        }
        Commands::Watch { session_id } => {
            watch_session(ChatService::new(api, &config), &session_id).await?;
        }
        Commands::DeleteSession { session_id, yes } => {
            let confirm: &dyn Confirm = if yes { &true } else { &StdinConfirm };
            let chat = ChatService::new(api, &config);
            match chat.remove_session(&session_id, confirm).await? {
                RemoveOutcome::Removed => println!("✓ Deleted session {session_id}"),
                RemoveOutcome::Cancelled => println!("Cancelled"),
            }
        }
        Commands::Notifications => {
            let notifications = NotificationService::new(api, &config);
            let list = notifications.refresh().await?;
            for line in view::notification_lines(&list) {
                println!("{line}");
            }
        }
        Commands::Report { report_type, priority, description } => {
            let report = SupportService::new(api, &config)
                .submit_report(&report_type, &description.join(" "), priority)
                .await?;
            println!("✓ Report {} submitted ({:?})", report.id, report.status);
        }
    }

    Ok(())
}

fn parse_priority(arg: &str) -> Result<ReportPriority, String> {
    ReportPriority::try_from(arg.to_string())
}

fn parse_session(arg: &str) -> ActiveSession {
    if arg == "new" {
        ActiveSession::New
    } else {
        ActiveSession::Existing(arg.to_string())
    }
}

/// Follows a session until Ctrl-C, printing messages as polls bring them in.
async fn watch_session(chat: ChatService, session_id: &str) -> anyhow::Result<()> {
    let mut rx = chat.conversation().subscribe();
    chat.open(ActiveSession::Existing(session_id.to_string())).await;
    println!("Watching {session_id} (Ctrl-C to stop)");

    let mut printed = 0;
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let lines = view::timeline_lines(&rx.borrow_and_update());
                if lines.len() < printed {
                    printed = 0;
                }
                for line in &lines[printed..] {
                    println!("{line}");
                }
                printed = lines.len();
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    chat.close().await;
    Ok(())
}
