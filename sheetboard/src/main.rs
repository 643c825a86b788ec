//! `Sheetboard` -- kanban task board client for a Google Sheets backend.
//!
//! One-shot CLI front door over the session controller. The interactive
//! board UI lives elsewhere; this binary covers inspection from a shell.
//!
//! ```bash
//! # List the available boards
//! sheetboard --endpoint https://script.google.com/macros/s/…/exec boards
//!
//! # Show a board, grouped by status column
//! SHEETBOARD_ENDPOINT=https://… sheetboard --board "Projeto A" show
//! ```

use std::sync::Arc;

use clap::Parser;

use sheetboard::config::{CliArgs, ClientConfig, Command};
use sheetboard::gateway::{GatewayConfig, SheetGateway};
use sheetboard::session::BoardSession;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let gateway_config = GatewayConfig {
        timeout: config.http_timeout,
        connect_timeout: config.connect_timeout,
    };
    let gateway = match SheetGateway::new(&config.endpoint, &gateway_config) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut session = BoardSession::new(gateway, config.statuses.clone(), config.quiet_window);

    let exit = match cli.command.unwrap_or(Command::Show) {
        Command::Boards => run_boards(&mut session).await,
        Command::Show => run_show(&mut session, config.default_board).await,
    };
    std::process::exit(exit);
}

/// Prints the available board names, one per line.
async fn run_boards(session: &mut BoardSession) -> i32 {
    session.start().await;
    if let Some(error) = session.last_error() {
        eprintln!("{error}");
        return 1;
    }
    if session.boards().is_empty() {
        println!("Nenhum projeto encontrado.");
    } else {
        for name in session.boards() {
            println!("{name}");
        }
    }
    0
}

/// Prints one board's tasks grouped by status column.
async fn run_show(session: &mut BoardSession, board: Option<String>) -> i32 {
    if let Some(name) = board {
        session.load_board(Some(name)).await;
    } else {
        session.start().await;
    }
    if let Some(error) = session.last_error() {
        eprintln!("{error}");
        return 1;
    }

    if let Some(name) = session.current_board() {
        println!("# {name}");
    }
    for status in session.statuses().labels().to_vec() {
        println!("\n## {status}");
        let column = session.tasks_with_status(&status);
        if column.is_empty() {
            println!("  (vazio)");
        }
        for task in column {
            if task.description.is_empty() {
                println!("  [{}] {}", task.id, task.title);
            } else {
                println!("  [{}] {} — {}", task.id, task.title, task.description);
            }
        }
    }
    0
}
