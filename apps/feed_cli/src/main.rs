use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use client_core::{
    config::{load_settings, CommitMode},
    gesture::PointerButton,
    DeckSession, JobBoardClient,
};
use shared::domain::Verdict;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod demo;
mod render;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Distance,
    SwipePower,
}

#[derive(Parser, Debug)]
#[command(about = "Swipe through your job feed from the terminal")]
struct Args {
    /// Path to the TOML settings file.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,
    /// Use the built-in sample board instead of the backend.
    #[arg(long)]
    demo: bool,
    /// In demo mode, rate-limit every Nth decision.
    #[arg(long)]
    demo_fail_every: Option<usize>,
    #[arg(long, default_value_t = 300)]
    demo_latency_ms: u64,
}

const HELP: &str = "commands: right | left | drag <dx> | fling <dx> <velocity> | tap | fit | refresh | wait | applied | help | quit";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(token) = args.token {
        settings.token = Some(token);
    }
    if let Some(mode) = args.mode {
        settings.commit_mode = match mode {
            ModeArg::Distance => CommitMode::Distance,
            ModeArg::SwipePower => CommitMode::SwipePower,
        };
    }

    let mut session = if args.demo {
        let board = Arc::new(demo::DemoBoard::new(
            Duration::from_millis(args.demo_latency_ms),
            args.demo_fail_every,
        ));
        DeckSession::new(
            settings.controller_settings(),
            settings.max_in_flight_decisions,
            board.clone(),
            board.clone(),
            board,
        )
    } else {
        let client = Arc::new(JobBoardClient::new(&settings)?);
        tracing::info!(api_url = %client.base_url(), "using job board backend");
        DeckSession::new(
            settings.controller_settings(),
            settings.max_in_flight_decisions,
            client.clone(),
            client.clone(),
            client,
        )
    };

    session.refresh().await;
    println!("{HELP}");
    println!("{}", render::session(&mut session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => {}
            ["q" | "quit" | "exit"] => break,
            ["h" | "help"] => println!("{HELP}"),
            ["r" | "right" | "apply"] => {
                session.commit(Verdict::Accept);
            }
            ["l" | "left" | "pass"] => {
                session.commit(Verdict::Reject);
            }
            ["drag", dx] => match dx.parse::<f32>() {
                Ok(dx) => {
                    session.pointer_down(PointerButton::Primary, 0.0);
                    session.pointer_move(dx / 2.0);
                    session.pointer_move(dx);
                    println!("  {}", render::transform(session.controller().transform()));
                    session.pointer_up();
                }
                Err(_) => println!("drag expects a number of pixels"),
            },
            ["fling", dx, velocity] => match (dx.parse::<f32>(), velocity.parse::<f32>()) {
                (Ok(dx), Ok(velocity)) => {
                    session.fling(dx, velocity);
                }
                _ => println!("fling expects <dx> <velocity>"),
            },
            ["tap"] => {
                session.pointer_down(PointerButton::Primary, 0.0);
                session.pointer_up();
            }
            ["fit"] => {
                if !session.request_fit_check() {
                    println!("fit check already available or running");
                }
            }
            ["refresh"] => session.refresh().await,
            ["wait"] => session.settle_all().await,
            ["applied"] => {
                let accepted = session.controller().accepted();
                if accepted.is_empty() {
                    println!("no applications yet");
                }
                for item in accepted {
                    println!("{:?} {}", item.status, render::card(&item.card));
                }
            }
            _ => println!("unknown command; {HELP}"),
        }
        session.finish_exit();
        session.pump();
        println!("{}", render::session(&mut session));
    }

    session.settle_all().await;
    Ok(())
}
