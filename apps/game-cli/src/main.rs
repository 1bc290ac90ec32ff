use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use points_backend::config::game::GameConfig;
use points_backend::config::hosted::HostedServiceConfig;
use points_backend::domain::{AccessToken, SessionState};
use points_backend::error::AppError;
use points_backend::services::{AwardForm, GameService, PointsService, TeamNameCache};
use points_backend::{HostedRestBackend, SharedPointsBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "points-game")]
#[command(about = "Classroom points from the terminal: play the team timer, check balances, award points")]
struct Args {
    /// Access token of the signed-in user
    #[arg(long, env = "POINTS_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play the countdown sized by your local team's points
    Play {
        /// Start immediately instead of waiting for Enter
        #[arg(long)]
        auto_start: bool,
    },
    /// Show your balance
    Balance,
    /// Show your latest transactions
    History {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Award points to a student (teachers only)
    Award {
        /// Student email or student code
        identifier: String,
        /// Points to add (negative to deduct)
        #[arg(allow_hyphen_values = true)]
        delta: i64,
        reason: String,
    },
}

struct Services {
    points: PointsService,
    game: GameService,
}

fn services() -> Result<Services, AppError> {
    let hosted = HostedServiceConfig::from_env()?;
    let game_config = GameConfig::from_env()?;
    let backend: SharedPointsBackend = Arc::new(HostedRestBackend::new(&hosted)?);
    let team_names = TeamNameCache::new(backend.clone());
    Ok(Services {
        points: PointsService::new(backend.clone(), team_names, hosted.device_id),
        game: GameService::new(backend, game_config),
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let token = AccessToken::new(args.token);

    match run(args.command, &token).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {}", e.code(), e.detail());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, token: &AccessToken) -> Result<(), AppError> {
    let services = services()?;
    let me = services.points.whoami(token).await?;

    match command {
        Command::Play { auto_start } => play(&services.game, token, &me.user, auto_start).await,
        Command::Balance => {
            let balance = services.points.balance(token, me.user.id).await?;
            println!("{balance}");
            Ok(())
        }
        Command::History { limit } => {
            let rows = services.points.history(token, me.user.id, limit).await?;
            if rows.is_empty() {
                println!("No transactions yet.");
            }
            for row in rows {
                let when = row
                    .created_at
                    .format(&time::format_description::well_known::Rfc3339)
                    .unwrap_or_else(|_| row.created_at.to_string());
                let team = row.team.map(|t| format!("  [{t}]")).unwrap_or_default();
                println!("{when}  {:+}  {}{team}", row.delta, row.reason);
            }
            Ok(())
        }
        Command::Award {
            identifier,
            delta,
            reason,
        } => {
            let form = AwardForm {
                identifier,
                delta,
                reason,
                device_id: None,
            };
            let receipt = services.points.award(token, &me, &form).await?;
            match receipt.new_balance {
                Some(balance) => println!("Awarded {delta:+}. New balance: {balance}"),
                None => println!("Awarded {delta:+}."),
            }
            Ok(())
        }
    }
}

async fn play(
    game: &GameService,
    token: &AccessToken,
    user: &points_backend::domain::UserIdentity,
    auto_start: bool,
) -> Result<(), AppError> {
    let loaded = game.load(token, user).await?;
    let controller = &loaded.controller;
    let mut frames = controller.subscribe();

    println!(
        "Team points: {}  Play time: {}s",
        loaded.points_total,
        controller.frame().play_seconds
    );
    draw(&controller.frame().text());

    if auto_start {
        controller.start();
    } else {
        println!();
        println!("Enter: start   s + Enter: stop   Ctrl-C: quit");
    }

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                draw(&frame.text());
                if frame.status == SessionState::Finished && auto_start {
                    break;
                }
            }
            line = stdin.next_line() => {
                match line {
                    Ok(Some(cmd)) if cmd.trim().eq_ignore_ascii_case("s") => {
                        controller.stop();
                    }
                    Ok(Some(_)) => {
                        controller.start();
                    }
                    // Stdin closed: keep playing until the countdown ends.
                    Ok(None) | Err(_) => {
                        if controller.state() != SessionState::Playing {
                            break;
                        }
                        wait_for_finish(&mut frames).await;
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                controller.stop();
                draw(&controller.frame().text());
                break;
            }
        }
    }

    println!();
    Ok(())
}

async fn wait_for_finish(
    frames: &mut tokio::sync::watch::Receiver<points_backend::domain::GameFrame>,
) {
    while frames.changed().await.is_ok() {
        let frame = frames.borrow_and_update().clone();
        draw(&frame.text());
        if frame.status == SessionState::Finished {
            break;
        }
    }
}

/// Redraw the frame in place.
fn draw(text: &str) {
    let mut out = std::io::stdout().lock();
    let (line, rest) = match text.split_once('\n') {
        Some((line, rest)) => (line, Some(rest)),
        None => (text, None),
    };
    let _ = write!(out, "\r{line}\x1b[K");
    if let Some(rest) = rest {
        let _ = write!(out, "\n{rest}");
    }
    let _ = out.flush();
}
