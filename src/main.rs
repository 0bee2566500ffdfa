//! vrm-idle - headless idle animation driver
//!
//! Main entry point for the CLI application.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vrm_idle::{
    command::Command,
    config::Config,
    error::VrmIdleError,
    loader::{self, LoadEvent},
    FrameClock, FrameDriver, TypingSignal,
};

/// vrm-idle - Idle pose, blinking, breathing and typing smile for a VRM avatar
#[derive(Parser, Debug)]
#[command(name = "vrm-idle", version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// VRM/GLB model path (overrides config)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Frame rate (overrides config)
    #[arg(long)]
    fps: Option<u32>,

    /// Stop after this many animated frames (0 = run until Ctrl+C or :quit)
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// Print the final frame snapshot as JSON on exit
    #[arg(long)]
    dump: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

enum Flow {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", vrm_idle::NAME, vrm_idle::VERSION);

    let mut config = if let Some(ref path) = args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    if let Some(ref model) = args.model {
        config.avatar.model_path = model.display().to_string();
    }
    if let Some(fps) = args.fps {
        config.frame.fps = fps;
    }
    config.validate()?;

    info!("Model: {}", config.avatar.model_path);
    info!("Frame rate: {} fps", config.frame.fps);

    run(&args, &config).await
}

async fn run(args: &Args, config: &Config) -> anyhow::Result<()> {
    let mut driver = FrameDriver::new(config);
    let mut typing = TypingSignal::new();
    let mut loads = Some(loader::spawn_load(&config.avatar.model_path));
    let mut commands = spawn_stdin_reader();

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / config.frame.fps as f64));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut clock = FrameClock::new();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            Some(command) = commands.recv() => {
                if let Flow::Quit = handle_command(command, &mut driver, &mut typing) {
                    break;
                }
            }
            _ = ticker.tick() => {
                if let Some(rx) = loads.as_mut() {
                    if poll_load(rx, &mut driver)? {
                        loads = None;
                    }
                }

                let dt = clock.delta();
                driver.tick(dt, typing.is_typing());

                if args.frames > 0 && driver.frames() >= args.frames {
                    info!("Animated {} frames", driver.frames());
                    break;
                }
            }
        }
    }

    if args.dump {
        println!("{}", serde_json::to_string_pretty(&driver.snapshot())?);
    }

    info!("vrm-idle stopped");
    Ok(())
}

/// Drain pending loader events without blocking. Returns true once the load
/// has succeeded; a failed load is returned as an error.
fn poll_load(
    rx: &mut mpsc::Receiver<LoadEvent>,
    driver: &mut FrameDriver,
) -> anyhow::Result<bool> {
    while let Ok(event) = rx.try_recv() {
        match event {
            LoadEvent::Progress(percent) => info!("Loading: {:.0}%", percent),
            LoadEvent::Loaded(rig) => {
                info!("VRM loaded successfully");
                driver.on_loaded(rig);
                return Ok(true);
            }
            LoadEvent::Failed(e) => {
                driver.on_load_failed(e.clone());
                return Err(VrmIdleError::Load(e).into());
            }
        }
    }
    Ok(false)
}

fn handle_command(command: Command, driver: &mut FrameDriver, typing: &mut TypingSignal) -> Flow {
    // Pose errors are already logged by the driver
    match command {
        Command::Focus => typing.focus(),
        Command::Blur => typing.blur(),
        Command::Clear => typing.clear(),
        Command::Input(text) => typing.input(&text),
        Command::Pose => {
            let _ = driver.apply_static_pose();
        }
        Command::Arms { down, forward } => {
            let _ = driver.set_upper_arm_pose(down, forward);
        }
        Command::LowerArm { side, x, y, z } => {
            let _ = driver.set_lower_arm_rotation(side, x, y, z);
        }
        Command::Hand { side, x, y, z } => {
            let _ = driver.set_hand_direction(side, x, y, z);
        }
        Command::Sync => {
            let _ = driver.update_all_poses();
        }
        Command::Dump => match serde_json::to_string(&driver.snapshot()) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Failed to serialize snapshot: {}", e),
        },
        Command::Quit => return Flow::Quit,
    }
    Flow::Continue
}

/// Read stdin lines on a separate task and forward parsed commands.
fn spawn_stdin_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(64);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match Command::parse(&line) {
                    Ok(command) => {
                        if tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("{}", e),
                },
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    rx
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
