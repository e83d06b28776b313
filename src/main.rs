// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Invigilator - remote proctoring event pipeline
//!
//! Runs the session store API and, in demo mode, a simulated candidate
//! driven through the full monitor and delivery pipeline.

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use invigilator::core::{EventBus, Monitor, NoticeLevel, Scheduler};
use invigilator::delivery::{EventDelivery, FileSessionIdStorage, HttpSessionApi, PendingQueue};
use invigilator::inference::{
    Frame, InferenceAdapter, ObjectDetector, SimulatedCandidate, SimulatedFaceModel,
    SimulatedObjectModel,
};
use invigilator::server::{self, AppState};
use invigilator::store::SessionStore;
use invigilator::{compute_integrity_score, Config, VERSION};

/// Invigilator - remote proctoring event pipeline
#[derive(Parser, Debug)]
#[command(name = "invigilator")]
#[command(author = "Invigilator Project")]
#[command(version = VERSION)]
#[command(about = "Proctoring event detection, delivery and reporting")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Session store port
    #[arg(short, long)]
    port: Option<u16>,

    /// Demo mode with a simulated candidate
    #[arg(long)]
    demo: bool,

    /// Session store base URL used by the demo client
    #[arg(long)]
    server_url: Option<String>,

    /// Candidate name sent when opening a session
    #[arg(long)]
    candidate: Option<String>,

    /// Enable object detection
    #[arg(long)]
    objects: bool,

    /// Full-quality mode (denser face and object cadence)
    #[arg(long)]
    full_quality: bool,

    /// Directory holding the persisted session id
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Don't start the session store in this process
    #[arg(long)]
    no_server: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Invigilator v{}", VERSION);

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(data_dir) = args.data_dir {
        config.delivery.storage_path = data_dir.join("session_id");
    }
    if let Some(port) = args.port {
        config.server.port = port;
        if args.server_url.is_none() {
            config.delivery.server_url = format!("http://127.0.0.1:{}/api", port);
        }
    }
    if let Some(url) = args.server_url {
        config.delivery.server_url = url;
    }
    if let Some(name) = args.candidate {
        config.delivery.candidate_name = Some(name);
    }
    if args.objects {
        config.monitor.objects_enabled = true;
    }
    if args.full_quality {
        config.monitor.performance_mode = false;
    }

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, !args.no_server))
}

async fn run(config: Config, with_server: bool) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let server = if with_server {
        let listener = tokio::net::TcpListener::bind(config.server.bind_addr()).await?;
        let state = AppState::new(Arc::new(SessionStore::new()), config.server.clone());
        let mut shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(server::serve(listener, state, async move {
            let _ = shutdown.recv().await;
        })))
    } else {
        None
    };

    if config.demo_mode {
        run_demo(&config).await?;
    } else {
        info!("Press Ctrl+C to shutdown");
        tokio::signal::ctrl_c().await?;
        info!("Shutdown signal received");
    }
    let _ = shutdown_tx.send(());

    if let Some(server) = server {
        if let Err(e) = server.await? {
            warn!("Server stopped with error: {}", e);
        }
    }

    info!("Invigilator shutdown complete");
    Ok(())
}

/// Drive a simulated candidate through the monitor and delivery pipeline
async fn run_demo(config: &Config) -> Result<()> {
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let started_at = Utc::now();
    let candidate = Arc::new(SimulatedCandidate::new(started_at));

    let object_model: Option<Box<dyn ObjectDetector>> = if config.monitor.objects_enabled {
        Some(Box::new(SimulatedObjectModel::new(candidate.clone())))
    } else {
        None
    };
    let mut adapter = InferenceAdapter::new(
        Some(Box::new(SimulatedFaceModel::new(candidate.clone()))),
        object_model,
    );
    adapter.initialize().await;

    let queue = Arc::new(PendingQueue::new());
    let bus = Arc::new(EventBus::default());
    let monitor = Arc::new(Monitor::new(
        config.monitor.clone(),
        config.detection.clone(),
        adapter,
        queue.clone(),
        bus.clone(),
        started_at,
    ));

    let api = HttpSessionApi::new(&config.delivery.server_url, config.delivery.request_timeout())?;
    let delivery = Arc::new(EventDelivery::new(
        Arc::new(api),
        Arc::new(FileSessionIdStorage::new(&config.delivery.storage_path)),
        queue,
        config.delivery.candidate_name.clone(),
    ));
    match delivery.ensure_session().await {
        Ok(id) => info!(session = %id, "Monitoring session"),
        Err(e) => warn!("Session store unreachable, events will queue: {}", e),
    }

    let scheduler = Scheduler::new();
    let flusher = delivery.clone();
    scheduler
        .add_task("flush", config.delivery.flush_interval(), move || {
            let delivery = flusher.clone();
            async move {
                delivery.flush().await;
            }
        })
        .await;

    // Operator toasts
    let mut notices = bus.subscribe_notices();
    let toasts = tokio::spawn(async move {
        while let Ok(notice) = notices.recv().await {
            let description = notice.description.unwrap_or_default();
            match notice.level {
                NoticeLevel::Error | NoticeLevel::Warning => {
                    warn!("[toast] {} {}", notice.title, description)
                }
                _ => info!("[toast] {} {}", notice.title, description),
            }
        }
    });
    monitor.announce_model_status();

    // Frame source
    let (frame_tx, frame_rx) = mpsc::channel::<Frame>(1);
    let (width, height) = if config.monitor.performance_mode {
        (320, 240)
    } else {
        (640, 480)
    };
    let interval = config.monitor.frame_interval();
    let mut source_shutdown = shutdown_tx.subscribe();
    let source = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut sequence = 0u64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sequence += 1;
                    // a full channel means the monitor is still busy
                    let _ = frame_tx.try_send(Frame::new(sequence, Utc::now(), width, height));
                }
                _ = source_shutdown.recv() => break,
            }
        }
    });

    let runner = monitor.clone();
    let monitor_shutdown = shutdown_tx.subscribe();
    let monitor_task = tokio::spawn(async move { runner.run(frame_rx, monitor_shutdown).await });

    info!("Demo running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, flushing...");

    let _ = shutdown_tx.send(());
    let _ = source.await;
    let _ = monitor_task.await;
    scheduler.shutdown().await;
    toasts.abort();

    let outcome = delivery.flush().await;
    info!("Final flush: {:?}", outcome);
    if !delivery.queue().is_empty() {
        warn!("{} events left undelivered", delivery.queue().len());
    }

    let log = monitor.display_log();
    let score = compute_integrity_score(&log);
    info!(
        events = log.len(),
        score = score.score,
        session = ?delivery.session_id(),
        "Demo summary"
    );

    Ok(())
}
