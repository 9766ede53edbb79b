// ===============================
// src/main.rs
// ===============================
/*
 curl -s localhost:9898/metrics | grep '^engine_requests_total'
 curl -s localhost:9898/metrics | grep '^exec_reports_total'
*/
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::{select, sync::mpsc, task::JoinError, time::{interval, Duration}};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use venue_sim::config::{self, FlowMode};
use venue_sim::domain::{ClientMsg, Event, Reply};
use venue_sim::flow::{self, MockFlow};
use venue_sim::gateway::{self, Gateway};
use venue_sim::{metrics, posttrade, recorder, Engine, EngineCfg, Error};

#[tokio::main]
async fn main() -> venue_sim::Result<()> {
    // ---- Logging ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ---- Config ----
    let args = config::load()?;

    // ---- Metrics ----
    metrics::init();
    if let Err(e) = metrics::serve_metrics(args.metrics_port) {
        warn!(?e, port = args.metrics_port, "metrics server disabled");
    }

    info!(
        queue_depth = args.queue_depth,
        record_file = ?args.record_file,
        flow_mode = args.flow_mode.as_str(),
        flow_symbols = ?args.flow_symbols,
        flow_users = ?args.flow_users,
        flow_interval_ms = args.flow_interval_ms,
        "startup config"
    );
    metrics::CONFIG_FLOW_MODE.with_label_values(&[args.flow_mode.as_str()]).set(1);
    metrics::CONFIG_QUEUE_DEPTH.set(args.queue_depth as i64);

    // ---- Recorder (optional) ----
    let (rec_tx, rec_task) = match args.record_file.clone() {
        Some(path) => {
            let (tx, rx) = mpsc::channel::<Event>(8192);
            let task = tokio::spawn(async move {
                if let Err(e) = recorder::run(rx, path).await {
                    error!(?e, "recorder stopped");
                }
            });
            (Some(tx), Some(task))
        }
        None => (None, None),
    };
    if let Some(tx) = &rec_tx {
        let note = format!(
            "startup flow={} queue_depth={}",
            args.flow_mode.as_str(),
            args.queue_depth
        );
        recorder::offer(tx, Event::Note(note), "main");
    }

    // ---- Engine ----
    let (engine, engine_task) = Engine::spawn(EngineCfg {
        queue_depth: args.queue_depth,
        recorder: rec_tx.clone(),
    });

    // ---- Gateway + post-trade ----
    let (msg_tx, msg_rx) = mpsc::channel::<ClientMsg>(1024);
    let (reply_tx, reply_rx) = mpsc::channel::<Reply>(1024);
    let mut gw_task = tokio::spawn(gateway::run(msg_rx, reply_tx, Gateway::new(engine)));

    let handled = Arc::new(AtomicU64::new(0));
    let post_task = tokio::spawn(posttrade::run(reply_rx, rec_tx.clone(), handled.clone()));

    // ---- Client flow ----
    let flow_task = match args.flow_mode {
        FlowMode::Mock => {
            let mock = MockFlow::new(args.flow_symbols.clone(), args.flow_users.clone());
            Some(tokio::spawn(flow::run_mock(msg_tx.clone(), mock, args.flow_interval_ms)))
        }
        FlowMode::Off => {
            info!("no client flow; gateway idle");
            None
        }
    };

    // ---- Heartbeat ----
    let mut beat = interval(Duration::from_secs(1));
    let mut last = 0u64;
    let gw_exit = loop {
        select! {
            _ = beat.tick() => {
                let now = handled.load(Ordering::Relaxed);
                info!(replies = now - last, "heartbeat");
                last = now;
            }
            res = &mut gw_task => break Some(res),
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break None;
            }
        }
    };

    // ---- Shutdown ----
    // Senders go first: the gateway drains, its engine handle and reply_tx drop,
    // engine and post-trade exit and release their rec_tx, then the recorder
    // sees a closed channel and flushes.
    if let Some(task) = flow_task {
        task.abort();
    }
    drop(msg_tx);
    let res = match gw_exit {
        Some(res) => res,
        None => gw_task.await,
    };
    let result = gateway_result(res);
    if let Err(e) = engine_task.await {
        warn!(?e, "engine task ended abnormally");
    }
    if let Err(e) = post_task.await {
        warn!(?e, "post-trade task ended abnormally");
    }
    if let Some(tx) = rec_tx {
        let _ = tx.send(Event::Note("shutdown".into())).await;
    }
    if let Some(task) = rec_task {
        let _ = task.await;
    }
    info!(replies = handled.load(Ordering::Relaxed), "stopped");
    result
}

fn gateway_result(res: Result<venue_sim::Result<()>, JoinError>) -> venue_sim::Result<()> {
    match res {
        Ok(Ok(())) => {
            info!("gateway stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            error!(?e, "gateway failed");
            Err(e)
        }
        Err(e) => {
            error!(?e, "gateway task aborted");
            Err(Error::EngineStopped)
        }
    }
}
