// ===============================
// src/recorder.rs
// ===============================
//
// JSONL journal of engine events and exec reports:
// - one Event per line, appended
// - BufWriter, flushed every second and every FLUSH_EVERY_N_EVENTS events
// - parent directory created on open
// - on a write error the file is reopened once, then the event is dropped
//
use std::path::Path;
use tokio::{
    fs::{self, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc,
    time::{interval, Duration, MissedTickBehavior},
};
use tracing::{debug, error, info};

use crate::domain::Event;
use crate::error::Result;
use crate::metrics::JOURNAL_DROPPED;

const FLUSH_EVERY_N_EVENTS: u32 = 1000;

async fn open_writer(path: &str) -> std::io::Result<BufWriter<tokio::fs::File>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path).await?;
    Ok(BufWriter::new(file))
}

async fn write_line(writer: &mut BufWriter<tokio::fs::File>, line: &[u8]) -> std::io::Result<()> {
    writer.write_all(line).await?;
    writer.write_all(b"\n").await
}

/// Hands one event to the recorder without waiting; a full or closed queue drops it
/// and bumps `journal_dropped_total{source}`. Returns whether it was queued.
pub fn offer(tx: &mpsc::Sender<Event>, ev: Event, source: &'static str) -> bool {
    match tx.try_send(ev) {
        Ok(()) => true,
        Err(e) => {
            JOURNAL_DROPPED.with_label_values(&[source]).inc();
            debug!(source, reason = %e, "journal event dropped");
            false
        }
    }
}

pub async fn run(mut rx: mpsc::Receiver<Event>, path: String) -> Result<()> {
    let mut writer = open_writer(&path).await?;
    info!(%path, "recorder: started");

    let mut tick = interval(Duration::from_secs(1));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut since_last_flush: u32 = 0;

    loop {
        tokio::select! {
            maybe_ev = rx.recv() => {
                let Some(ev) = maybe_ev else {
                    writer.flush().await?;
                    info!("recorder: channel closed, stopped");
                    return Ok(());
                };
                let line = match serde_json::to_vec(&ev) {
                    Ok(v) => v,
                    Err(e) => {
                        error!(?e, "recorder: serialize error, skip event");
                        continue;
                    }
                };
                if let Err(e) = write_line(&mut writer, &line).await {
                    error!(?e, "recorder: write failed, attempting reopen");
                    writer = open_writer(&path).await?;
                    if let Err(e2) = write_line(&mut writer, &line).await {
                        error!(?e2, "recorder: write failed again after reopen, drop event");
                        continue;
                    }
                }
                since_last_flush += 1;
                if since_last_flush >= FLUSH_EVERY_N_EVENTS {
                    let _ = writer.flush().await;
                    since_last_flush = 0;
                }
            }
            _ = tick.tick() => {
                let _ = writer.flush().await;
                since_last_flush = 0;
            }
        }
    }
}
