// ===============================
// src/posttrade.rs
// ===============================
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::{Event, OrdStatus, Reply};
use crate::recorder;

pub async fn run(
    mut reply_rx: mpsc::Receiver<Reply>,
    rec_tx: Option<mpsc::Sender<Event>>,
    handled: Arc<AtomicU64>,
) {
    while let Some(reply) = reply_rx.recv().await {
        handled.fetch_add(1, Ordering::Relaxed);
        match reply {
            Reply::Report(er) => {
                match er.ord_status {
                    OrdStatus::Rejected => warn!(order_id = er.order_id, symbol = %er.symbol, text = ?er.text, "REJECT"),
                    OrdStatus::Filled => info!(order_id = er.order_id, symbol = %er.symbol, qty = %er.cum_qty, "FILLED"),
                    OrdStatus::PartiallyFilled => info!(order_id = er.order_id, symbol = %er.symbol, cum = %er.cum_qty, leaves = %er.leaves_qty, "STATUS"),
                    OrdStatus::Canceled => info!(order_id = er.order_id, symbol = %er.symbol, "CANCELED"),
                }
                if let Some(tx) = &rec_tx {
                    recorder::offer(tx, Event::Exec(er), "posttrade");
                }
            }
            Reply::SessionReject { field, text } => warn!(%field, %text, "SESSION REJECT"),
        }
    }
}
