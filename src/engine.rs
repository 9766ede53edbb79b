// ===============================
// src/engine.rs (order engine actor)
// ===============================
//
// One task owns the OrderStore and drains a single command queue, so place,
// cancel and query are serialized in arrival order. Every command carries its
// own oneshot reply slot; callers never share a response channel.
//
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::domain::{now_ns, CancelRequest, Event, Order, Outcome, QueryRequest, QueryResult};
use crate::error::{Error, Result};
use crate::ids::IdGenerator;
use crate::metrics::{REQUESTS, RESTING_ORDERS, SERVICE_US};
use crate::recorder;
use crate::store::OrderStore;

#[derive(Debug, Clone)]
pub struct EngineCfg {
    pub queue_depth: usize,
    /// Optional journal; events are dropped (and counted) rather than awaited when it is full.
    pub recorder: Option<mpsc::Sender<Event>>,
}

impl Default for EngineCfg {
    fn default() -> Self { Self { queue_depth: 1024, recorder: None } }
}

enum Command {
    Place { order: Order, reply: oneshot::Sender<Outcome> },
    Cancel { req: CancelRequest, reply: oneshot::Sender<Outcome> },
    Query { req: QueryRequest, reply: oneshot::Sender<QueryResult> },
}

impl Command {
    fn op(&self) -> &'static str {
        match self {
            Command::Place { .. } => "place",
            Command::Cancel { .. } => "cancel",
            Command::Query { .. } => "query",
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Command::{}", self.op())
    }
}

/// Cloneable entry point to the engine. Also the only way to reach the id generator.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
    ids: Arc<IdGenerator>,
}

impl EngineHandle {
    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).await.map_err(|_| Error::EngineStopped)?;
        rx.await.map_err(|_| Error::ReplyDropped)
    }

    // Must not be called from inside the async runtime (tokio panics).
    fn blocking_call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.blocking_send(make(reply)).map_err(|_| Error::EngineStopped)?;
        rx.blocking_recv().map_err(|_| Error::ReplyDropped)
    }

    pub async fn place(&self, order: Order) -> Result<Outcome> {
        self.call(|reply| Command::Place { order, reply }).await
    }

    pub async fn cancel(&self, req: CancelRequest) -> Result<Outcome> {
        self.call(|reply| Command::Cancel { req, reply }).await
    }

    pub async fn query(&self, req: QueryRequest) -> Result<QueryResult> {
        self.call(|reply| Command::Query { req, reply }).await
    }

    pub fn blocking_place(&self, order: Order) -> Result<Outcome> {
        self.blocking_call(|reply| Command::Place { order, reply })
    }

    pub fn blocking_cancel(&self, req: CancelRequest) -> Result<Outcome> {
        self.blocking_call(|reply| Command::Cancel { req, reply })
    }

    pub fn blocking_query(&self, req: QueryRequest) -> Result<QueryResult> {
        self.blocking_call(|reply| Command::Query { req, reply })
    }

    pub fn next_order_id(&self) -> u64 { self.ids.next_order_id() }

    pub fn next_exec_id(&self) -> u64 { self.ids.next_exec_id() }
}

pub struct Engine {
    store: OrderStore,
    rec_tx: Option<mpsc::Sender<Event>>,
}

impl Engine {
    /// Starts the actor on the current tokio runtime.
    pub fn spawn(cfg: EngineCfg) -> (EngineHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel::<Command>(cfg.queue_depth.max(1));
        let engine = Engine { store: OrderStore::new(), rec_tx: cfg.recorder };
        let task = tokio::spawn(engine.run(rx));
        (EngineHandle { tx, ids: Arc::new(IdGenerator::new()) }, task)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        info!("engine: started");
        while let Some(cmd) = rx.recv().await {
            let op = cmd.op();
            let started = Instant::now();
            let outcome = self.handle(cmd);
            SERVICE_US.observe(started.elapsed().as_secs_f64() * 1e6);
            REQUESTS.with_label_values(&[op, outcome.as_str()]).inc();
            RESTING_ORDERS.set(self.store.total() as i64);
        }
        info!("engine: all handles dropped, stopped");
    }

    fn handle(&mut self, cmd: Command) -> Outcome {
        match cmd {
            Command::Place { order, reply } => {
                let record = self.rec_tx.is_some().then(|| order.clone());
                let (id, user, symbol) = (order.id.clone(), order.user.clone(), order.symbol.clone());
                let outcome = self.store.place(order);
                match outcome {
                    Outcome::Placed => info!(%symbol, %id, %user, "order placed"),
                    _ => info!(%symbol, %id, %user, outcome = outcome.as_str(), "order not placed"),
                }
                if let Some(order) = record {
                    self.record(Event::Place { ts_ns: now_ns(), order, outcome });
                }
                Self::answer(reply, outcome, "place");
                outcome
            }
            Command::Cancel { req, reply } => {
                let outcome = self.store.cancel(&req);
                match outcome {
                    Outcome::Cancelled => info!(symbol = %req.symbol, id = %req.orig_id, user = %req.user, "order cancelled"),
                    _ => debug!(id = %req.orig_id, user = %req.user, outcome = outcome.as_str(), "cancel missed"),
                }
                self.record(Event::Cancel { ts_ns: now_ns(), req, outcome });
                Self::answer(reply, outcome, "cancel");
                outcome
            }
            Command::Query { req, reply } => {
                let res = self.store.query(&req);
                let outcome = res.outcome;
                match outcome {
                    Outcome::OrderFound => info!(symbol = %req.symbol, id = %req.orig_id, user = %req.user, "order queried"),
                    _ => debug!(id = %req.orig_id, user = %req.user, outcome = outcome.as_str(), "query missed"),
                }
                self.record(Event::Query { ts_ns: now_ns(), req, outcome });
                Self::answer(reply, res, "query");
                outcome
            }
        }
    }

    fn answer<T>(reply: oneshot::Sender<T>, value: T, op: &'static str) {
        if reply.send(value).is_err() {
            debug!(op, "caller went away before reply");
        }
    }

    fn record(&self, ev: Event) {
        if let Some(tx) = &self.rec_tx {
            recorder::offer(tx, ev, "engine");
        }
    }
}
