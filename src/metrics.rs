// ===============================
// src/metrics.rs
// ===============================
use once_cell::sync::Lazy;
use prometheus::core::Collector;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use tracing::{debug, info, warn};

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Engine --------
pub static REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("engine_requests_total", "engine requests (labels: op, outcome)"),
        &["op", "outcome"],
    )
    .unwrap()
});

pub static RESTING_ORDERS: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("engine_resting_orders", "orders resting in the store").unwrap());

// Time spent inside the actor per request (microseconds)
pub static SERVICE_US: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("engine_service_us", "Per-request service time (us)")
            .buckets(vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1_000.0, 10_000.0]),
    )
    .unwrap()
});

// -------- Gateway --------
pub static EXECS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("exec_reports_total", "execution reports"),
        &["exec_type", "ord_status"],
    )
    .unwrap()
});

pub static SESSION_REJECTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("session_rejects_total", "session-level rejects by field"),
        &["field"],
    )
    .unwrap()
});

// -------- Recorder --------
// Journal events dropped because the recorder queue was full or closed (label: source)
pub static JOURNAL_DROPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("journal_dropped_total", "journal events dropped before the recorder"),
        &["source"],
    )
    .unwrap()
});

// ---- Config visibility ----
pub static CONFIG_FLOW_MODE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("config_flow_mode", "order flow mode (label: mode)"),
        &["mode"],
    )
    .unwrap()
});

pub static CONFIG_QUEUE_DEPTH: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("config_queue_depth", "engine inbound queue depth").unwrap());

/// Registers one collector; a repeat registration counts as success.
pub fn register<C: Collector + Clone + 'static>(name: &str, c: &C) -> bool {
    match REGISTRY.register(Box::new(c.clone())) {
        Ok(()) | Err(prometheus::Error::AlreadyReg) => true,
        Err(e) => {
            warn!(?e, metric = name, "metric registration failed");
            false
        }
    }
}

pub fn init() {
    register("engine_requests_total", &*REQUESTS);
    register("engine_resting_orders", &*RESTING_ORDERS);
    register("engine_service_us", &*SERVICE_US);
    register("exec_reports_total", &*EXECS);
    register("session_rejects_total", &*SESSION_REJECTS);
    register("journal_dropped_total", &*JOURNAL_DROPPED);
    register("config_flow_mode", &*CONFIG_FLOW_MODE);
    register("config_queue_depth", &*CONFIG_QUEUE_DEPTH);
}

pub fn encode_metrics() -> Vec<u8> {
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buf) {
        warn!(?e, "metrics encode failed");
        buf.clear();
    }
    if buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

// Status line and body for a raw request; only `/` and `/metrics` exist.
fn respond(request: &[u8]) -> (&'static str, Vec<u8>) {
    let path = std::str::from_utf8(request)
        .ok()
        .and_then(|r| r.lines().next())
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");
    match path {
        "/" | "/metrics" => ("200 OK", encode_metrics()),
        _ => ("404 Not Found", b"not found\n".to_vec()),
    }
}

// One request per connection.
fn handle_client(mut stream: TcpStream) -> std::io::Result<()> {
    let mut req = [0u8; 1024];
    let n = stream.read(&mut req)?;
    let (status, body) = respond(&req[..n]);
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; version=0.0.4; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )?;
    stream.write_all(&body)?;
    stream.flush()
}

/// Binds before returning so a bad port surfaces to the caller; serving runs on an OS thread.
pub fn serve_metrics(port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)?;
    info!(%addr, "metrics listening (/ and /metrics)");

    thread::spawn(move || {
        for conn in listener.incoming() {
            match conn {
                Ok(stream) => {
                    if let Err(e) = handle_client(stream) {
                        debug!(?e, "metrics client error");
                    }
                }
                Err(e) => warn!(?e, "metrics accept error"),
            }
        }
    });
    Ok(())
}
