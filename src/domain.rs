// ===============================
// src/domain.rs
// ===============================
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub fn now_ns() -> i128 { Utc::now().timestamp_nanos_opt().unwrap_or(0) as i128 }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side { Buy, Sell }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind { Limit, Market }

/// One resting order. Values handed out of the store are always clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user: String,
    pub symbol: String,
    pub quantity: Decimal,
    pub price: Decimal,
    pub side: Side,
    pub kind: OrderKind,
}

impl Order {
    pub fn matches(&self, id: &str, user: &str) -> bool {
        self.id == id && self.user == user
    }
}

pub type PlaceRequest = Order;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest { pub symbol: String, pub user: String, pub orig_id: String }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest { pub symbol: String, pub user: String, pub orig_id: String }

/// Closed set of business results. `CancelFailed` is reserved and never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Placed,
    OrderExists,
    Cancelled,
    CancelFailed,
    NoSuchOrder,
    OrderFound,
    InvalidRequest,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Placed => "placed",
            Outcome::OrderExists => "order_exists",
            Outcome::Cancelled => "cancelled",
            Outcome::CancelFailed => "cancel_failed",
            Outcome::NoSuchOrder => "no_such_order",
            Outcome::OrderFound => "order_found",
            Outcome::InvalidRequest => "invalid_request",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult { pub outcome: Outcome, pub order: Option<Order> }

impl QueryResult {
    pub fn found(order: Order) -> Self { Self { outcome: Outcome::OrderFound, order: Some(order) } }
    pub fn miss(outcome: Outcome) -> Self { Self { outcome, order: None } }
}

// Decoded session messages handed to the gateway (wire decoding lives outside).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMsg {
    NewOrderSingle(NewOrderSingle),
    CancelRequest(OrderCancelRequest),
    StatusRequest(OrderStatusRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderSingle {
    pub cl_ord_id: String,
    pub sender_sub_id: String,
    pub symbol: String,
    pub side: Side,
    pub kind: OrderKind,
    pub order_qty: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelRequest {
    pub cl_ord_id: String,
    pub orig_cl_ord_id: String,
    pub sender_sub_id: String,
    pub symbol: String,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusRequest {
    pub ord_status_req_id: String,
    pub sender_sub_id: String,
    pub symbol: String,
    pub side: Side,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecType { Fill, Canceled, OrderStatus }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrdStatus { Filled, PartiallyFilled, Canceled, Rejected }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrdRejReason { DuplicateOrder, Broker }

/// Adapter-neutral execution report; the session layer encodes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecReport {
    pub order_id: u64,
    pub exec_id: u64,
    pub exec_type: ExecType,
    pub ord_status: OrdStatus,
    pub rej_reason: Option<OrdRejReason>,
    pub cl_ord_id: Option<String>,
    pub target_sub_id: Option<String>,
    pub symbol: String,
    pub side: Side,
    pub order_qty: Option<Decimal>,
    pub price: Option<Decimal>,
    pub last_qty: Option<Decimal>,
    pub last_px: Option<Decimal>,
    pub avg_px: Option<Decimal>,
    pub leaves_qty: Decimal,
    pub cum_qty: Decimal,
    pub text: Option<String>,
    pub ts_ns: i128,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Report(ExecReport),
    SessionReject { field: &'static str, text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Place { ts_ns: i128, order: Order, outcome: Outcome },
    Cancel { ts_ns: i128, req: CancelRequest, outcome: Outcome },
    Query { ts_ns: i128, req: QueryRequest, outcome: Outcome },
    Exec(ExecReport),
    Note(String),
}
