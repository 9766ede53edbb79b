// ===============================
// src/gateway.rs (session-facing facade)
// ===============================
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::domain::{
    CancelRequest, ClientMsg, NewOrderSingle, Order, OrderCancelRequest, OrderStatusRequest,
    Outcome, QueryRequest, Reply,
};
use crate::engine::EngineHandle;
use crate::error::Result;
use crate::metrics::{EXECS, SESSION_REJECTS};
use crate::report::{cancel_report, new_order_report, status_report, ReportIds};

/// Checks required fields, calls the engine, and builds the reply for one decoded message.
#[derive(Debug, Clone)]
pub struct Gateway {
    engine: EngineHandle,
}

fn missing(fields: &[(&'static str, &str)]) -> Option<Reply> {
    fields.iter().find(|(_, v)| v.is_empty()).map(|&(name, _)| Reply::SessionReject {
        field: name,
        text: format!("missing required field {name}"),
    })
}

impl Gateway {
    pub fn new(engine: EngineHandle) -> Self { Self { engine } }

    fn ids(&self) -> ReportIds {
        ReportIds { order_id: self.engine.next_order_id(), exec_id: self.engine.next_exec_id() }
    }

    pub async fn new_order_single(&self, msg: NewOrderSingle) -> Result<Reply> {
        if let Some(rej) = missing(&[
            ("ClOrdID", msg.cl_ord_id.as_str()),
            ("SenderSubID", msg.sender_sub_id.as_str()),
            ("Symbol", msg.symbol.as_str()),
        ]) {
            return Ok(rej);
        }
        let order = Order {
            id: msg.cl_ord_id.clone(),
            user: msg.sender_sub_id.clone(),
            symbol: msg.symbol.clone(),
            quantity: msg.order_qty,
            price: msg.price,
            side: msg.side,
            kind: msg.kind,
        };
        let outcome = self.engine.place(order).await?;
        if outcome == Outcome::InvalidRequest {
            return Ok(invalid("ClOrdID"));
        }
        Ok(Reply::Report(new_order_report(self.ids(), &msg, outcome)))
    }

    pub async fn cancel_request(&self, msg: OrderCancelRequest) -> Result<Reply> {
        if let Some(rej) = missing(&[
            ("ClOrdID", msg.cl_ord_id.as_str()),
            ("OrigClOrdID", msg.orig_cl_ord_id.as_str()),
            ("SenderSubID", msg.sender_sub_id.as_str()),
            ("Symbol", msg.symbol.as_str()),
        ]) {
            return Ok(rej);
        }
        let req = CancelRequest {
            symbol: msg.symbol.clone(),
            user: msg.sender_sub_id.clone(),
            orig_id: msg.orig_cl_ord_id.clone(),
        };
        let outcome = self.engine.cancel(req).await?;
        if outcome == Outcome::InvalidRequest {
            return Ok(invalid("OrigClOrdID"));
        }
        Ok(Reply::Report(cancel_report(self.ids(), &msg, outcome)))
    }

    pub async fn status_request(&self, msg: OrderStatusRequest) -> Result<Reply> {
        if let Some(rej) = missing(&[
            ("OrdStatusReqID", msg.ord_status_req_id.as_str()),
            ("SenderSubID", msg.sender_sub_id.as_str()),
            ("Symbol", msg.symbol.as_str()),
        ]) {
            return Ok(rej);
        }
        let req = QueryRequest {
            symbol: msg.symbol.clone(),
            user: msg.sender_sub_id.clone(),
            orig_id: msg.ord_status_req_id.clone(),
        };
        let res = self.engine.query(req).await?;
        match (res.outcome, res.order) {
            (Outcome::OrderFound, Some(order)) => {
                Ok(Reply::Report(status_report(self.ids(), &msg, &order)))
            }
            (Outcome::InvalidRequest, _) => Ok(invalid("OrdStatusReqID")),
            // A miss never yields a zero-qty PartiallyFilled report; it is
            // rejected at session level on the request id instead.
            _ => Ok(Reply::SessionReject { field: "OrdStatusReqID", text: "No Such Order".into() }),
        }
    }

    pub async fn handle(&self, msg: ClientMsg) -> Result<Reply> {
        match msg {
            ClientMsg::NewOrderSingle(m) => self.new_order_single(m).await,
            ClientMsg::CancelRequest(m) => self.cancel_request(m).await,
            ClientMsg::StatusRequest(m) => self.status_request(m).await,
        }
    }
}

fn invalid(field: &'static str) -> Reply {
    Reply::SessionReject { field, text: "invalid request".into() }
}

/// Worker: one decoded message in, one reply out, in arrival order.
pub async fn run(
    mut rx: mpsc::Receiver<ClientMsg>,
    reply_tx: mpsc::Sender<Reply>,
    gw: Gateway,
) -> Result<()> {
    while let Some(msg) = rx.recv().await {
        let reply = gw.handle(msg).await?;
        match &reply {
            Reply::Report(er) => {
                EXECS
                    .with_label_values(&[&format!("{:?}", er.exec_type), &format!("{:?}", er.ord_status)])
                    .inc();
                debug!(order_id = er.order_id, cum = %er.cum_qty, "report built");
            }
            Reply::SessionReject { field, text } => {
                SESSION_REJECTS.with_label_values(&[*field]).inc();
                debug!(%field, %text, "session reject");
            }
        }
        if reply_tx.send(reply).await.is_err() {
            warn!("gateway: reply channel closed, stopping");
            break;
        }
    }
    Ok(())
}
