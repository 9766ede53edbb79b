// ===============================
// src/flow.rs
// ===============================
//
// Mock client flow: random NewOrderSingle / cancel / status traffic against the
// gateway, standing in for a session client. Mix per step:
//   ~60% new order (1 in 10 reuses a previous ClOrdID -> duplicate)
//   ~20% cancel of a previously sent id
//   ~20% status request of a previously sent id
//
use rand::Rng;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::domain::{
    ClientMsg, NewOrderSingle, OrderCancelRequest, OrderKind, OrderStatusRequest, Side,
};

const RECENT: usize = 256;

#[derive(Debug, Clone)]
struct Sent { cl_ord_id: String, user: String, symbol: String, side: Side }

pub struct MockFlow {
    symbols: Vec<String>,
    users: Vec<String>,
    next_id: u64,
    recent: VecDeque<Sent>,
}

impl MockFlow {
    pub fn new(symbols: Vec<String>, users: Vec<String>) -> Self {
        Self { symbols, users, next_id: 0, recent: VecDeque::with_capacity(RECENT) }
    }

    fn new_order<R: Rng>(&mut self, rng: &mut R) -> ClientMsg {
        let reuse = !self.recent.is_empty() && rng.gen_range(0..10) == 0;
        let (cl_ord_id, user, symbol) = if reuse {
            let s = &self.recent[rng.gen_range(0..self.recent.len())];
            (s.cl_ord_id.clone(), s.user.clone(), s.symbol.clone())
        } else {
            self.next_id += 1;
            (
                self.next_id.to_string(),
                self.users[rng.gen_range(0..self.users.len())].clone(),
                self.symbols[rng.gen_range(0..self.symbols.len())].clone(),
            )
        };
        let side = if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell };
        let kind = if rng.gen_range(0..5) == 0 { OrderKind::Market } else { OrderKind::Limit };
        let price = match kind {
            OrderKind::Market => Decimal::ZERO,
            OrderKind::Limit => Decimal::new(rng.gen_range(9_00i64..=11_00), 2),
        };
        if !reuse {
            if self.recent.len() == RECENT {
                self.recent.pop_front();
            }
            self.recent.push_back(Sent {
                cl_ord_id: cl_ord_id.clone(),
                user: user.clone(),
                symbol: symbol.clone(),
                side,
            });
        }
        ClientMsg::NewOrderSingle(NewOrderSingle {
            cl_ord_id,
            sender_sub_id: user,
            symbol,
            side,
            kind,
            order_qty: Decimal::from(rng.gen_range(1i64..=20) * 10),
            price,
        })
    }

    /// Next message; `None` only when there are no symbols or users configured.
    pub fn next_msg<R: Rng>(&mut self, rng: &mut R) -> Option<ClientMsg> {
        if self.symbols.is_empty() || self.users.is_empty() {
            return None;
        }
        let roll = rng.gen_range(0..10);
        if roll < 6 || self.recent.is_empty() {
            return Some(self.new_order(rng));
        }
        let s = self.recent[rng.gen_range(0..self.recent.len())].clone();
        Some(if roll < 8 {
            self.next_id += 1;
            ClientMsg::CancelRequest(OrderCancelRequest {
                cl_ord_id: format!("c{}", self.next_id),
                orig_cl_ord_id: s.cl_ord_id,
                sender_sub_id: s.user,
                symbol: s.symbol,
                side: s.side,
            })
        } else {
            ClientMsg::StatusRequest(OrderStatusRequest {
                ord_status_req_id: s.cl_ord_id,
                sender_sub_id: s.user,
                symbol: s.symbol,
                side: s.side,
            })
        })
    }
}

pub async fn run_mock(tx: mpsc::Sender<ClientMsg>, mut flow: MockFlow, interval_ms: u64) {
    info!(symbols = ?flow.symbols, users = ?flow.users, interval_ms, "mock flow: started");
    loop {
        // ThreadRng is not Send; keep it out of the .await
        let msg = {
            let mut rng = rand::thread_rng();
            flow.next_msg(&mut rng)
        };
        let Some(msg) = msg else {
            info!("mock flow: nothing to send, stopped");
            return;
        };
        if tx.send(msg).await.is_err() {
            info!("mock flow: gateway closed, stopped");
            return;
        }
        sleep(Duration::from_millis(interval_ms)).await;
    }
}
