// ===============================
// src/store.rs (per-symbol resting orders)
// ===============================
//
// Symbol -> orders in arrival order. Only the engine actor owns one of these,
// so each call below runs to completion before the next one starts.
//
use ahash::AHashMap as HashMap;

use crate::domain::{CancelRequest, Order, Outcome, QueryRequest, QueryResult};

#[derive(Debug, Default)]
pub struct OrderStore {
    books: HashMap<String, Vec<Order>>,
}

fn any_empty(fields: &[&str]) -> bool {
    fields.iter().any(|f| f.is_empty())
}

impl OrderStore {
    pub fn new() -> Self { Self::default() }

    /// Appends `order` unless its `(id, user)` already rests on the symbol.
    pub fn place(&mut self, order: Order) -> Outcome {
        if any_empty(&[order.symbol.as_str(), order.user.as_str(), order.id.as_str()]) {
            return Outcome::InvalidRequest;
        }
        let list = self.books.entry(order.symbol.clone()).or_default();
        if list.iter().any(|o| o.matches(&order.id, &order.user)) {
            return Outcome::OrderExists;
        }
        list.push(order);
        Outcome::Placed
    }

    /// Removes the first match, keeping the rest in order.
    pub fn cancel(&mut self, req: &CancelRequest) -> Outcome {
        if any_empty(&[req.symbol.as_str(), req.user.as_str(), req.orig_id.as_str()]) {
            return Outcome::InvalidRequest;
        }
        let Some(list) = self.books.get_mut(&req.symbol) else {
            return Outcome::NoSuchOrder;
        };
        match list.iter().position(|o| o.matches(&req.orig_id, &req.user)) {
            Some(i) => {
                list.remove(i);
                Outcome::Cancelled
            }
            None => Outcome::NoSuchOrder,
        }
    }

    pub fn query(&self, req: &QueryRequest) -> QueryResult {
        if any_empty(&[req.symbol.as_str(), req.user.as_str(), req.orig_id.as_str()]) {
            return QueryResult::miss(Outcome::InvalidRequest);
        }
        self.orders(&req.symbol)
            .iter()
            .find(|o| o.matches(&req.orig_id, &req.user))
            .cloned()
            .map(QueryResult::found)
            .unwrap_or_else(|| QueryResult::miss(Outcome::NoSuchOrder))
    }

    pub fn orders(&self, symbol: &str) -> &[Order] {
        self.books.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self, symbol: &str) -> usize { self.orders(symbol).len() }

    /// Resting orders across all symbols.
    pub fn total(&self) -> usize { self.books.values().map(Vec::len).sum() }
}
