// ===============================
// src/report.rs (outcome -> execution report)
// ===============================
//
// Status requests answer with the fixed half-fill rule: leaves = cum = qty / 2.
//
use rust_decimal::Decimal;

use crate::domain::{
    now_ns, ExecReport, ExecType, NewOrderSingle, OrdRejReason, OrdStatus, Order,
    OrderCancelRequest, OrderStatusRequest, Outcome, Side,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportIds { pub order_id: u64, pub exec_id: u64 }

fn base(ids: ReportIds, exec_type: ExecType, ord_status: OrdStatus, symbol: &str, side: Side) -> ExecReport {
    ExecReport {
        order_id: ids.order_id,
        exec_id: ids.exec_id,
        exec_type,
        ord_status,
        rej_reason: None,
        cl_ord_id: None,
        target_sub_id: None,
        symbol: symbol.to_string(),
        side,
        order_qty: None,
        price: None,
        last_qty: None,
        last_px: None,
        avg_px: None,
        leaves_qty: Decimal::ZERO,
        cum_qty: Decimal::ZERO,
        text: None,
        ts_ns: now_ns(),
    }
}

fn reject(er: &mut ExecReport, reason: OrdRejReason, text: &str) {
    er.ord_status = OrdStatus::Rejected;
    er.rej_reason = Some(reason);
    er.text = Some(text.to_string());
}

/// NewOrderSingle: accepted orders are reported as fully filled at their own price.
pub fn new_order_report(ids: ReportIds, msg: &NewOrderSingle, outcome: Outcome) -> ExecReport {
    let mut er = base(ids, ExecType::Fill, OrdStatus::Filled, &msg.symbol, msg.side);
    er.cl_ord_id = Some(msg.cl_ord_id.clone());
    er.order_qty = Some(msg.order_qty);
    er.last_qty = Some(msg.order_qty);
    er.last_px = Some(msg.price);
    er.avg_px = Some(msg.price);
    er.cum_qty = msg.order_qty;
    if outcome != Outcome::Placed {
        reject(&mut er, OrdRejReason::DuplicateOrder, "Duplicate Order Placed");
    }
    er
}

pub fn cancel_report(ids: ReportIds, msg: &OrderCancelRequest, outcome: Outcome) -> ExecReport {
    let mut er = base(ids, ExecType::Canceled, OrdStatus::Canceled, &msg.symbol, msg.side);
    er.target_sub_id = Some(msg.sender_sub_id.clone());
    match outcome {
        Outcome::Cancelled => er.text = Some("Order has Been Cancelled".into()),
        Outcome::NoSuchOrder => {
            reject(&mut er, OrdRejReason::Broker, "Failed To Cancel Order - No Such Order")
        }
        _ => reject(&mut er, OrdRejReason::Broker, "Failed To Cancel Order - Unknown Reason."),
    }
    er
}

pub fn status_report(ids: ReportIds, msg: &OrderStatusRequest, order: &Order) -> ExecReport {
    let mut er = base(ids, ExecType::OrderStatus, OrdStatus::PartiallyFilled, &msg.symbol, msg.side);
    er.target_sub_id = Some(msg.sender_sub_id.clone());
    er.price = Some(order.price);
    er.order_qty = Some(order.quantity);
    let half = order.quantity / Decimal::TWO;
    er.leaves_qty = half;
    er.cum_qty = half;
    er.text = Some("Order Is Considered Half Filled".into());
    er
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderKind;

    const IDS: ReportIds = ReportIds { order_id: 7, exec_id: 9 };

    fn nos() -> NewOrderSingle {
        NewOrderSingle {
            cl_ord_id: "1".into(),
            sender_sub_id: "u1".into(),
            symbol: "ABC".into(),
            side: Side::Buy,
            kind: OrderKind::Limit,
            order_qty: Decimal::from(100),
            price: Decimal::from(10),
        }
    }

    fn cxl() -> OrderCancelRequest {
        OrderCancelRequest {
            cl_ord_id: "c1".into(),
            orig_cl_ord_id: "1".into(),
            sender_sub_id: "u1".into(),
            symbol: "ABC".into(),
            side: Side::Sell,
        }
    }

    #[test]
    fn placed_order_reports_full_fill() {
        let er = new_order_report(IDS, &nos(), Outcome::Placed);
        assert_eq!((er.order_id, er.exec_id), (7, 9));
        assert_eq!(er.exec_type, ExecType::Fill);
        assert_eq!(er.ord_status, OrdStatus::Filled);
        assert_eq!(er.cum_qty, Decimal::from(100));
        assert_eq!(er.leaves_qty, Decimal::ZERO);
        assert_eq!(er.avg_px, Some(Decimal::from(10)));
        assert_eq!(er.cl_ord_id.as_deref(), Some("1"));
        assert!(er.rej_reason.is_none());
    }

    #[test]
    fn duplicate_order_is_rejected() {
        let er = new_order_report(IDS, &nos(), Outcome::OrderExists);
        assert_eq!(er.ord_status, OrdStatus::Rejected);
        assert_eq!(er.rej_reason, Some(OrdRejReason::DuplicateOrder));
        assert_eq!(er.text.as_deref(), Some("Duplicate Order Placed"));
    }

    #[test]
    fn cancel_outcomes() {
        let ok = cancel_report(IDS, &cxl(), Outcome::Cancelled);
        assert_eq!(ok.ord_status, OrdStatus::Canceled);
        assert_eq!(ok.target_sub_id.as_deref(), Some("u1"));

        let miss = cancel_report(IDS, &cxl(), Outcome::NoSuchOrder);
        assert_eq!(miss.ord_status, OrdStatus::Rejected);
        assert_eq!(miss.rej_reason, Some(OrdRejReason::Broker));
        assert_eq!(miss.text.as_deref(), Some("Failed To Cancel Order - No Such Order"));

        let failed = cancel_report(IDS, &cxl(), Outcome::CancelFailed);
        assert_eq!(failed.text.as_deref(), Some("Failed To Cancel Order - Unknown Reason."));
    }

    #[test]
    fn status_is_half_filled() {
        let msg = OrderStatusRequest {
            ord_status_req_id: "3".into(),
            sender_sub_id: "u1".into(),
            symbol: "XYZ".into(),
            side: Side::Buy,
        };
        let order = Order {
            id: "3".into(),
            user: "u1".into(),
            symbol: "XYZ".into(),
            quantity: Decimal::from(51),
            price: Decimal::from(5),
            side: Side::Buy,
            kind: OrderKind::Limit,
        };
        let er = status_report(IDS, &msg, &order);
        assert_eq!(er.exec_type, ExecType::OrderStatus);
        assert_eq!(er.ord_status, OrdStatus::PartiallyFilled);
        assert_eq!(er.leaves_qty, Decimal::new(255, 1));
        assert_eq!(er.cum_qty, Decimal::new(255, 1));
        assert_eq!(er.order_qty, Some(Decimal::from(51)));
    }
}
