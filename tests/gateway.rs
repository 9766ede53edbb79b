use rust_decimal::Decimal;
use tokio::sync::mpsc;
use venue_sim::domain::{
    ClientMsg, ExecReport, ExecType, NewOrderSingle, OrdRejReason, OrdStatus, OrderCancelRequest,
    OrderKind, OrderStatusRequest, Reply, Side,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use venue_sim::gateway::{self, Gateway};
use venue_sim::{posttrade, recorder, Engine, EngineCfg};

fn nos(id: &str, user: &str, symbol: &str, qty: i64, px: i64) -> NewOrderSingle {
    NewOrderSingle {
        cl_ord_id: id.into(),
        sender_sub_id: user.into(),
        symbol: symbol.into(),
        side: Side::Buy,
        kind: OrderKind::Limit,
        order_qty: Decimal::from(qty),
        price: Decimal::from(px),
    }
}

fn cxl(orig: &str, user: &str, symbol: &str) -> OrderCancelRequest {
    OrderCancelRequest {
        cl_ord_id: format!("c-{orig}"),
        orig_cl_ord_id: orig.into(),
        sender_sub_id: user.into(),
        symbol: symbol.into(),
        side: Side::Buy,
    }
}

fn osr(id: &str, user: &str, symbol: &str) -> OrderStatusRequest {
    OrderStatusRequest {
        ord_status_req_id: id.into(),
        sender_sub_id: user.into(),
        symbol: symbol.into(),
        side: Side::Buy,
    }
}

fn report(reply: Reply) -> ExecReport {
    match reply {
        Reply::Report(er) => er,
        other => panic!("expected report, got {other:?}"),
    }
}

fn gateway() -> Gateway {
    let (engine, _task) = Engine::spawn(EngineCfg::default());
    Gateway::new(engine)
}

#[tokio::test]
async fn new_order_fill_then_duplicate_reject() {
    let gw = gateway();
    let first = report(gw.new_order_single(nos("1", "u1", "ABC", 100, 10)).await.unwrap());
    assert_eq!(first.exec_type, ExecType::Fill);
    assert_eq!(first.ord_status, OrdStatus::Filled);
    assert_eq!(first.cum_qty, Decimal::from(100));

    let dup = report(gw.new_order_single(nos("1", "u1", "ABC", 100, 10)).await.unwrap());
    assert_eq!(dup.ord_status, OrdStatus::Rejected);
    assert_eq!(dup.rej_reason, Some(OrdRejReason::DuplicateOrder));
    assert!(dup.order_id > first.order_id);
    assert!(dup.exec_id > first.exec_id);
}

#[tokio::test]
async fn status_is_half_filled_and_unknown_is_session_reject() {
    let gw = gateway();
    gw.new_order_single(nos("3", "u1", "XYZ", 50, 5)).await.unwrap();

    let st = report(gw.status_request(osr("3", "u1", "XYZ")).await.unwrap());
    assert_eq!(st.exec_type, ExecType::OrderStatus);
    assert_eq!(st.ord_status, OrdStatus::PartiallyFilled);
    assert_eq!(st.price, Some(Decimal::from(5)));
    assert_eq!(st.leaves_qty, Decimal::from(25));
    assert_eq!(st.cum_qty, Decimal::from(25));

    match gw.status_request(osr("99", "u1", "XYZ")).await.unwrap() {
        Reply::SessionReject { field, .. } => assert_eq!(field, "OrdStatusReqID"),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn cancel_reports() {
    let gw = gateway();
    gw.new_order_single(nos("2", "u1", "ABC", 10, 1)).await.unwrap();

    let ok = report(gw.cancel_request(cxl("2", "u1", "ABC")).await.unwrap());
    assert_eq!(ok.exec_type, ExecType::Canceled);
    assert_eq!(ok.ord_status, OrdStatus::Canceled);

    let again = report(gw.cancel_request(cxl("2", "u1", "ABC")).await.unwrap());
    assert_eq!(again.ord_status, OrdStatus::Rejected);
    assert_eq!(again.rej_reason, Some(OrdRejReason::Broker));
    assert_eq!(again.text.as_deref(), Some("Failed To Cancel Order - No Such Order"));
}

#[tokio::test]
async fn missing_fields_rejected_without_consuming_ids() {
    let gw = gateway();
    let first = report(gw.new_order_single(nos("1", "u1", "ABC", 1, 1)).await.unwrap());

    match gw.new_order_single(nos("2", "", "ABC", 1, 1)).await.unwrap() {
        Reply::SessionReject { field, .. } => assert_eq!(field, "SenderSubID"),
        other => panic!("unexpected {other:?}"),
    }
    match gw.cancel_request(cxl("", "u1", "ABC")).await.unwrap() {
        Reply::SessionReject { field, .. } => assert_eq!(field, "OrigClOrdID"),
        other => panic!("unexpected {other:?}"),
    }

    let next = report(gw.new_order_single(nos("3", "u1", "ABC", 1, 1)).await.unwrap());
    assert_eq!(next.order_id, first.order_id + 1);
    assert_eq!(next.exec_id, first.exec_id + 1);
}

#[tokio::test]
async fn worker_answers_each_message_in_order() {
    let (msg_tx, msg_rx) = mpsc::channel(16);
    let (reply_tx, mut reply_rx) = mpsc::channel(16);
    let task = tokio::spawn(gateway::run(msg_rx, reply_tx, gateway()));

    msg_tx.send(ClientMsg::NewOrderSingle(nos("1", "u1", "ABC", 10, 2))).await.unwrap();
    msg_tx.send(ClientMsg::StatusRequest(osr("1", "u1", "ABC"))).await.unwrap();
    msg_tx.send(ClientMsg::CancelRequest(cxl("1", "u1", "ABC"))).await.unwrap();
    msg_tx.send(ClientMsg::StatusRequest(osr("1", "u1", "ABC"))).await.unwrap();
    drop(msg_tx);

    assert_eq!(report(reply_rx.recv().await.unwrap()).exec_type, ExecType::Fill);
    assert_eq!(report(reply_rx.recv().await.unwrap()).exec_type, ExecType::OrderStatus);
    assert_eq!(report(reply_rx.recv().await.unwrap()).ord_status, OrdStatus::Canceled);
    assert!(matches!(reply_rx.recv().await.unwrap(), Reply::SessionReject { .. }));

    task.await.unwrap().unwrap();
    assert!(reply_rx.recv().await.is_none());
}

// Closing only the message queue is enough to stop the whole pipeline in
// order; the recorder's close-time flush then has every event.
#[tokio::test]
async fn pipeline_shutdown_flushes_the_journal() {
    let dir = std::env::temp_dir().join(format!("venue_sim_shutdown_{}", std::process::id()));
    let path = dir.join("events.jsonl");
    let _ = std::fs::remove_dir_all(&dir);

    let (rec_tx, rec_rx) = mpsc::channel(64);
    let rec_task = tokio::spawn(recorder::run(rec_rx, path.to_string_lossy().to_string()));
    let (engine, engine_task) =
        Engine::spawn(EngineCfg { queue_depth: 8, recorder: Some(rec_tx.clone()) });

    let (msg_tx, msg_rx) = mpsc::channel(16);
    let (reply_tx, reply_rx) = mpsc::channel(16);
    let gw_task = tokio::spawn(gateway::run(msg_rx, reply_tx, Gateway::new(engine)));
    let handled = Arc::new(AtomicU64::new(0));
    let post_task = tokio::spawn(posttrade::run(reply_rx, Some(rec_tx), handled.clone()));

    for id in ["1", "2", "3"] {
        msg_tx.send(ClientMsg::NewOrderSingle(nos(id, "u1", "ABC", 10, 2))).await.unwrap();
    }
    drop(msg_tx);

    gw_task.await.unwrap().unwrap();
    engine_task.await.unwrap();
    post_task.await.unwrap();
    rec_task.await.unwrap().unwrap();

    assert_eq!(handled.load(Ordering::Relaxed), 3);
    let body = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines.iter().filter(|l| l.contains("\"Place\"")).count(), 3);
    assert_eq!(lines.iter().filter(|l| l.contains("\"Exec\"")).count(), 3);
    let _ = std::fs::remove_dir_all(&dir);
}
