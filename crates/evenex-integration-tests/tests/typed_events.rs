//! Integration tests for typed events sharing a bus with untyped handlers.

mod common;

use common::BusHarness;
use evenex::{Event, Handler};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OrderPlaced {
    order_id: u64,
    items: Vec<String>,
}

impl Event for OrderPlaced {
    const NAME: &'static str = "order:placed";
}

#[test]
fn typed_and_untyped_handlers_run_in_order() {
    let h = BusHarness::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);

    h.bus.on(OrderPlaced::NAME, h.recorder.handler("raw")).unwrap();
    h.bus
        .on_event(move |order: OrderPlaced, _| {
            seen_clone.lock().unwrap().push(order.order_id);
            Ok(())
        })
        .unwrap();

    let order = OrderPlaced {
        order_id: 7,
        items: vec!["book".into()],
    };
    assert!(h.bus.emit_event(&order).unwrap());

    assert_eq!(*seen.lock().unwrap(), vec![7]);
    assert_eq!(
        h.recorder.calls()[0].args,
        vec![json!({"order_id": 7, "items": ["book"]})]
    );
}

#[test]
fn typed_handler_can_reach_the_bus() {
    let h = BusHarness::new();

    h.bus
        .once_event(|order: OrderPlaced, inv| {
            inv.bus().emit("order:audit", &[json!(order.order_id)])?;
            Ok(())
        })
        .unwrap();
    h.bus.on("order:audit", h.recorder.handler("audit")).unwrap();

    let order = OrderPlaced {
        order_id: 11,
        items: Vec::new(),
    };
    h.bus.emit_event(&order).unwrap();
    h.bus.emit_event(&order).unwrap();

    assert_eq!(h.recorder.count_for("audit"), 1);
    assert_eq!(h.recorder.calls()[0].args, vec![json!(11)]);
}

#[test]
fn malformed_payload_goes_to_error_callback() {
    let h = BusHarness::new();
    let typed = h.bus.on_event(|_: OrderPlaced, _| Ok(())).unwrap();
    h.bus.on(OrderPlaced::NAME, h.recorder.handler("after")).unwrap();

    assert!(h.bus.emit(OrderPlaced::NAME, &[json!({"order_id": "x"})]).unwrap());

    let errors = h.errors.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.starts_with("invalid event payload"));
    assert_eq!(errors[0].handler, typed);
    assert_eq!(h.recorder.count_for("after"), 1);
}

#[test]
fn typed_handler_is_removable() {
    let h = BusHarness::new();
    let typed: Handler = h.bus.on_event(|_: OrderPlaced, _| Ok(())).unwrap();

    h.bus.off(OrderPlaced::NAME, Some(&typed)).unwrap();

    assert!(!h.bus.has(OrderPlaced::NAME).unwrap());
}
