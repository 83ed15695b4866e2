//! End-to-end scenarios across containers, scheduler and UI store

use crate::{
    AlertOptions, Batch, ConfirmError, ConfirmOptions, ManualClock, ReactiveList, ReactiveObject,
    ReactiveValue, Severity, TimerQueue, ToastOptions, UiConfig, UiRequestState, UiStore,
    flush_frame, is_frame_requested,
};
use futures::executor::block_on;
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::{Value, json};
use serial_test::serial;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn render_counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    (count, move || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
#[serial]
fn nested_reads_return_the_same_wrapper() {
    let (_, render) = render_counter();
    let state = ReactiveObject::new(json!({"user": {"name": "Ada", "tags": ["a"]}}), render);

    let first = state.get("user").and_then(ReactiveValue::into_object).unwrap();
    let second = state.get("user").and_then(ReactiveValue::into_object).unwrap();
    assert!(ReactiveObject::ptr_eq(&first, &second));

    let tags_a = first.get("tags").and_then(ReactiveValue::into_list).unwrap();
    let tags_b = second.get("tags").and_then(ReactiveValue::into_list).unwrap();
    assert!(ReactiveList::ptr_eq(&tags_a, &tags_b));
}

#[test]
#[serial]
fn set_and_delete_render_after_the_frame() {
    let (renders, render) = render_counter();
    let state = ReactiveObject::new(json!({"a": 1}), render);

    state.set("b", 2);
    assert_eq!(renders.load(Ordering::SeqCst), 0);
    flush_frame();
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    assert_eq!(state.remove("a"), Some(json!(1)));
    flush_frame();
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(state.to_value(), json!({"b": 2}));
}

#[test]
#[serial]
fn append_and_remove_last_report_results_and_render() {
    let (renders, render) = render_counter();
    let list = ReactiveList::new(json!([1, 2]), render);

    assert_eq!(list.append([json!(3)]), 3);
    flush_frame();
    assert_eq!(renders.load(Ordering::SeqCst), 1);

    assert_eq!(list.remove_last(), Some(json!(3)));
    flush_frame();
    assert_eq!(renders.load(Ordering::SeqCst), 2);
    assert_eq!(list.to_value(), json!([1, 2]));
}

#[test]
#[serial]
fn burst_of_writes_renders_final_state_once() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let holder: Arc<Mutex<Option<ReactiveObject>>> = Arc::new(Mutex::new(None));

    let log = Arc::clone(&seen);
    let view = Arc::clone(&holder);
    let state = ReactiveObject::new(json!({"n": 0}), move || {
        if let Some(state) = view.lock().as_ref() {
            log.lock().push(state.get_value("n"));
        }
    });
    *holder.lock() = Some(state.clone());

    for n in 1..=5 {
        state.set("n", n);
    }
    flush_frame();

    assert_eq!(*seen.lock(), vec![Some(json!(5))]);
    holder.lock().take();
}

#[test]
#[serial]
fn counter_increment_updates_raw_and_requests_frame() {
    let (_, render) = render_counter();
    let state = ReactiveObject::new(json!({"count": 0}), render);
    flush_frame();

    state.update("count", |n| json!(n.and_then(Value::as_i64).unwrap_or(0) + 1));
    assert_eq!(state.to_value(), json!({"count": 1}));
    assert!(is_frame_requested());
    flush_frame();
}

#[test]
#[serial]
fn append_then_remove_first_leaves_second_item() {
    let (renders, render) = render_counter();
    let list = ReactiveList::new(json!([{"id": 1}]), render);

    list.append([json!({"id": 2})]);
    assert_eq!(list.remove_first(), Some(json!({"id": 1})));
    assert_eq!(list.to_value(), json!([{"id": 2}]));

    flush_frame();
    assert_eq!(renders.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn batch_flushes_once_at_outermost_exit() {
    let (renders, render) = render_counter();
    let list = ReactiveList::new(json!([]), render);

    Batch::run(|| {
        list.append([json!(1)]);
        Batch::run(|| {
            list.append([json!(2)]);
        });
        assert_eq!(renders.load(Ordering::SeqCst), 0);
        list.append([json!(3)]);
    });

    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(list.to_value(), json!([1, 2, 3]));
}

#[test]
fn loading_ref_count_floors_at_zero() {
    let ui = UiStore::new(UiConfig::default());

    assert_eq!(ui.push_loading(), 1);
    assert_eq!(ui.push_loading(), 2);
    assert_eq!(ui.pop_loading(), 1);
    assert!(ui.state().loading.visible);

    assert_eq!(ui.pop_loading(), 0);
    assert!(!ui.state().loading.visible);

    assert_eq!(ui.pop_loading(), 0);
    assert_eq!(ui.loading_count(), 0);
}

#[test]
fn confirm_future_carries_the_answer() {
    let ui = UiStore::new(UiConfig::default());

    let yes = ui.request_confirm("Save changes?", ConfirmOptions::new());
    ui.resolve_confirm(true);
    assert_eq!(block_on(yes), Ok(true));

    let no = ui.request_confirm("Save changes?", ConfirmOptions::new());
    ui.resolve_confirm(false);
    assert_eq!(block_on(no), Ok(false));
}

#[test]
fn newer_confirm_supersedes_pending_one() {
    let ui = UiStore::new(UiConfig::default());
    let dropped_callback_ran = Arc::new(AtomicUsize::new(0));

    let ran = Arc::clone(&dropped_callback_ran);
    let first = ui.request_confirm(
        "First?",
        ConfirmOptions::new().on_confirm(move || {
            ran.fetch_add(1, Ordering::SeqCst);
        }),
    );
    let second = ui.request_confirm("Second?", ConfirmOptions::new());

    assert_eq!(block_on(first), Err(ConfirmError::Superseded));
    assert_eq!(ui.state().confirm.message, "Second?");

    ui.resolve_confirm(true);
    assert_eq!(block_on(second), Ok(true));
    assert_eq!(dropped_callback_ran.load(Ordering::SeqCst), 0);
}

#[test]
fn replacing_toast_restarts_the_timer() {
    let clock = ManualClock::new();
    let ui = UiStore::with_timers(UiConfig::default(), TimerQueue::with_clock(clock.clone()));

    ui.request_toast("a", ToastOptions::new().duration_ms(1000));
    clock.advance(Duration::from_millis(500));
    ui.timers().run_due();
    ui.request_toast("b", ToastOptions::new().duration_ms(5000));

    clock.set_elapsed(Duration::from_millis(1000));
    ui.timers().run_due();
    let toast = ui.state().toast;
    assert!(toast.visible);
    assert_eq!(toast.message, "b");

    clock.set_elapsed(Duration::from_millis(5499));
    ui.timers().run_due();
    assert!(ui.state().toast.visible);

    clock.set_elapsed(Duration::from_millis(5500));
    ui.timers().run_due();
    assert!(!ui.state().toast.visible);
}

#[test]
fn error_severity_is_stored_as_danger() {
    let ui = UiStore::new(UiConfig::default());
    ui.request_alert("x", AlertOptions::new().severity_name("error"));
    assert_eq!(ui.state().alert.severity, Severity::Danger);

    let json = serde_json::to_value(ui.state().alert).unwrap();
    assert_eq!(json["severity"], json!("danger"));
}

#[test]
fn cancelled_timer_id_never_hits_a_newer_timer() {
    let clock = ManualClock::new();
    let timers = TimerQueue::with_clock(clock.clone());
    let fired = Arc::new(AtomicUsize::new(0));

    let old = timers.schedule(Duration::from_millis(10), || {});
    assert!(timers.cancel(old));

    let count = Arc::clone(&fired);
    let newer = timers.schedule(Duration::from_millis(10), move || {
        count.fetch_add(1, Ordering::SeqCst);
    });
    assert!(!timers.cancel(old));
    assert!(timers.is_armed(newer));

    clock.advance(Duration::from_millis(10));
    timers.run_due();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
#[serial]
fn overlay_sees_each_request_kind() {
    let ui = UiStore::new(UiConfig::default());
    let frames: Arc<Mutex<Vec<UiRequestState>>> = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&frames);
    let mount = ui
        .mount_overlay(move |state: &UiRequestState, _: &crate::OverlayActions| {
            log.lock().push(state.clone());
        })
        .unwrap();

    ui.push_loading();
    ui.request_alert("Heads up", AlertOptions::new().severity(Severity::Warning));
    ui.request_toast("Copied", ToastOptions::new().sticky());
    flush_frame();

    {
        let frames = frames.lock();
        assert_eq!(frames.len(), 2);
        let last = frames.last().unwrap();
        assert!(last.loading.visible);
        assert_eq!(last.alert.severity, Severity::Warning);
        assert_eq!(last.toast.message, "Copied");
    }

    assert!(ui.mount_overlay(|_: &UiRequestState, _: &crate::OverlayActions| {}).is_err());
    drop(mount);
    let remount = ui.mount_overlay(|_: &UiRequestState, _: &crate::OverlayActions| {});
    assert!(remount.is_ok());
}

#[test]
#[serial]
fn nested_list_writes_render_the_root_owner() {
    let (renders, render) = render_counter();
    let board = ReactiveObject::new(json!({"columns": [{"cards": []}]}), render);

    let columns = board.get("columns").and_then(ReactiveValue::into_list).unwrap();
    let column = columns.get(0).and_then(ReactiveValue::into_object).unwrap();
    let cards = column.get("cards").and_then(ReactiveValue::into_list).unwrap();
    cards.append([json!("todo")]);
    cards.append([json!("done")]);

    flush_frame();
    assert_eq!(renders.load(Ordering::SeqCst), 1);
    assert_eq!(board.to_value(), json!({"columns": [{"cards": ["todo", "done"]}]}));
}

#[derive(Clone, Copy, Debug)]
enum LoadingOp {
    Push,
    Pop,
}

fn loading_op() -> impl Strategy<Value = LoadingOp> {
    prop_oneof![Just(LoadingOp::Push), Just(LoadingOp::Pop)]
}

proptest! {
    #[test]
    fn loading_count_matches_saturating_model(ops in prop::collection::vec(loading_op(), 0..64)) {
        let ui = UiStore::new(UiConfig::default());
        let mut model = 0usize;

        for op in ops {
            let count = match op {
                LoadingOp::Push => {
                    model += 1;
                    ui.push_loading()
                }
                LoadingOp::Pop => {
                    model = model.saturating_sub(1);
                    ui.pop_loading()
                }
            };
            prop_assert_eq!(count, model);
            prop_assert_eq!(ui.state().loading.visible, model > 0);
        }
    }
}
