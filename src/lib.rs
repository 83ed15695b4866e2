#![deny(missing_docs)]

//! Reactive state containers and a global UI request store.
//!
//! Two pieces sit on one frame scheduler:
//!
//! - **Reactive containers.** [`ReactiveObject`] and [`ReactiveList`] wrap
//!   plain JSON data. Reads pass through; every write, at any depth, schedules
//!   one re-render for the next frame. Nested objects and arrays are wrapped on
//!   first read and the wrapper is reused afterwards.
//! - **UI coordination.** [`UiStore`] turns fire-and-forget requests (loading,
//!   alert, confirm, toast) into a [`UiRequestState`] snapshot that a single
//!   mounted [`OverlayRenderer`] draws.
//!
//! # Quick Start
//!
//! ```ignore
//! use easy_reactive::{ReactiveObject, flush_frame};
//! use serde_json::json;
//!
//! let counter = ReactiveObject::new(json!({"count": 0}), || println!("render"));
//!
//! counter.set("count", 1);
//! counter.set("count", 2);
//! counter.set("count", 3);
//!
//! flush_frame(); // prints "render" once; the raw data is {"count": 3}
//! ```
//!
//! # Frames
//!
//! Writes only mark renders dirty and request a frame. Something has to turn
//! frame requests into frames:
//!
//! ```ignore
//! flush_frame();            // from the host's event loop, once per tick
//! Batch::run(|| { ... });   // the outermost batch flushes on exit
//! let frames = FrameLoop::new().timers(UiStore::global().timers().clone()).spawn();
//! ```
//!
//! [`after_frame`] queues work that must observe the rendered result, such as
//! restoring focus after a dialog closes.
//!
//! # Lists
//!
//! ```ignore
//! let todos = ReactiveList::new(json!([{"id": 1}]), render);
//! todos.append([json!({"id": 2})]);   // returns 2
//! todos.remove_first();               // raw data is [{"id": 2}]
//! ```
//!
//! # UI requests
//!
//! ```ignore
//! let ui = UiStore::global();
//! let _overlay = ui.mount_overlay(|state: &UiRequestState, actions: &OverlayActions| {
//!     // draw `state`; wire buttons to `actions.confirm()` and friends
//! })?;
//!
//! ui.push_loading();
//! ui.request_toast("Saved", ToastOptions::new().severity(Severity::Success));
//! let sure = ui.request_confirm("Delete?", ConfirmOptions::new()).await;
//! ui.pop_loading();
//! ```

// Internal modules
pub(crate) mod arena;
mod batch;
mod config;
mod error;
mod frame_loop;
mod hash;
mod list;
mod object;
mod scheduler;
mod store;
mod timer;
mod ui;
mod value;

// Reactive containers
pub use list::{MAX_SET_PADDING, ReactiveList};
pub use object::ReactiveObject;
pub use value::{ReactiveValue, ToPlain};

// Observable store
pub use store::{Store, Subscription};

// UI coordination
pub use ui::{
    AlertOptions, AlertState, Callback, ConfirmFuture, ConfirmOptions, ConfirmPhase,
    ConfirmState, LoadingState, OverlayActions, OverlayMount, OverlayRenderer, Severity,
    ToastDuration, ToastOptions, ToastPosition, ToastState, UiRequestState, UiStore, WeakUiStore,
};

// Frame scheduling
pub use batch::{Batch, is_batch_active};
pub use scheduler::{RenderHandle, after_frame, flush_frame, is_frame_requested, request_frame};

// Timers
pub use timer::{Clock, ManualClock, SystemClock, TimerId, TimerQueue};

// Background frame loop (for hosts without their own event loop)
pub use frame_loop::{DEFAULT_DEBOUNCE, DEFAULT_MAX_DEBOUNCE, FrameLoop, FrameLoopHandle};

// Configuration and errors
pub use config::{Labels, ToastDefaults, UiConfig};
pub use error::{ConfigError, ConfirmError, ReactiveError, UiError, UnknownSeverity};

#[cfg(test)]
mod tests;
