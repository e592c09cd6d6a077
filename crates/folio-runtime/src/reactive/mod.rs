#![forbid(unsafe_code)]

//! Reactive page state.
//!
//! - [`Observable`]: a shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//!
//! The page host model publishes everything a renderer needs (navbar style,
//! menu state, revealed targets, skill widths, the `loaded` flag) through
//! observables, so the host toggles classes from subscriptions instead of
//! polling.
//!
//! # Model
//!
//! Each page field is its own `Observable<T>`, a single-threaded
//! `Rc<RefCell<..>>` cell. There is no derived-value or batching layer: a
//! handler that changes three fields sends three rounds of notifications.
//! A change is committed, then the live subscribers are collected, then
//! the borrow is released before any callback runs, so callbacks may read
//! or set any observable, including the one notifying them.
//!
//! # Invariants
//!
//! 1. A `set` that changes the value bumps the version once and notifies
//!    every subscriber live at that moment, in registration order, with the
//!    new value.
//! 2. A `set` or `update` that leaves the value equal is a no-op.
//! 3. A subscription made inside a callback first hears the next change.
//! 4. A dropped [`Subscription`] is not called for any later change; its
//!    slot is pruned on the next change.

pub mod observable;

pub use observable::{Observable, Subscription};
