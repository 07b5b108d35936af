//! # rxstream: reactive streams for Rust
//!
//! Push-based observable sequences, composable resource disposal and a
//! pluggable scheduling abstraction with virtual time.
//!
//! ## Quick Start
//!
//! ```rust
//! use rxstream::prelude::*;
//!
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(|v| println!("Value: {}", v));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] | A lazy source of values; operators live on [`ObservableExt`] |
//! | [`Observer`] | Consumes `next`, `error`, and `complete` events |
//! | [`Subscription`] | Handle to cancel an active subscription |
//! | [`Scheduler`] | Decides when (and on which clock) work runs |
//! | [`Subject`] | Both an observer and a multicasting observable |
//!
//! Time-dependent pipelines can be driven deterministically with a
//! [`VirtualTimeScheduler`]:
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxstream::prelude::*;
//!
//! let scheduler = VirtualTimeScheduler::new();
//! let ticks = Rc::new(RefCell::new(vec![]));
//! let c_ticks = ticks.clone();
//! observable::interval(Duration::from_secs(1), scheduler.clone())
//!   .take(3)
//!   .subscribe(move |v| c_ticks.borrow_mut().push(v));
//!
//! scheduler.advance_by(Duration::from_secs(2));
//! assert_eq!(*ticks.borrow(), vec![0, 1]);
//! scheduler.start();
//! assert_eq!(*ticks.borrow(), vec![0, 1, 2]);
//! ```
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`** (default): [`TimeoutScheduler`] on top of tokio's
//!   local task set and timers.
//!
//! [`Observable`]: observable::Observable
//! [`ObservableExt`]: observable::ObservableExt
//! [`Observer`]: observer::Observer
//! [`Subscription`]: disposable::Subscription
//! [`Scheduler`]: scheduler::Scheduler
//! [`Subject`]: subject::Subject
//! [`VirtualTimeScheduler`]: scheduler::VirtualTimeScheduler
//! [`TimeoutScheduler`]: scheduler::TimeoutScheduler

pub mod disposable;
pub mod error;
pub mod notification;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod rc;
pub mod scheduler;
pub mod subject;

pub use prelude::*;
