//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Core traits
pub use crate::observable::{self, Observable, ObservableExt};
pub use crate::observer::{CheckedObserver, Emitter, Observer};
// Disposal
pub use crate::disposable::{
  ActionDisposable, BooleanDisposable, CompositeDisposable, Disposable, DisposeGuard,
  RefCountDisposable, SerialDisposable, SingleAssignmentDisposable, Subscription,
};
pub use crate::error::{DisposableError, ObserverError};
// Notifications
pub use crate::notification::{Notification, NotificationKind};
// Operators that are referenced by name in signatures
pub use crate::ops::group_by_until::GroupedObservable;
// Schedulers
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::{TimeoutScheduler, TIMEOUT};
pub use crate::scheduler::{
  CatchScheduler, CurrentThreadScheduler, Duration, ImmediateScheduler, Instant, Scheduler,
  SchedulerExt, VirtualTimeScheduler, CURRENT_THREAD, IMMEDIATE,
};
// Subjects
pub use crate::subject::{AnonymousSubject, AsyncSubject, Subject};
