//! Disposables: one-shot, idempotent resource release.
//!
//! Every `subscribe` and every `schedule*` call hands back a [`Subscription`],
//! a clonable handle over some [`Disposable`]. Operators compose these
//! handles with [`CompositeDisposable`], [`SerialDisposable`],
//! [`SingleAssignmentDisposable`] and [`RefCountDisposable`] so that tearing
//! down a pipeline releases every upstream resource exactly once.

use std::{
  cell::{Cell, RefCell},
  fmt::{Debug, Formatter},
  rc::Rc,
};

mod composite;
mod ref_count;
mod serial;
mod single_assignment;

pub use composite::CompositeDisposable;
pub use ref_count::RefCountDisposable;
pub use serial::SerialDisposable;
pub use single_assignment::SingleAssignmentDisposable;

/// A capability for releasing a held resource.
///
/// `dispose` must be idempotent: calling it again has no effect and never
/// panics.
pub trait Disposable {
  fn dispose(&self);

  fn is_disposed(&self) -> bool;
}

impl Disposable for () {
  #[inline]
  fn dispose(&self) {}

  #[inline]
  fn is_disposed(&self) -> bool { true }
}

impl<T: Disposable + ?Sized> Disposable for Rc<T> {
  #[inline]
  fn dispose(&self) { (**self).dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { (**self).is_disposed() }
}

/// Type erased, clonable handle to a disposable.
///
/// Clones share the same underlying disposable, so identity (used by
/// [`CompositeDisposable::remove`]) is preserved across clones.
#[derive(Clone)]
pub struct Subscription(Rc<dyn Disposable>);

impl Subscription {
  #[inline]
  pub fn new(disposable: impl Disposable + 'static) -> Self { Self(Rc::new(disposable)) }

  /// Wraps a release action so it runs at most once.
  pub fn from_fn(action: impl FnOnce() + 'static) -> Self { Self::new(ActionDisposable::new(action)) }

  /// A disposable that holds nothing.
  #[inline]
  pub fn empty() -> Self { Self::new(()) }

  /// Whether both handles point at the same disposable.
  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }

  /// Activates "RAII" behavior for this subscription: it is disposed as soon
  /// as the returned guard goes out of scope.
  ///
  /// **Attention:** If you don't assign the return value to a variable, the
  /// subscription is disposed immediately.
  pub fn unsubscribe_when_dropped(self) -> DisposeGuard { DisposeGuard::new(self) }
}

impl Disposable for Subscription {
  #[inline]
  fn dispose(&self) { self.0.dispose() }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.is_disposed() }
}

impl Debug for Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription").field("is_disposed", &self.is_disposed()).finish()
  }
}

/// Runs a release action on first disposal.
pub struct ActionDisposable(RefCell<Option<Box<dyn FnOnce()>>>);

impl ActionDisposable {
  pub fn new(action: impl FnOnce() + 'static) -> Self { Self(RefCell::new(Some(Box::new(action)))) }
}

impl Disposable for ActionDisposable {
  fn dispose(&self) {
    let action = self.0.borrow_mut().take();
    if let Some(action) = action {
      action();
    }
  }

  fn is_disposed(&self) -> bool { self.0.borrow().is_none() }
}

/// A disposable that only records whether it was disposed.
///
/// Clones share the flag.
#[derive(Clone, Default)]
pub struct BooleanDisposable(Rc<Cell<bool>>);

impl BooleanDisposable {
  pub fn new() -> Self { Self::default() }
}

impl Disposable for BooleanDisposable {
  #[inline]
  fn dispose(&self) { self.0.set(true) }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.get() }
}

impl From<BooleanDisposable> for Subscription {
  fn from(d: BooleanDisposable) -> Self { Subscription::new(d) }
}

/// An RAII implementation of a "scoped subscribed" subscription.
/// When this structure is dropped (falls out of scope), the subscription is
/// disposed.
///
/// If you want to drop it immediately, wrap it in its own scope.
#[derive(Debug)]
#[must_use]
pub struct DisposeGuard(Option<Subscription>);

impl DisposeGuard {
  pub fn new(subscription: Subscription) -> Self { Self(Some(subscription)) }

  /// Gives the subscription back without disposing it.
  pub fn into_inner(mut self) -> Subscription { self.0.take().unwrap_or_else(Subscription::empty) }
}

impl Drop for DisposeGuard {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.dispose();
    }
  }
}
