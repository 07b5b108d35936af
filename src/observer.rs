//! The consuming side of a stream.
//!
//! A stream pushes `next*` followed by at most one of `error` or `complete`.
//! Every way of subscribing (a full observer, a single closure or three
//! closures) is normalised into one [`Observer`] before any operator logic
//! runs.

use std::{cell::Cell, convert::Infallible, rc::Rc};

use tracing::warn;

use crate::{
  disposable::{BooleanDisposable, Disposable, SingleAssignmentDisposable},
  error::ObserverError,
  notification::Notification,
  rc::{MutRc, RcDeref, RcDerefMut},
};

// ============================================================================
// Observer Trait
// ============================================================================

/// An observer receives zero or more values followed by at most one terminal
/// signal. `error` and `complete` consume the observer, so the type system
/// rules out any delivery after a terminal signal.
pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);

  /// Terminal: the stream failed with `err`.
  fn error(self, err: Err);

  /// Terminal: the stream ended normally.
  fn complete(self);

  /// Whether the observer has stopped accepting values.
  ///
  /// Synchronous sources check this to stop producing early, e.g. after the
  /// subscription was disposed from inside a `next` callback.
  fn is_closed(&self) -> bool;
}

// ============================================================================
// Emitter Trait
// ============================================================================

/// The producer-facing half of an observer.
///
/// Unlike `Observer`, which consumes `self` for `error` and `complete`,
/// `Emitter` takes `&mut self` for all methods, so a producer (such as the
/// closure given to `create`) can hold on to it and emit later. Signals after
/// the first terminal one are dropped.
pub trait Emitter<Item, Err> {
  fn next(&mut self, value: Item);
  fn error(&mut self, err: Err);
  fn complete(&mut self);
  fn is_closed(&self) -> bool;
}

// ============================================================================
// DynObserver Trait - Object-safe Observer
// ============================================================================

/// Object-safe mirror of [`Observer`]: terminal methods take `Box<Self>`
/// so the observer can live behind a vtable.
pub trait DynObserver<Item, Err> {
  fn box_next(&mut self, value: Item);
  fn box_error(self: Box<Self>, err: Err);
  fn box_complete(self: Box<Self>);
  fn box_is_closed(&self) -> bool;
}

impl<T, Item, Err> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  fn box_next(&mut self, value: Item) { self.next(value); }
  fn box_error(self: Box<Self>, err: Err) { self.error(err); }
  fn box_complete(self: Box<Self>) { self.complete(); }
  fn box_is_closed(&self) -> bool { self.is_closed() }
}

/// Boxed observer, the type-erased form used by boxed observables and
/// `create`.
pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err>>;

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).box_next(value) }

  #[inline]
  fn error(self, err: Err) { self.box_error(err) }

  #[inline]
  fn complete(self) { self.box_complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).box_is_closed() }
}

// ============================================================================
// Closure adapters
// ============================================================================

/// Closure adapter for `subscribe(|v| ...)`.
///
/// Only streams that cannot fail can be subscribed with a bare closure;
/// completion is ignored.
#[derive(Clone)]
pub struct FnMutObserver<F>(pub F);

impl<F, Item> Observer<Item, Infallible> for FnMutObserver<F>
where
  F: FnMut(Item),
{
  #[inline]
  fn next(&mut self, v: Item) { (self.0)(v); }

  #[inline]
  fn error(self, err: Infallible) { match err {} }

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Three-callback observer built by `subscribe_all`.
#[derive(Clone)]
pub struct ObserverAll<N, E, C> {
  next: N,
  error: E,
  complete: C,
}

impl<N, E, C> ObserverAll<N, E, C> {
  pub fn new(next: N, error: E, complete: C) -> Self { Self { next, error, complete } }
}

impl<Item, Err, N, E, C> Observer<Item, Err> for ObserverAll<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value); }

  #[inline]
  fn error(self, err: Err) { (self.error)(err); }

  #[inline]
  fn complete(self) { (self.complete)(); }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer that reifies every signal into a [`Notification`] and hands it
/// to a handler.
#[derive(Clone)]
pub struct NotifierObserver<F>(pub F);

impl<Item, Err, F> Observer<Item, Err> for NotifierObserver<F>
where
  F: FnMut(Notification<Item, Err>),
{
  fn next(&mut self, value: Item) { (self.0)(Notification::Next(value)) }

  fn error(mut self, err: Err) { (self.0)(Notification::Error(err)) }

  fn complete(mut self) { (self.0)(Notification::Completed) }

  fn is_closed(&self) -> bool { false }
}

/// Creates an observer from a notification handler.
pub fn from_notifier<Item, Err, F>(handler: F) -> NotifierObserver<F>
where
  F: FnMut(Notification<Item, Err>),
{
  NotifierObserver(handler)
}

/// Turns an observer into a notification handler. Notifications after the
/// first terminal one are dropped.
pub fn to_notifier<Item, Err, O>(observer: O) -> impl FnMut(Notification<Item, Err>)
where
  O: Observer<Item, Err>,
{
  let mut observer = Some(observer);
  move |notification| notification.accept(&mut observer)
}

/// Hides the concrete type of `observer` behind a [`BoxedObserver`].
pub fn as_observer<Item, Err, O>(observer: O) -> BoxedObserver<Item, Err>
where
  O: Observer<Item, Err> + 'static,
{
  Box::new(observer)
}

// ============================================================================
// CheckedObserver
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum CheckState {
  Idle,
  Busy,
  Done,
}

/// An observer handle that rejects grammar violations instead of passing
/// them on.
///
/// Clones share the wrapped observer. A signal after a terminal one is
/// refused with [`ObserverError::Terminated`]; a signal sent from inside the
/// handling of another one is refused with [`ObserverError::Reentrant`].
/// The `try_*` methods report the refusal; the [`Observer`] impl logs it and
/// drops the signal.
pub struct CheckedObserver<O> {
  observer: MutRc<Option<O>>,
  state: Rc<Cell<CheckState>>,
}

/// Wraps `observer` in a [`CheckedObserver`].
pub fn checked<O>(observer: O) -> CheckedObserver<O> {
  let state = Rc::new(Cell::new(CheckState::Idle));
  CheckedObserver { observer: MutRc::own(Some(observer)), state }
}

impl<O> Clone for CheckedObserver<O> {
  fn clone(&self) -> Self { Self { observer: self.observer.clone(), state: self.state.clone() } }
}

impl<O> CheckedObserver<O> {
  fn enter(&self) -> Result<(), ObserverError> {
    match self.state.get() {
      CheckState::Idle => {
        self.state.set(CheckState::Busy);
        Ok(())
      }
      CheckState::Busy => Err(ObserverError::Reentrant),
      CheckState::Done => Err(ObserverError::Terminated),
    }
  }

  pub fn try_next<Item, Err>(&self, value: Item) -> Result<(), ObserverError>
  where
    O: Observer<Item, Err>,
  {
    self.enter()?;
    Observer::<Item, Err>::next(&mut *self.observer.rc_deref_mut(), value);
    self.state.set(CheckState::Idle);
    Ok(())
  }

  pub fn try_error<Item, Err>(&self, err: Err) -> Result<(), ObserverError>
  where
    O: Observer<Item, Err>,
  {
    self.enter()?;
    let observer = self.observer.take();
    Observer::<Item, Err>::error(observer, err);
    self.state.set(CheckState::Done);
    Ok(())
  }

  pub fn try_complete<Item, Err>(&self) -> Result<(), ObserverError>
  where
    O: Observer<Item, Err>,
  {
    self.enter()?;
    let observer = self.observer.take();
    Observer::<Item, Err>::complete(observer);
    self.state.set(CheckState::Done);
    Ok(())
  }
}

impl<O, Item, Err> Observer<Item, Err> for CheckedObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(reason) = self.try_next::<Item, Err>(value).err() {
      warn!(%reason, "next refused by checked observer");
    }
  }

  fn error(self, err: Err) {
    if let Some(reason) = self.try_error::<Item, Err>(err).err() {
      warn!(%reason, "error refused by checked observer");
    }
  }

  fn complete(self) {
    if let Some(reason) = self.try_complete::<Item, Err>().err() {
      warn!(%reason, "complete refused by checked observer");
    }
  }

  fn is_closed(&self) -> bool {
    match self.state.get() {
      CheckState::Idle => Observer::<Item, Err>::is_closed(&self.observer),
      CheckState::Busy => false,
      CheckState::Done => true,
    }
  }
}

// ============================================================================
// AutoDetachObserver
// ============================================================================

/// Guards one subscription: once `closed` is disposed nothing more reaches
/// the wrapped observer, and a terminal signal releases the upstream
/// subscription.
pub struct AutoDetachObserver<O> {
  observer: Option<O>,
  closed: BooleanDisposable,
  upstream: SingleAssignmentDisposable,
}

impl<O> AutoDetachObserver<O> {
  pub fn new(observer: O, closed: BooleanDisposable, upstream: SingleAssignmentDisposable) -> Self {
    Self { observer: Some(observer), closed, upstream }
  }
}

impl<Item, Err, O> Observer<Item, Err> for AutoDetachObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.closed.is_disposed() {
      return;
    }
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
    }
  }

  fn error(mut self, err: Err) {
    if self.closed.is_disposed() {
      return;
    }
    self.closed.dispose();
    if let Some(observer) = self.observer.take() {
      observer.error(err);
    }
    self.upstream.dispose();
  }

  fn complete(mut self) {
    if self.closed.is_disposed() {
      return;
    }
    self.closed.dispose();
    if let Some(observer) = self.observer.take() {
      observer.complete();
    }
    self.upstream.dispose();
  }

  fn is_closed(&self) -> bool {
    self.closed.is_disposed() || self.observer.as_ref().map_or(true, Observer::is_closed)
  }
}

// ============================================================================
// Optional and shared observers
// ============================================================================

/// `None` is a closed observer that drops every signal.
impl<O, Item, Err> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(inner) = self {
      inner.next(value);
    }
  }

  fn error(self, err: Err) {
    if let Some(inner) = self {
      inner.error(err);
    }
  }

  fn complete(self) {
    if let Some(inner) = self {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().map_or(true, Observer::is_closed) }
}

/// Shared downstream of operators that reach it from several upstream
/// callbacks. The first terminal signal claims the observer.
impl<O, Item, Err> Observer<Item, Err> for MutRc<Option<O>>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.rc_deref_mut().next(value); }

  fn error(self, err: Err) {
    let inner = self.take();
    if let Some(inner) = inner {
      inner.error(err);
    }
  }

  fn complete(self) {
    let inner = self.take();
    if let Some(inner) = inner {
      inner.complete();
    }
  }

  fn is_closed(&self) -> bool { self.rc_deref().as_ref().map_or(true, Observer::is_closed) }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;

  struct TestObserver {
    values: Rc<RefCell<Vec<i32>>>,
  }

  impl Observer<i32, ()> for TestObserver {
    fn next(&mut self, value: i32) { self.values.borrow_mut().push(value); }

    fn error(self, _: ()) { self.values.borrow_mut().push(-1); }

    fn complete(self) { self.values.borrow_mut().push(0); }

    fn is_closed(&self) -> bool { false }
  }

  #[rxstream_macro::test]
  fn closure_as_observer() {
    let mut count = 0;
    let mut closure_obs = FnMutObserver(|v: i32| {
      count += v;
    });

    Observer::<i32, Infallible>::next(&mut closure_obs, 10);
    Observer::<i32, Infallible>::next(&mut closure_obs, 20);
    assert_eq!(count, 30);
  }

  #[rxstream_macro::test]
  fn boxed_observer_delegates() {
    let values = Rc::new(RefCell::new(vec![]));
    let mut boxed: BoxedObserver<i32, ()> = Box::new(TestObserver { values: values.clone() });
    boxed.next(1);
    assert!(!boxed.is_closed());
    boxed.complete();
    assert_eq!(*values.borrow(), vec![1, 0]);
  }

  #[rxstream_macro::test]
  fn auto_detach_blocks_after_close() {
    let values = Rc::new(RefCell::new(vec![]));
    let closed = BooleanDisposable::new();
    let upstream = SingleAssignmentDisposable::new();
    let mut observer =
      AutoDetachObserver::new(TestObserver { values: values.clone() }, closed.clone(), upstream);

    Observer::<i32, ()>::next(&mut observer, 1);
    closed.dispose();
    assert!(Observer::<i32, ()>::is_closed(&observer));
    Observer::<i32, ()>::next(&mut observer, 2);
    Observer::<i32, ()>::complete(observer);
    assert_eq!(*values.borrow(), vec![1]);
  }

  #[rxstream_macro::test]
  fn auto_detach_releases_upstream_on_terminal() {
    let values = Rc::new(RefCell::new(vec![]));
    let closed = BooleanDisposable::new();
    let upstream = SingleAssignmentDisposable::new();
    let source = BooleanDisposable::new();
    upstream.set(source.clone()).unwrap();
    let observer =
      AutoDetachObserver::new(TestObserver { values: values.clone() }, closed.clone(), upstream);

    Observer::<i32, ()>::error(observer, ());
    assert_eq!(*values.borrow(), vec![-1]);
    assert!(closed.is_disposed());
    assert!(source.is_disposed());
  }

  #[rxstream_macro::test]
  fn notifier_round_trip() {
    let values = Rc::new(RefCell::new(vec![]));
    let mut notify = to_notifier(TestObserver { values: values.clone() });
    notify(Notification::Next(5));
    notify(Notification::Completed);
    notify(Notification::Next(6));
    assert_eq!(*values.borrow(), vec![5, 0]);

    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let mut observer = from_notifier(move |n: Notification<i32, ()>| c_seen.borrow_mut().push(n));
    Observer::<i32, ()>::next(&mut observer, 1);
    Observer::<i32, ()>::error(observer, ());
    assert_eq!(*seen.borrow(), vec![Notification::Next(1), Notification::Error(())]);
  }

  #[rxstream_macro::test]
  fn shared_option_observer_terminates_once() {
    let values = Rc::new(RefCell::new(vec![]));
    let shared = MutRc::own(Some(TestObserver { values: values.clone() }));
    let mut a = shared.clone();
    Observer::<i32, ()>::next(&mut a, 3);
    Observer::<i32, ()>::complete(a);
    assert!(Observer::<i32, ()>::is_closed(&shared));
    Observer::<i32, ()>::complete(shared);
    assert_eq!(*values.borrow(), vec![3, 0]);
  }

  struct Echo {
    me: Rc<RefCell<Option<CheckedObserver<Echo>>>>,
    outcomes: Rc<RefCell<Vec<Result<(), ObserverError>>>>,
  }

  impl Observer<i32, ()> for Echo {
    fn next(&mut self, value: i32) {
      let me = self.me.borrow().clone();
      if let (1, Some(me)) = (value, me) {
        self.outcomes.borrow_mut().push(me.try_next::<i32, ()>(2));
      }
    }

    fn error(self, _: ()) {}

    fn complete(self) {}

    fn is_closed(&self) -> bool { false }
  }

  #[rxstream_macro::test]
  fn checked_refuses_signals_after_terminal() {
    let values = Rc::new(RefCell::new(vec![]));
    let observer = checked(TestObserver { values: values.clone() });
    assert_eq!(observer.try_next::<i32, ()>(1), Ok(()));
    assert_eq!(observer.try_complete::<i32, ()>(), Ok(()));
    assert_eq!(observer.try_next::<i32, ()>(2), Err(ObserverError::Terminated));
    assert_eq!(observer.try_error::<i32, ()>(()), Err(ObserverError::Terminated));
    assert!(Observer::<i32, ()>::is_closed(&observer));
    assert_eq!(*values.borrow(), vec![1, 0]);
  }

  #[rxstream_macro::test]
  fn checked_refuses_reentrant_next() {
    let me = Rc::new(RefCell::new(None));
    let outcomes = Rc::new(RefCell::new(vec![]));
    let observer = checked(Echo { me: me.clone(), outcomes: outcomes.clone() });
    *me.borrow_mut() = Some(observer.clone());

    assert_eq!(observer.try_next::<i32, ()>(1), Ok(()));
    assert_eq!(*outcomes.borrow(), vec![Err(ObserverError::Reentrant)]);
    assert_eq!(observer.try_next::<i32, ()>(3), Ok(()));
    me.borrow_mut().take();
  }

  #[rxstream_macro::test]
  fn checked_observer_drops_refused_signals() {
    let values = Rc::new(RefCell::new(vec![]));
    let observer = checked(TestObserver { values: values.clone() });
    let mut other = observer.clone();
    Observer::<i32, ()>::error(observer, ());
    Observer::<i32, ()>::next(&mut other, 4);
    Observer::<i32, ()>::complete(other);
    assert_eq!(*values.borrow(), vec![-1]);
  }

  #[rxstream_macro::test]
  fn as_observer_erases_the_type() {
    let values = Rc::new(RefCell::new(vec![]));
    let mut observer = as_observer(TestObserver { values: values.clone() });
    observer.next(8);
    observer.complete();
    assert_eq!(*values.borrow(), vec![8, 0]);
  }
}
