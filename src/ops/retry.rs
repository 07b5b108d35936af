//! Resubscription operators.
//!
//! `retry` resubscribes to the source when it errors and `repeat` when it
//! completes. A synchronous source that fails or completes during its own
//! subscription does not recurse: the next attempt is queued and started
//! once the current `actual_subscribe` call has returned.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//!
//! use rxstream::prelude::*;
//!
//! let attempts = Rc::new(Cell::new(0));
//! let c_attempts = attempts.clone();
//! let source = observable::create(move |mut subscriber| {
//!   c_attempts.set(c_attempts.get() + 1);
//!   if c_attempts.get() < 3 {
//!     subscriber.error("flaky");
//!   } else {
//!     subscriber.next(1);
//!     subscriber.complete();
//!   }
//!   Subscription::empty()
//! });
//!
//! source.retry(5).subscribe_all(|v| assert_eq!(v, 1), |_| unreachable!(), || {});
//! assert_eq!(attempts.get(), 3);
//! ```

use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use crate::{
  disposable::{Disposable, SerialDisposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
};

/// Resubscribes to the source on error, at most `count` more times, or
/// without limit when `count` is `None`.
#[derive(Clone)]
pub struct RetryOp<S> {
  source: S,
  count: Option<usize>,
}

impl<S> RetryOp<S> {
  pub(crate) fn new(source: S, count: Option<usize>) -> Self { Self { source, count } }
}

impl<S> Observable for RetryOp<S>
where
  S: Observable + Clone + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    start(self.source, self.count, Trigger::Error, observer)
  }
}

/// Resubscribes to the source on completion, at most `count` more times, or
/// without limit when `count` is `None`.
#[derive(Clone)]
pub struct RepeatOp<S> {
  source: S,
  count: Option<usize>,
}

impl<S> RepeatOp<S> {
  pub(crate) fn new(source: S, count: Option<usize>) -> Self { Self { source, count } }
}

impl<S> Observable for RepeatOp<S>
where
  S: Observable + Clone + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    start(self.source, self.count, Trigger::Complete, observer)
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Trigger {
  Error,
  Complete,
}

struct Resubscribe<S, O> {
  source: S,
  trigger: Trigger,
  remaining: Cell<Option<usize>>,
  serial: SerialDisposable,
  pending: RefCell<Option<O>>,
  draining: Cell<bool>,
}

impl<S, O> Resubscribe<S, O> {
  /// Consumes one attempt, if any is left.
  fn take_attempt(&self) -> bool {
    match self.remaining.get() {
      None => true,
      Some(0) => false,
      Some(n) => {
        self.remaining.set(Some(n - 1));
        true
      }
    }
  }
}

fn start<S, O>(source: S, count: Option<usize>, trigger: Trigger, observer: O) -> Subscription
where
  S: Observable + Clone + 'static,
  O: Observer<S::Item, S::Err> + 'static,
{
  let shared = Rc::new(Resubscribe {
    source,
    trigger,
    remaining: Cell::new(count),
    serial: SerialDisposable::new(),
    pending: RefCell::new(None),
    draining: Cell::new(false),
  });
  subscribe_next(&shared, observer);
  shared.serial.clone().into()
}

fn subscribe_next<S, O>(shared: &Rc<Resubscribe<S, O>>, observer: O)
where
  S: Observable + Clone + 'static,
  O: Observer<S::Item, S::Err> + 'static,
{
  *shared.pending.borrow_mut() = Some(observer);
  if shared.draining.replace(true) {
    return;
  }
  loop {
    let pending = shared.pending.borrow_mut().take();
    let Some(observer) = pending else { break };
    if shared.serial.is_disposed() || observer.is_closed() {
      break;
    }
    let slot = SingleAssignmentDisposable::new();
    shared.serial.set(slot.clone());
    let observer = ResubscribeObserver { observer, shared: shared.clone() };
    let _ = slot.set(shared.source.clone().actual_subscribe(observer));
  }
  shared.draining.set(false);
}

struct ResubscribeObserver<S, O> {
  observer: O,
  shared: Rc<Resubscribe<S, O>>,
}

impl<S, O> Observer<S::Item, S::Err> for ResubscribeObserver<S, O>
where
  S: Observable + Clone + 'static,
  O: Observer<S::Item, S::Err> + 'static,
{
  #[inline]
  fn next(&mut self, value: S::Item) { self.observer.next(value) }

  fn error(self, err: S::Err) {
    if self.shared.trigger == Trigger::Error && self.shared.take_attempt() {
      subscribe_next(&self.shared, self.observer);
    } else {
      self.observer.error(err)
    }
  }

  fn complete(self) {
    if self.shared.trigger == Trigger::Complete && self.shared.take_attempt() {
      subscribe_next(&self.shared, self.observer);
    } else {
      self.observer.complete()
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::{Cell, RefCell},
    convert::Infallible,
    rc::Rc,
  };

  use crate::{
    disposable::{Disposable, Subscription},
    observable::{create, defer, of, throw_err, Observable, ObservableExt},
    observer::{Emitter, Observer},
    subject::Subject,
  };

  #[rxstream_macro::test]
  fn retry_gives_up_with_last_error() {
    let attempts = Rc::new(Cell::new(0));
    let c_attempts = attempts.clone();
    let err = Rc::new(RefCell::new(None));
    let c_err = err.clone();
    create(move |mut subscriber| {
      c_attempts.set(c_attempts.get() + 1);
      subscriber.next(c_attempts.get());
      subscriber.error(c_attempts.get());
      Subscription::empty()
    })
    .retry(2)
    .subscribe_all(|_| {}, move |e| *c_err.borrow_mut() = Some(e), || {});

    assert_eq!(attempts.get(), 3);
    assert_eq!(*err.borrow(), Some(3));
  }

  type Subjects<Err> = Rc<RefCell<Vec<Subject<i32, Err>>>>;

  /// A cold source handing a fresh subject to every subscription.
  fn fresh_subjects<Err: Clone + 'static>() -> (Subjects<Err>, impl Observable<Item = i32, Err = Err> + Clone) {
    let subjects: Subjects<Err> = Rc::new(RefCell::new(vec![]));
    let c_subjects = subjects.clone();
    let source = defer(move || {
      let subject = Subject::new();
      c_subjects.borrow_mut().push(subject.clone());
      subject
    });
    (subjects, source)
  }

  fn latest<Err>(subjects: &Subjects<Err>) -> Subject<i32, Err> {
    subjects.borrow().last().cloned().unwrap()
  }

  #[rxstream_macro::test]
  fn retry_forward_values_of_every_attempt() {
    let (subjects, source) = fresh_subjects::<&'static str>();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    source.retry_forever().subscribe_all(
      move |v| c_seen.borrow_mut().push(v),
      |_| unreachable!(),
      || {},
    );
    latest(&subjects).next(1);
    latest(&subjects).error("reset");
    latest(&subjects).next(2);
    assert_eq!(*seen.borrow(), vec![1, 2]);
    assert_eq!(subjects.borrow().len(), 2);
    assert!(!subjects.borrow()[0].has_observers());
  }

  #[rxstream_macro::test]
  fn repeat_counts_resubscriptions() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    of::<_, Infallible>(7).repeat(2).subscribe(move |v| c_seen.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec![7, 7, 7]);
  }

  #[rxstream_macro::test]
  fn deep_synchronous_repeat_does_not_recurse() {
    let hits = Rc::new(Cell::new(0usize));
    let c_hits = hits.clone();
    of::<_, Infallible>(()).repeat(100_000).subscribe(move |_| c_hits.set(c_hits.get() + 1));
    assert_eq!(hits.get(), 100_001);
  }

  #[rxstream_macro::test]
  fn repeat_forever_until_disposed() {
    let (subjects, source) = fresh_subjects::<()>();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let sub = source.repeat_forever().subscribe_all(
      move |v| c_seen.borrow_mut().push(v),
      |_| {},
      || unreachable!(),
    );
    latest(&subjects).next(1);
    latest(&subjects).complete();
    latest(&subjects).next(2);
    sub.dispose();
    assert!(!latest(&subjects).has_observers());
    assert_eq!(subjects.borrow().len(), 2);
    assert_eq!(*seen.borrow(), vec![1, 2]);
  }

  #[rxstream_macro::test]
  fn no_retry_for_zero_count() {
    let err = Rc::new(Cell::new(false));
    let c_err = err.clone();
    throw_err::<i32, _>(()).retry(0).subscribe_all(|_| {}, move |_| c_err.set(true), || {});
    assert!(err.get());
  }
}
