//! Sequential fallback that ignores errors.
//!
//! Each source runs to its end, whether it completes or fails, then the next
//! one is subscribed. Errors are swallowed, including the last source's, so
//! the result only ever completes. Like `retry`, a source ending during its
//! own subscription does not recurse into the next one.

use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

use crate::{
  disposable::{Disposable, SerialDisposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
};

/// Continues with the next source whenever the current one terminates.
#[derive(Clone)]
pub struct OnErrorResumeNextOp<S> {
  sources: Vec<S>,
}

impl<S> OnErrorResumeNextOp<S> {
  pub(crate) fn new(sources: Vec<S>) -> Self { Self { sources } }
}

/// Runs `sources` one after another, moving on after a completion or an
/// error alike.
pub fn on_error_resume_next<S, I>(sources: I) -> OnErrorResumeNextOp<S>
where
  I: IntoIterator<Item = S>,
  S: Observable,
{
  OnErrorResumeNextOp::new(sources.into_iter().collect())
}

impl<S> Observable for OnErrorResumeNextOp<S>
where
  S: Observable + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let shared = Rc::new(Chain {
      sources: RefCell::new(self.sources.into()),
      serial: SerialDisposable::new(),
      pending: RefCell::new(None),
      draining: Cell::new(false),
    });
    subscribe_next(&shared, observer);
    shared.serial.clone().into()
  }
}

struct Chain<S, O> {
  sources: RefCell<VecDeque<S>>,
  serial: SerialDisposable,
  pending: RefCell<Option<O>>,
  draining: Cell<bool>,
}

fn subscribe_next<S, O>(shared: &Rc<Chain<S, O>>, observer: O)
where
  S: Observable + 'static,
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
    let next = shared.sources.borrow_mut().pop_front();
    let Some(source) = next else {
      observer.complete();
      break;
    };
    let slot = SingleAssignmentDisposable::new();
    shared.serial.set(slot.clone());
    let observer = ChainObserver { observer, shared: shared.clone() };
    let _ = slot.set(source.actual_subscribe(observer));
  }
  shared.draining.set(false);
}

struct ChainObserver<S, O> {
  observer: O,
  shared: Rc<Chain<S, O>>,
}

impl<S, O> Observer<S::Item, S::Err> for ChainObserver<S, O>
where
  S: Observable + 'static,
  O: Observer<S::Item, S::Err> + 'static,
{
  #[inline]
  fn next(&mut self, value: S::Item) { self.observer.next(value) }

  fn error(self, _: S::Err) { subscribe_next(&self.shared, self.observer) }

  fn complete(self) { subscribe_next(&self.shared, self.observer) }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::{
    observable::{from_iter, throw_err, ObservableExt},
    subject::Subject,
  };

  fn record<S>(source: S) -> Rc<RefCell<Vec<String>>>
  where
    S: Observable<Item = i32, Err = &'static str> + 'static,
  {
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2, c3) = (log.clone(), log.clone(), log.clone());
    source.subscribe_all(
      move |v| c1.borrow_mut().push(v.to_string()),
      move |e| c2.borrow_mut().push(format!("!{e}")),
      move || c3.borrow_mut().push(".".into()),
    );
    log
  }

  #[rxstream_macro::test]
  fn moves_on_after_error_and_completion() {
    let log = record(on_error_resume_next([
      from_iter::<_, &'static str>(vec![1, 2]).box_it(),
      throw_err::<i32, _>("bad").box_it(),
      from_iter(vec![3]).box_it(),
    ]));
    assert_eq!(*log.borrow(), vec!["1", "2", "3", "."]);
  }

  #[rxstream_macro::test]
  fn last_error_is_swallowed() {
    let log = record(from_iter::<_, &'static str>(vec![1]).on_error_resume_next(throw_err("late")));
    assert_eq!(*log.borrow(), vec!["1", "."]);
  }

  #[rxstream_macro::test]
  fn no_sources_completes() {
    let log = record(on_error_resume_next(Vec::<Subject<i32, &'static str>>::new()));
    assert_eq!(*log.borrow(), vec!["."]);
  }

  #[rxstream_macro::test]
  fn dispose_stops_the_chain() {
    let first = Subject::<i32, &'static str>::new();
    let second = Subject::<i32, &'static str>::new();
    let sub =
      on_error_resume_next([first.clone(), second.clone()]).subscribe_all(|_| {}, |_| {}, || {});
    assert!(first.has_observers());
    sub.dispose();
    assert!(!first.has_observers());
    first.clone().error("gone");
    assert!(!second.has_observers());
  }

  #[rxstream_macro::test]
  fn many_synchronous_failures_do_not_recurse() {
    let sources = (0..50_000).map(|_| throw_err::<i32, &'static str>("x"));
    let log = record(on_error_resume_next(sources));
    assert_eq!(*log.borrow(), vec!["."]);
  }
}
