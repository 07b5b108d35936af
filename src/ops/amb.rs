//! Races several sources and mirrors the first one to signal.
//!
//! The first signal of any kind (a value, an error or a completion) picks the
//! winner. Every other source is unsubscribed at that point and sources that
//! were not subscribed yet are skipped.

use std::{cell::Cell, rc::Rc};

use crate::{
  disposable::{CompositeDisposable, Disposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  rc::MutRc,
};

/// Mirrors whichever source signals first.
#[derive(Clone)]
pub struct AmbOp<S> {
  sources: Vec<S>,
}

impl<S> AmbOp<S> {
  pub(crate) fn new(sources: Vec<S>) -> Self { Self { sources } }
}

/// Races `sources`. With no sources the result never signals.
pub fn amb<S, I>(sources: I) -> AmbOp<S>
where
  I: IntoIterator<Item = S>,
  S: Observable,
{
  AmbOp::new(sources.into_iter().collect())
}

impl<S> Observable for AmbOp<S>
where
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let group = CompositeDisposable::new();
    let slots: Vec<_> = self.sources.iter().map(|_| SingleAssignmentDisposable::new()).collect();
    for slot in &slots {
      group.add(slot.clone());
    }
    let shared = Rc::new(AmbShared {
      observer: MutRc::own(Some(observer)),
      winner: Cell::new(None),
      slots,
      group: group.clone(),
    });

    for (index, source) in self.sources.into_iter().enumerate() {
      if shared.winner.get().is_some() || shared.observer.is_closed() {
        break;
      }
      let observer = AmbObserver { index, shared: shared.clone() };
      let _ = shared.slots[index].set(source.actual_subscribe(observer));
    }
    group.into()
  }
}

struct AmbShared<O> {
  observer: MutRc<Option<O>>,
  winner: Cell<Option<usize>>,
  slots: Vec<SingleAssignmentDisposable>,
  group: CompositeDisposable,
}

impl<O> AmbShared<O> {
  /// Whether source `index` may deliver. The first caller becomes the winner
  /// and the other sources are unsubscribed.
  fn claim(&self, index: usize) -> bool {
    match self.winner.get() {
      Some(winner) => winner == index,
      None => {
        self.winner.set(Some(index));
        for (i, slot) in self.slots.iter().enumerate() {
          if i != index {
            slot.dispose();
          }
        }
        true
      }
    }
  }

  fn take_and_dispose(&self) -> Option<O> {
    let observer = self.observer.take();
    self.group.dispose();
    observer
  }
}

struct AmbObserver<O> {
  index: usize,
  shared: Rc<AmbShared<O>>,
}

impl<O, Item, Err> Observer<Item, Err> for AmbObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.shared.claim(self.index) {
      self.shared.observer.clone().next(value);
    }
  }

  fn error(self, err: Err) {
    if self.shared.claim(self.index) {
      self.shared.take_and_dispose().error(err);
    }
  }

  fn complete(self) {
    if self.shared.claim(self.index) {
      self.shared.take_and_dispose().complete();
    }
  }

  fn is_closed(&self) -> bool {
    self.shared.winner.get().is_some_and(|w| w != self.index) || self.shared.observer.is_closed()
  }
}
