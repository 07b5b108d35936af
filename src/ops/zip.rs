//! Zip operator implementation
//!
//! Zip combines items from several observables pairwise: it buffers the
//! values of each source in its own queue and emits a combination as soon
//! as every queue holds at least one value.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use super::CombineItem;
use crate::{
  disposable::{CompositeDisposable, Disposable, SingleAssignmentDisposable, Subscription},
  observable::{BoxedObservable, Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
};

/// Pairs up the n-th values of every source through `selector`.
///
/// Completes as soon as a completed source has no buffered value left,
/// since no further combination can form.
pub fn zip_all<S, F, R>(sources: impl IntoIterator<Item = S>, selector: F) -> ZipAll<S, F>
where
  S: Observable,
  F: FnMut(Vec<S::Item>) -> R + 'static,
{
  ZipAll { sources: sources.into_iter().collect(), selector }
}

#[derive(Clone)]
pub struct ZipAll<S, F> {
  sources: Vec<S>,
  selector: F,
}

impl<S, F, R> Observable for ZipAll<S, F>
where
  S: Observable,
  F: FnMut(Vec<S::Item>) -> R + 'static,
  R: 'static,
{
  type Item = R;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<R, S::Err> + 'static,
  {
    let mut selector = self.selector;
    subscribe_sources(self.sources, move |values| Some(selector(values)), observer)
  }
}

/// Zip operator
///
/// Combines items from two observables pairwise through a binary selector.
#[derive(Clone)]
pub struct ZipOp<A, B, F> {
  source_a: A,
  source_b: B,
  binary_op: F,
}

impl<A, B, F> ZipOp<A, B, F> {
  pub(crate) fn new(source_a: A, source_b: B, binary_op: F) -> Self {
    Self { source_a, source_b, binary_op }
  }
}

impl<A, B, F, R> Observable for ZipOp<A, B, F>
where
  A: Observable + 'static,
  B: Observable<Err = A::Err> + 'static,
  F: FnMut(A::Item, B::Item) -> R + 'static,
  R: 'static,
{
  type Item = R;
  type Err = A::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<R, A::Err> + 'static,
  {
    let sources: Vec<BoxedObservable<CombineItem<A::Item, B::Item>, A::Err>> = vec![
      self.source_a.map(CombineItem::ItemA).box_it(),
      self.source_b.map(CombineItem::ItemB).box_it(),
    ];
    let mut binary_op = self.binary_op;
    let selector = move |values: Vec<CombineItem<A::Item, B::Item>>| {
      let mut values = values.into_iter();
      match (values.next(), values.next()) {
        (Some(CombineItem::ItemA(a)), Some(CombineItem::ItemB(b))) => Some(binary_op(a, b)),
        _ => None,
      }
    };
    subscribe_sources(sources, selector, observer)
  }
}

// ==================== Shared State ====================

struct ZipState<Item> {
  queues: Vec<VecDeque<Item>>,
  done: Vec<bool>,
}

impl<Item> ZipState<Item> {
  /// Pops one value from every queue once all of them are non-empty.
  fn pop_combination(&mut self) -> Option<Vec<Item>> {
    if self.queues.iter().any(VecDeque::is_empty) {
      return None;
    }
    self.queues.iter_mut().map(VecDeque::pop_front).collect()
  }

  /// A completed source with nothing buffered can never pair up again.
  fn exhausted(&self) -> bool {
    self.done.iter().zip(&self.queues).any(|(done, queue)| *done && queue.is_empty())
  }
}

struct ZipShared<O, Item, F> {
  observer: MutRc<Option<O>>,
  group: CompositeDisposable,
  state: RefCell<ZipState<Item>>,
  selector: RefCell<F>,
}

impl<O, Item, F> ZipShared<O, Item, F> {
  fn finish<R, Err>(&self)
  where
    O: Observer<R, Err>,
  {
    let observer = self.observer.take();
    self.group.dispose();
    if let Some(observer) = observer {
      observer.complete();
    }
  }
}

fn subscribe_sources<S, F, R, O>(sources: Vec<S>, selector: F, observer: O) -> Subscription
where
  S: Observable,
  F: FnMut(Vec<S::Item>) -> Option<R> + 'static,
  R: 'static,
  O: Observer<R, S::Err> + 'static,
{
  let group = CompositeDisposable::new();
  if sources.is_empty() {
    observer.complete();
    return group.into();
  }

  let count = sources.len();
  let shared = Rc::new(ZipShared {
    observer: MutRc::own(Some(observer)),
    group: group.clone(),
    state: RefCell::new(ZipState {
      queues: (0..count).map(|_| VecDeque::new()).collect(),
      done: vec![false; count],
    }),
    selector: RefCell::new(selector),
  });

  for (index, source) in sources.into_iter().enumerate() {
    if shared.observer.is_closed() {
      break;
    }
    let slot = SingleAssignmentDisposable::new();
    group.add(slot.clone());
    let _ = slot.set(source.actual_subscribe(ZipObserver { shared: shared.clone(), index }));
  }
  group.into()
}

struct ZipObserver<O, Item, F> {
  shared: Rc<ZipShared<O, Item, F>>,
  index: usize,
}

impl<O, Item, Err, F, R> Observer<Item, Err> for ZipObserver<O, Item, F>
where
  F: FnMut(Vec<Item>) -> Option<R>,
  O: Observer<R, Err>,
{
  fn next(&mut self, value: Item) {
    let (values, exhausted) = {
      let mut state = self.shared.state.borrow_mut();
      state.queues[self.index].push_back(value);
      let values = state.pop_combination();
      (values, state.exhausted())
    };
    if let Some(values) = values {
      let combined = {
        let mut selector = self.shared.selector.borrow_mut();
        (&mut *selector)(values)
      };
      if let Some(combined) = combined {
        self.shared.observer.clone().next(combined);
      }
    }
    if exhausted {
      self.shared.finish::<R, Err>();
    }
  }

  fn error(self, err: Err) {
    let observer = self.shared.observer.take();
    self.shared.group.dispose();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    let exhausted = {
      let mut state = self.shared.state.borrow_mut();
      state.done[self.index] = true;
      state.exhausted()
    };
    if exhausted {
      self.shared.finish::<R, Err>();
    }
  }

  fn is_closed(&self) -> bool { self.shared.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use super::*;
  use crate::{observable::from_iter, subject::Subject};

  #[rxstream_macro::test]
  fn pairs_values_in_order() {
    let a = Subject::<i32, Infallible>::new();
    let b = Subject::<&'static str, Infallible>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    a.clone().zip(b.clone(), |n, s| format!("{n}{s}")).subscribe(move |v| c_seen.borrow_mut().push(v));

    a.clone().next(1);
    a.clone().next(2);
    b.clone().next("a");
    a.clone().next(3);
    b.clone().next("b");
    b.clone().next("c");
    assert_eq!(*seen.borrow(), vec!["1a", "2b", "3c"]);
  }

  #[rxstream_macro::test]
  fn completes_when_a_finished_source_is_drained() {
    let a = Subject::<i32, Infallible>::new();
    let b = Subject::<i32, Infallible>::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (log.clone(), log.clone());
    a.clone().zip(b.clone(), |x, y| x + y).subscribe_all(
      move |v| c1.borrow_mut().push(v),
      |_| {},
      move || c2.borrow_mut().push(-1),
    );

    a.clone().next(1);
    a.clone().next(2);
    a.clone().complete();
    assert!(log.borrow().is_empty());
    b.clone().next(10);
    assert_eq!(*log.borrow(), vec![11]);
    b.clone().next(20);
    assert_eq!(*log.borrow(), vec![11, 22, -1]);
    assert!(!b.has_observers());
  }

  #[rxstream_macro::test]
  fn synchronous_sources() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    zip_all(vec![from_iter::<_, Infallible>(0..3), from_iter(10..20), from_iter(100..105)], |v| {
      v.iter().sum::<i32>()
    })
    .subscribe(move |v| c_seen.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec![110, 113, 116]);
  }
}
