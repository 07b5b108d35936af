use super::merge_all::MergeAllOp;
use crate::{
  disposable::Subscription,
  observable::{from_iter, BoxedObservable, FromIter, Observable, ObservableExt},
  observer::Observer,
};

/// Merges every observable of `sources` into one. See
/// [`merge_all`](ObservableExt::merge_all).
pub fn merge<I>(sources: I) -> Merge<I, <I::Item as Observable>::Err>
where
  I: IntoIterator,
  I::Item: Observable,
{
  MergeAllOp::new(from_iter(sources), usize::MAX)
}

pub type Merge<I, Err> = MergeAllOp<FromIter<I, Err>>;

/// Interleaves the values of two observables of the same item type.
#[derive(Clone)]
pub struct MergeOp<S1, S2> {
  source1: S1,
  source2: S2,
}

impl<S1, S2> MergeOp<S1, S2> {
  pub(crate) fn new(source1: S1, source2: S2) -> Self { Self { source1, source2 } }
}

impl<S1, S2> Observable for MergeOp<S1, S2>
where
  S1: Observable + 'static,
  S2: Observable<Item = S1::Item, Err = S1::Err> + 'static,
{
  type Item = S1::Item;
  type Err = S1::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S1::Item, S1::Err> + 'static,
  {
    merge([self.source1.box_it(), self.source2.box_it()]).actual_subscribe(observer)
  }
}

/// Emits every value of the first observable, then every value of the
/// second one.
#[derive(Clone)]
pub struct ConcatOp<S1, S2> {
  source1: S1,
  source2: S2,
}

impl<S1, S2> ConcatOp<S1, S2> {
  pub(crate) fn new(source1: S1, source2: S2) -> Self { Self { source1, source2 } }
}

impl<S1, S2> Observable for ConcatOp<S1, S2>
where
  S1: Observable + 'static,
  S2: Observable<Item = S1::Item, Err = S1::Err> + 'static,
{
  type Item = S1::Item;
  type Err = S1::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S1::Item, S1::Err> + 'static,
  {
    let sources: [BoxedObservable<S1::Item, S1::Err>; 2] =
      [self.source1.box_it(), self.source2.box_it()];
    from_iter(sources).concat_all().actual_subscribe(observer)
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use super::*;
  use crate::{
    disposable::Disposable,
    observable::{throw_err, ObservableExt},
    subject::Subject,
  };

  #[rxstream_macro::test]
  fn odd_even_merge() {
    let numbers = Subject::<i32, Infallible>::new();
    let even = numbers.clone().filter(|v| v % 2 == 0);
    let odd = numbers.clone().filter(|v| v % 2 != 0);

    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    even.merge(odd).subscribe(move |v| c_seen.borrow_mut().push(v));

    let mut emitter = numbers.clone();
    (0..6).for_each(|v| emitter.next(v));
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4, 5]);
  }

  #[rxstream_macro::test]
  fn completes_after_every_source() {
    let a = Subject::<i32, Infallible>::new();
    let b = Subject::<i32, Infallible>::new();
    let done = Rc::new(RefCell::new(false));
    let c_done = done.clone();
    a.clone().merge(b.clone()).subscribe_all(|_| {}, |_| {}, move || *c_done.borrow_mut() = true);

    a.clone().complete();
    assert!(!*done.borrow());
    b.clone().complete();
    assert!(*done.borrow());
  }

  #[rxstream_macro::test]
  fn merge_unsubscribe_work() {
    let a = Subject::<i32, Infallible>::new();
    let b = Subject::<i32, Infallible>::new();
    let sub = merge(vec![a.clone(), b.clone()]).subscribe(|_| {});
    assert!(a.has_observers() && b.has_observers());
    sub.dispose();
    assert!(!a.has_observers() && !b.has_observers());
  }

  #[rxstream_macro::test]
  fn concat_waits_for_first() {
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (log.clone(), log.clone());
    from_iter::<_, &str>(vec![1, 2])
      .concat(from_iter(vec![3]))
      .concat(throw_err("end"))
      .subscribe_all(
        move |v| c1.borrow_mut().push(v.to_string()),
        move |e| c2.borrow_mut().push(e.to_string()),
        || {},
      );
    assert_eq!(*log.borrow(), vec!["1", "2", "3", "end"]);
  }
}
