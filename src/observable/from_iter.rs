use std::marker::PhantomData;

use crate::{
  disposable::Subscription,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerExt,
};

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Never emits an error.
///
/// # Arguments
///
/// * `iter` - An iterator to get all the values from.
///
/// # Examples
///
/// A simple example for a range:
///
/// ```
/// use rxstream::prelude::*;
///
/// observable::from_iter(0..10)
///   .subscribe(|v| {println!("{},", v)});
/// ```
///
/// Or with a vector:
///
/// ```
/// use rxstream::prelude::*;
///
/// observable::from_iter(vec![0,1,2,3])
///   .subscribe(|v| {println!("{},", v)});
/// ```
pub fn from_iter<Iter, Err>(iter: Iter) -> FromIter<Iter, Err>
where
  Iter: IntoIterator,
{
  FromIter { iter, _err: PhantomData }
}

pub struct FromIter<Iter, Err> {
  iter: Iter,
  _err: PhantomData<Err>,
}

impl<Iter: Clone, Err> Clone for FromIter<Iter, Err> {
  fn clone(&self) -> Self { Self { iter: self.iter.clone(), _err: PhantomData } }
}

impl<Iter, Err> Observable for FromIter<Iter, Err>
where
  Iter: IntoIterator,
  Iter::Item: 'static,
  Err: 'static,
{
  type Item = Iter::Item;
  type Err = Err;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<Self::Item, Err> + 'static,
  {
    for v in self.iter {
      if observer.is_closed() {
        return Subscription::empty();
      }
      observer.next(v);
    }
    observer.complete();
    Subscription::empty()
  }
}

/// Like [`from_iter`], but every element is emitted by its own scheduled
/// action on `scheduler`, followed by one more for completion.
pub fn from_iter_on<Iter, S, Err>(iter: Iter, scheduler: S) -> FromIterOn<Iter, S, Err>
where
  Iter: IntoIterator,
  S: SchedulerExt,
{
  FromIterOn { iter, scheduler, _err: PhantomData }
}

pub struct FromIterOn<Iter, S, Err> {
  iter: Iter,
  scheduler: S,
  _err: PhantomData<Err>,
}

impl<Iter: Clone, S: Clone, Err> Clone for FromIterOn<Iter, S, Err> {
  fn clone(&self) -> Self {
    Self { iter: self.iter.clone(), scheduler: self.scheduler.clone(), _err: PhantomData }
  }
}

impl<Iter, S, Err> Observable for FromIterOn<Iter, S, Err>
where
  Iter: IntoIterator,
  Iter::IntoIter: 'static,
  Iter::Item: 'static,
  S: SchedulerExt,
  Err: 'static,
{
  type Item = Iter::Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Err> + 'static,
  {
    let mut observer = Some(observer);
    self.scheduler.schedule_recursive_with_state(self.iter.into_iter(), move |mut iter, again| {
      if observer.is_closed() {
        return;
      }
      match iter.next() {
        Some(v) => {
          observer.next(v);
          if !observer.is_closed() {
            again(iter);
          }
        }
        None => observer.take().complete(),
      }
    })
  }
}

/// Creates an observable producing a single value, then completing.
///
/// # Examples
///
/// ```
/// use rxstream::prelude::*;
///
/// observable::of(123)
///   .subscribe(|v| {println!("{},", v)});
/// ```
pub fn of<Item, Err>(v: Item) -> Of<Item, Err> { Of { value: v, _err: PhantomData } }

pub struct Of<Item, Err> {
  value: Item,
  _err: PhantomData<Err>,
}

impl<Item: Clone, Err> Clone for Of<Item, Err> {
  fn clone(&self) -> Self { Self { value: self.value.clone(), _err: PhantomData } }
}

impl<Item: 'static, Err: 'static> Observable for Of<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.next(self.value);
    observer.complete();
    Subscription::empty()
  }
}
