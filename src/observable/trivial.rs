use std::marker::PhantomData;

use crate::{
  disposable::Subscription,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerExt,
};

/// Creates an observable that emits no items, just terminates with an error.
///
/// # Arguments
///
/// * `e` - An error to emit and terminate with
pub fn throw_err<Item, Err>(e: Err) -> ThrowErr<Item, Err> { ThrowErr { err: e, _item: PhantomData } }

pub struct ThrowErr<Item, Err> {
  err: Err,
  _item: PhantomData<Item>,
}

impl<Item, Err: Clone> Clone for ThrowErr<Item, Err> {
  fn clone(&self) -> Self { Self { err: self.err.clone(), _item: PhantomData } }
}

impl<Item: 'static, Err: 'static> Observable for ThrowErr<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.error(self.err);
    Subscription::empty()
  }
}

/// Creates an observable that produces no values.
///
/// Completes immediately. Never emits an error.
///
/// # Examples
/// ```
/// use rxstream::prelude::*;
///
/// observable::empty()
///   .subscribe(|v: i32| {println!("{},", v)});
///
/// // Result: no thing printed
/// ```
pub fn empty<Item, Err>() -> Empty<Item, Err> { Empty(PhantomData) }

pub struct Empty<Item, Err>(PhantomData<(Item, Err)>);

impl<Item, Err> Clone for Empty<Item, Err> {
  fn clone(&self) -> Self { Self(PhantomData) }
}

impl<Item: 'static, Err: 'static> Observable for Empty<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    observer.complete();
    Subscription::empty()
  }
}

/// Like [`empty`], completing through `scheduler`.
pub fn empty_on<Item, Err, S: SchedulerExt>(scheduler: S) -> EmptyOn<Item, Err, S> {
  EmptyOn { scheduler, _marker: PhantomData }
}

pub struct EmptyOn<Item, Err, S> {
  scheduler: S,
  _marker: PhantomData<(Item, Err)>,
}

impl<Item, Err, S: Clone> Clone for EmptyOn<Item, Err, S> {
  fn clone(&self) -> Self { Self { scheduler: self.scheduler.clone(), _marker: PhantomData } }
}

impl<Item: 'static, Err: 'static, S: SchedulerExt> Observable for EmptyOn<Item, Err, S> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    self.scheduler.schedule(move || observer.complete())
  }
}

/// Creates an observable that never emits anything.
///
/// Neither emits a value, nor completes, nor emits an error.
pub fn never<Item, Err>() -> Never<Item, Err> { Never(PhantomData) }

pub struct Never<Item, Err>(PhantomData<(Item, Err)>);

impl<Item, Err> Clone for Never<Item, Err> {
  fn clone(&self) -> Self { Self(PhantomData) }
}

impl<Item: 'static, Err: 'static> Observable for Never<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    // The observer is released when the subscription is disposed.
    let mut observer = Some(observer);
    Subscription::from_fn(move || drop(observer.take()))
  }
}
