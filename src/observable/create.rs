use std::marker::PhantomData;

use crate::{
  disposable::Subscription,
  observable::Observable,
  observer::{BoxedObserver, Emitter, Observer},
  rc::{MutRc, RcDeref, RcDerefMut},
};

/// Creates an observable from a subscribe function.
///
/// `f` runs once per subscription. It receives a [`Subscriber`] to push
/// signals into, and returns the subscription that tears the producer down.
/// The subscriber is clonable and may be moved into callbacks that fire
/// later.
///
/// # Examples
///
/// ```rust
/// use std::convert::Infallible;
///
/// use rxstream::prelude::*;
///
/// observable::create::<_, Infallible, _>(|mut subscriber| {
///   subscriber.next(1);
///   subscriber.next(2);
///   subscriber.complete();
///   Subscription::empty()
/// })
/// .subscribe(|v| println!("{v}"));
/// ```
pub fn create<Item, Err, F>(f: F) -> Create<F, Item, Err>
where
  F: FnOnce(Subscriber<Item, Err>) -> Subscription,
{
  Create { f, _marker: PhantomData }
}

#[derive(Clone)]
pub struct Create<F, Item, Err> {
  f: F,
  _marker: PhantomData<(Item, Err)>,
}

impl<F, Item, Err> Observable for Create<F, Item, Err>
where
  Item: 'static,
  Err: 'static,
  F: FnOnce(Subscriber<Item, Err>) -> Subscription,
{
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    let subscriber = Subscriber(MutRc::own(Some(Box::new(observer) as BoxedObserver<Item, Err>)));
    (self.f)(subscriber)
  }
}

/// Handle a [`create`] producer emits through.
///
/// Clones share the downstream observer. Once a terminal signal went out,
/// further signals from any clone are dropped.
pub struct Subscriber<Item, Err>(MutRc<Option<BoxedObserver<Item, Err>>>);

impl<Item, Err> Clone for Subscriber<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> Emitter<Item, Err> for Subscriber<Item, Err> {
  fn next(&mut self, value: Item) {
    if let Some(observer) = self.0.rc_deref_mut().as_mut() {
      observer.next(value);
    }
  }

  fn error(&mut self, err: Err) {
    let observer = self.0.take();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(&mut self) {
    let observer = self.0.take();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.0.rc_deref().as_ref().map_or(true, |o| o.is_closed()) }
}
