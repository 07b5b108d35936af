use std::rc::Rc;

use crate::{
  disposable::{CompositeDisposable, Disposable, Subscription},
  observable::Observable,
  observer::Observer,
};

/// Ties a resource to the lifetime of each subscription.
///
/// On subscribe `resource_factory` creates the resource and
/// `observable_factory` builds the sequence from it. The resource is
/// disposed when the sequence terminates or the subscription is disposed,
/// whichever happens first.
///
/// ```rust
/// use std::convert::Infallible;
///
/// use rxstream::prelude::*;
///
/// let released = BooleanDisposable::new();
/// let resource = released.clone();
/// observable::using(move || resource, |_| observable::of::<_, Infallible>(1))
///   .subscribe(|v| assert_eq!(v, 1));
/// assert!(released.is_disposed());
/// ```
pub fn using<R, RF, S, SF>(resource_factory: RF, observable_factory: SF) -> Using<RF, SF>
where
  RF: FnOnce() -> R,
  SF: FnOnce(&R) -> S,
  R: Disposable + 'static,
  S: Observable,
{
  Using { resource_factory, observable_factory }
}

#[derive(Clone)]
pub struct Using<RF, SF> {
  resource_factory: RF,
  observable_factory: SF,
}

impl<R, RF, S, SF> Observable for Using<RF, SF>
where
  RF: FnOnce() -> R,
  SF: FnOnce(&R) -> S,
  R: Disposable + 'static,
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let resource = Rc::new((self.resource_factory)());
    let source = (self.observable_factory)(&*resource);
    let release: Subscription = Subscription::new(resource);
    let observer = UsingObserver { observer, resource: release.clone() };
    CompositeDisposable::from_iter([source.actual_subscribe(observer), release]).into()
  }
}

struct UsingObserver<O> {
  observer: O,
  resource: Subscription,
}

impl<O, Item, Err> Observer<Item, Err> for UsingObserver<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    self.observer.error(err);
    self.resource.dispose();
  }

  fn complete(self) {
    self.observer.complete();
    self.resource.dispose();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
