use crate::{
  disposable::Subscription,
  observable::Observable,
  observer::Observer,
  rc::MutRc,
};

/// A subject assembled from an independent observer and observable.
///
/// Signals pushed into it go to `observer`; subscribing to it subscribes to
/// `observable`. Useful to expose a pipeline's input and output as one
/// value.
pub struct AnonymousSubject<O, S> {
  observer: MutRc<Option<O>>,
  observable: S,
}

impl<O, S: Clone> Clone for AnonymousSubject<O, S> {
  fn clone(&self) -> Self {
    Self { observer: self.observer.clone(), observable: self.observable.clone() }
  }
}

impl<O, S> AnonymousSubject<O, S> {
  pub fn new(observer: O, observable: S) -> Self {
    Self { observer: MutRc::own(Some(observer)), observable }
  }
}

impl<Item, Err, O, S> Observer<Item, Err> for AnonymousSubject<O, S>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

impl<O, S: Observable> Observable for AnonymousSubject<O, S> {
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<Ob>(self, observer: Ob) -> Subscription
  where
    Ob: Observer<Self::Item, Self::Err> + 'static,
  {
    self.observable.actual_subscribe(observer)
  }
}
