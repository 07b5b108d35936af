use crate::{disposable::Subscription, observable::Observable, observer::Observer};

#[derive(Clone)]
pub struct MapOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> MapOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { Self { source, func } }
}

impl<S, F, B> Observable for MapOp<S, F>
where
  S: Observable,
  F: FnMut(S::Item) -> B + 'static,
  B: 'static,
{
  type Item = B;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<B, S::Err> + 'static,
  {
    self.source.actual_subscribe(MapObserver { observer, map: self.func })
  }
}

pub struct MapObserver<O, F> {
  observer: O,
  map: F,
}

impl<Item, Err, B, O, F> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  fn next(&mut self, value: Item) { self.observer.next((self.map)(value)) }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
