use std::marker::PhantomData;

use crate::{
  disposable::Subscription, notification::Notification, observable::Observable, observer::Observer,
};

/// Turns every signal of the source into a [`Notification`] value.
///
/// The terminal signal is emitted as a value too, followed by completion, so
/// the materialized stream never errors.
#[derive(Clone)]
pub struct MaterializeOp<S> {
  source: S,
}

impl<S> MaterializeOp<S> {
  pub(crate) fn new(source: S) -> Self { Self { source } }
}

impl<S: Observable> Observable for MaterializeOp<S> {
  type Item = Notification<S::Item, S::Err>;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, S::Err> + 'static,
  {
    self.source.actual_subscribe(MaterializeObserver { observer, _marker: PhantomData })
  }
}

pub struct MaterializeObserver<O, Item> {
  observer: O,
  _marker: PhantomData<fn(Item)>,
}

impl<O, Item, Err> Observer<Item, Err> for MaterializeObserver<O, Item>
where
  O: Observer<Notification<Item, Err>, Err>,
{
  fn next(&mut self, value: Item) { self.observer.next(Notification::Next(value)) }

  fn error(mut self, err: Err) {
    self.observer.next(Notification::Error(err));
    self.observer.complete()
  }

  fn complete(mut self) {
    self.observer.next(Notification::Completed);
    self.observer.complete()
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// Replays a stream of [`Notification`]s as signals. The first terminal
/// notification ends the stream.
#[derive(Clone)]
pub struct DematerializeOp<S> {
  source: S,
}

impl<S> DematerializeOp<S> {
  pub(crate) fn new(source: S) -> Self { Self { source } }
}

impl<S, Item> Observable for DematerializeOp<S>
where
  S: Observable<Item = Notification<Item, <S as Observable>::Err>>,
  Item: 'static,
{
  type Item = Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, S::Err> + 'static,
  {
    self.source.actual_subscribe(DematerializeObserver { observer: Some(observer) })
  }
}

pub struct DematerializeObserver<O> {
  observer: Option<O>,
}

impl<O, Item, Err> Observer<Notification<Item, Err>, Err> for DematerializeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, notification: Notification<Item, Err>) {
    notification.accept(&mut self.observer)
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::{
    notification::Notification,
    observable::{from_iter, throw_err, ObservableExt},
  };

  #[rxstream_macro::test]
  fn materialize_reifies_terminal() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    from_iter(vec![1, 2]).concat(throw_err("bad")).materialize().subscribe_all(
      move |n| c_seen.borrow_mut().push(n),
      |_| unreachable!(),
      || {},
    );
    assert_eq!(
      *seen.borrow(),
      vec![Notification::Next(1), Notification::Next(2), Notification::Error("bad")]
    );
  }

  #[rxstream_macro::test]
  fn dematerialize_stops_at_first_terminal() {
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2, c3) = (log.clone(), log.clone(), log.clone());
    from_iter::<_, String>(vec![
      Notification::Next(1),
      Notification::Error("first".to_string()),
      Notification::Next(2),
      Notification::Completed,
    ])
    .dematerialize()
    .subscribe_all(
      move |v| c1.borrow_mut().push(v.to_string()),
      move |e| c2.borrow_mut().push(e),
      move || c3.borrow_mut().push("done".into()),
    );
    assert_eq!(*log.borrow(), vec!["1", "first"]);
  }
}
