use crate::{disposable::Subscription, observable::Observable, observer::Observer};

pub type NoopError<Err> = fn(&Err);
pub type NoopComplete = fn();

pub(crate) fn noop_error<Err>(_: &Err) {}

pub(crate) fn noop_complete() {}

/// Invokes side effects for each signal, then forwards it unchanged.
#[derive(Clone)]
pub struct TapOp<S, N, E, C> {
  source: S,
  on_next: N,
  on_error: E,
  on_complete: C,
}

impl<S, N, E, C> TapOp<S, N, E, C> {
  pub(crate) fn new(source: S, on_next: N, on_error: E, on_complete: C) -> Self {
    Self { source, on_next, on_error, on_complete }
  }
}

impl<S, N, E, C> Observable for TapOp<S, N, E, C>
where
  S: Observable,
  N: FnMut(&S::Item) + 'static,
  E: FnOnce(&S::Err) + 'static,
  C: FnOnce() + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    self.source.actual_subscribe(TapObserver {
      observer,
      on_next: self.on_next,
      on_error: self.on_error,
      on_complete: self.on_complete,
    })
  }
}

pub struct TapObserver<O, N, E, C> {
  observer: O,
  on_next: N,
  on_error: E,
  on_complete: C,
}

impl<Item, Err, O, N, E, C> Observer<Item, Err> for TapObserver<O, N, E, C>
where
  O: Observer<Item, Err>,
  N: FnMut(&Item),
  E: FnOnce(&Err),
  C: FnOnce(),
{
  fn next(&mut self, value: Item) {
    (self.on_next)(&value);
    self.observer.next(value)
  }

  fn error(self, err: Err) {
    (self.on_error)(&err);
    self.observer.error(err)
  }

  fn complete(self) {
    (self.on_complete)();
    self.observer.complete()
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
