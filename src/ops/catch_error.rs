use crate::{
  disposable::{SerialDisposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
};

/// On error, hands the error to `handler` and continues with the observable
/// it returns. Values and completion of the source pass through untouched.
#[derive(Clone)]
pub struct CatchErrorOp<S, F> {
  source: S,
  handler: F,
}

impl<S, F> CatchErrorOp<S, F> {
  pub(crate) fn new(source: S, handler: F) -> Self { Self { source, handler } }
}

impl<S, F, R> Observable for CatchErrorOp<S, F>
where
  S: Observable,
  R: Observable<Item = S::Item>,
  F: FnOnce(S::Err) -> R + 'static,
{
  type Item = S::Item;
  type Err = R::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, R::Err> + 'static,
  {
    let serial = SerialDisposable::new();
    let first = SingleAssignmentDisposable::new();
    serial.set(first.clone());
    let observer = CatchObserver { observer, handler: self.handler, serial: serial.clone() };
    let _ = first.set(self.source.actual_subscribe(observer));
    serial.into()
  }
}

pub struct CatchObserver<O, F> {
  observer: O,
  handler: F,
  serial: SerialDisposable,
}

impl<O, F, Item, Err, R> Observer<Item, Err> for CatchObserver<O, F>
where
  R: Observable<Item = Item>,
  F: FnOnce(Err) -> R,
  O: Observer<Item, R::Err> + 'static,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    let fallback = (self.handler)(err);
    self.serial.set(fallback.actual_subscribe(self.observer));
  }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
