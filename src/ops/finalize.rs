use crate::{
  disposable::{CompositeDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  rc::MutRc,
};

#[derive(Clone)]
pub struct FinalizeOp<S, F> {
  source: S,
  func: F,
}

impl<S, F> FinalizeOp<S, F> {
  #[inline]
  pub(crate) fn new(source: S, func: F) -> Self { Self { source, func } }
}

impl<S, F> Observable for FinalizeOp<S, F>
where
  S: Observable,
  F: FnOnce() + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let func = MutRc::own(Some(self.func));
    let upstream =
      self.source.actual_subscribe(FinalizerObserver { observer, func: func.clone() });
    let on_dispose = Subscription::from_fn(move || run_once(&func));
    CompositeDisposable::from_iter([upstream, on_dispose]).into()
  }
}

fn run_once<F: FnOnce()>(func: &MutRc<Option<F>>) {
  let func = func.take();
  if let Some(func) = func {
    func()
  }
}

pub struct FinalizerObserver<O, F> {
  observer: O,
  func: MutRc<Option<F>>,
}

impl<Item, Err, O, F> Observer<Item, Err> for FinalizerObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value); }

  fn error(self, err: Err) {
    self.observer.error(err);
    run_once(&self.func);
  }

  fn complete(self) {
    self.observer.complete();
    run_once(&self.func);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
