use crate::{disposable::Subscription, observable::Observable, observer::Observer};

/// Creates an observable that will on subscription defer to another observable
/// that is supplied by a supplier-function which will be run once at each
/// subscription
///
/// ```rust
/// # use std::convert::Infallible;
/// # use rxstream::prelude::*;
///
/// observable::defer(|| {
///   println!("Hi!");
///   observable::of::<_, Infallible>("Hello!")
/// })
///   .subscribe(move |v| {
///     println!("{}", v);
///   });
/// // Prints: Hi!\nHello!\n
/// ```
pub fn defer<F, S>(observable_supplier: F) -> Defer<F>
where
  F: FnOnce() -> S,
  S: Observable,
{
  Defer(observable_supplier)
}

#[derive(Clone)]
pub struct Defer<F>(F);

impl<F, S> Observable for Defer<F>
where
  F: FnOnce() -> S,
  S: Observable,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    (self.0)().actual_subscribe(observer)
  }
}
