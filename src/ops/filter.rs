use crate::{disposable::Subscription, observable::Observable, observer::Observer};

/// Emit only those items from an Observable that pass a predicate test
///
/// # Example
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxstream::prelude::*;
///
/// let coll = Rc::new(RefCell::new(vec![]));
/// let coll_clone = coll.clone();
///
/// observable::from_iter(0..10)
///   .filter(|v| *v % 2 == 0)
///   .subscribe(move |v| {
///      coll_clone.borrow_mut().push(v);
///   });
///
/// // only even numbers received.
/// assert_eq!(coll.borrow().clone(), vec![0, 2, 4, 6, 8]);
/// ```
#[derive(Clone)]
pub struct FilterOp<S, F> {
  source: S,
  filter: F,
}

impl<S, F> FilterOp<S, F> {
  pub(crate) fn new(source: S, filter: F) -> Self { Self { source, filter } }
}

impl<S, F> Observable for FilterOp<S, F>
where
  S: Observable,
  F: FnMut(&S::Item) -> bool + 'static,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    self.source.actual_subscribe(FilterObserver { observer, filter: self.filter })
  }
}

pub struct FilterObserver<O, F> {
  observer: O,
  filter: F,
}

impl<Item, Err, O, F> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.filter)(&value) {
      self.observer.next(value)
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use crate::observable::{from_iter, ObservableExt};

  #[rxstream_macro::test]
  fn passes_errors_through() {
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (log.clone(), log.clone());
    from_iter::<_, &str>(0..5)
      .filter(|v| v % 2 == 1)
      .concat(crate::observable::throw_err("stop"))
      .subscribe_all(
        move |v| c1.borrow_mut().push(v.to_string()),
        move |e| c2.borrow_mut().push(e.to_string()),
        || {},
      );
    assert_eq!(*log.borrow(), vec!["1", "3", "stop"]);
  }
}
