use std::{cell::RefCell, rc::Rc};

use super::Subject;
use crate::{
  disposable::{Disposable, Subscription},
  observable::Observable,
  observer::Observer,
};

struct AsyncState<Item> {
  last: Option<Item>,
  completed: bool,
}

/// A subject that only emits the last value it received, and only once it
/// completes. Late subscribers get that value and the completion replayed.
/// An error is forwarded without any value.
pub struct AsyncSubject<Item, Err> {
  subject: Subject<Item, Err>,
  state: Rc<RefCell<AsyncState<Item>>>,
}

impl<Item, Err> Clone for AsyncSubject<Item, Err> {
  fn clone(&self) -> Self { Self { subject: self.subject.clone(), state: self.state.clone() } }
}

impl<Item, Err> Default for AsyncSubject<Item, Err> {
  fn default() -> Self {
    let state = AsyncState { last: None, completed: false };
    Self { subject: Subject::default(), state: Rc::new(RefCell::new(state)) }
  }
}

impl<Item, Err> AsyncSubject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  pub fn has_observers(&self) -> bool { self.subject.has_observers() }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for AsyncSubject<Item, Err> {
  fn next(&mut self, value: Item) {
    if !self.subject.is_closed() {
      self.state.borrow_mut().last = Some(value);
    }
  }

  fn error(self, err: Err) {
    if self.subject.is_closed() {
      return;
    }
    self.state.borrow_mut().last = None;
    self.subject.error(err)
  }

  fn complete(mut self) {
    if self.subject.is_closed() {
      return;
    }
    let last = {
      let mut state = self.state.borrow_mut();
      state.completed = true;
      state.last.clone()
    };
    if let Some(value) = last {
      self.subject.next(value);
    }
    self.subject.complete()
  }

  fn is_closed(&self) -> bool { self.subject.is_closed() }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Observable for AsyncSubject<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    let replay = {
      let state = self.state.borrow();
      state.completed.then(|| state.last.clone())
    };
    match replay {
      Some(last) if !self.subject.is_disposed() => {
        if let Some(value) = last {
          observer.next(value);
        }
        observer.complete();
        Subscription::empty()
      }
      _ => self.subject.actual_subscribe(observer),
    }
  }
}

impl<Item, Err> Disposable for AsyncSubject<Item, Err> {
  fn dispose(&self) {
    self.state.borrow_mut().last = None;
    self.subject.dispose()
  }

  fn is_disposed(&self) -> bool { self.subject.is_disposed() }
}
