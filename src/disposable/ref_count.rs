use std::{
  cell::{Cell, RefCell},
  rc::Rc,
};

use super::{Disposable, Subscription};

/// Keeps an underlying disposable alive while dependent legs are
/// outstanding.
///
/// The underlying disposable is released once the wrapper itself has been
/// disposed and every leg handed out by [`get_disposable`] has been disposed
/// as well, whichever happens last.
///
/// [`get_disposable`]: RefCountDisposable::get_disposable
#[derive(Clone)]
pub struct RefCountDisposable(Rc<RefCell<Inner>>);

struct Inner {
  underlying: Option<Subscription>,
  primary_disposed: bool,
  legs: usize,
}

impl RefCountDisposable {
  pub fn new(underlying: impl Into<Subscription>) -> Self {
    Self(Rc::new(RefCell::new(Inner {
      underlying: Some(underlying.into()),
      primary_disposed: false,
      legs: 0,
    })))
  }

  /// Hands out a new leg. Once the resource is gone, legs are inert.
  pub fn get_disposable(&self) -> Subscription {
    let mut inner = self.0.borrow_mut();
    if inner.underlying.is_none() {
      return Subscription::empty();
    }
    inner.legs += 1;
    Subscription::new(Leg { parent: self.clone(), done: Cell::new(false) })
  }

  fn release(&self) {
    let underlying = {
      let mut inner = self.0.borrow_mut();
      inner.legs -= 1;
      if inner.primary_disposed && inner.legs == 0 { inner.underlying.take() } else { None }
    };
    if let Some(underlying) = underlying {
      underlying.dispose();
    }
  }
}

impl Disposable for RefCountDisposable {
  fn dispose(&self) {
    let underlying = {
      let mut inner = self.0.borrow_mut();
      if inner.primary_disposed || inner.underlying.is_none() {
        return;
      }
      inner.primary_disposed = true;
      if inner.legs == 0 { inner.underlying.take() } else { None }
    };
    if let Some(underlying) = underlying {
      underlying.dispose();
    }
  }

  fn is_disposed(&self) -> bool { self.0.borrow().underlying.is_none() }
}

impl From<RefCountDisposable> for Subscription {
  fn from(d: RefCountDisposable) -> Self { Subscription::new(d) }
}

struct Leg {
  parent: RefCountDisposable,
  done: Cell<bool>,
}

impl Disposable for Leg {
  fn dispose(&self) {
    if !self.done.replace(true) {
      self.parent.release();
    }
  }

  fn is_disposed(&self) -> bool { self.done.get() }
}
