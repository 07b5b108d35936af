use std::{cell::RefCell, rc::Rc};

use super::{Disposable, Subscription};

/// Holds one replaceable disposable; assigning a new one disposes the old.
#[derive(Clone, Default)]
pub struct SerialDisposable(Rc<RefCell<Inner>>);

#[derive(Default)]
struct Inner {
  disposed: bool,
  current: Option<Subscription>,
}

impl SerialDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn get(&self) -> Option<Subscription> { self.0.borrow().current.clone() }

  pub fn set(&self, value: impl Into<Subscription>) {
    let value = value.into();
    let to_dispose = {
      let mut inner = self.0.borrow_mut();
      if inner.disposed { Some(value) } else { inner.current.replace(value) }
    };
    if let Some(old) = to_dispose {
      old.dispose();
    }
  }
}

impl Disposable for SerialDisposable {
  fn dispose(&self) {
    let old = {
      let mut inner = self.0.borrow_mut();
      if inner.disposed {
        return;
      }
      inner.disposed = true;
      inner.current.take()
    };
    if let Some(old) = old {
      old.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.borrow().disposed }
}

impl From<SerialDisposable> for Subscription {
  fn from(d: SerialDisposable) -> Self { Subscription::new(d) }
}
