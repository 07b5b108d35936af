use std::{cell::RefCell, rc::Rc};

use super::{Disposable, Subscription};
use crate::error::DisposableError;

/// Holds at most one disposable, assigned once.
///
/// Assigning after disposal disposes the assigned value right away.
/// Assigning while a value is already held is a usage error.
#[derive(Clone, Default)]
pub struct SingleAssignmentDisposable(Rc<RefCell<Inner>>);

#[derive(Default)]
struct Inner {
  disposed: bool,
  current: Option<Subscription>,
}

impl SingleAssignmentDisposable {
  pub fn new() -> Self { Self::default() }

  pub fn get(&self) -> Option<Subscription> { self.0.borrow().current.clone() }

  /// Assigns the inner disposable.
  ///
  /// # Errors
  ///
  /// Returns [`DisposableError::AlreadyAssigned`] if a disposable is already
  /// held; `value` is left untouched in that case.
  pub fn set(&self, value: impl Into<Subscription>) -> Result<(), DisposableError> {
    let value = value.into();
    let rejected = {
      let mut inner = self.0.borrow_mut();
      if inner.current.is_some() {
        return Err(DisposableError::AlreadyAssigned);
      }
      if inner.disposed {
        Some(value)
      } else {
        inner.current = Some(value);
        None
      }
    };
    if let Some(value) = rejected {
      value.dispose();
    }
    Ok(())
  }
}

impl Disposable for SingleAssignmentDisposable {
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

impl From<SingleAssignmentDisposable> for Subscription {
  fn from(d: SingleAssignmentDisposable) -> Self { Subscription::new(d) }
}
