//! Shared mutable cells for single-threaded operator state.

use std::{
  cell::{Ref, RefCell, RefMut},
  rc::Rc,
};

pub trait RcDeref {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a>;
}

pub trait RcDerefMut {
  type Target<'a>
  where
    Self: 'a;
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a>;
}

/// A clonable handle to one `RefCell`. Every clone sees the same value.
///
/// Borrows are short lived: operators never hold one while calling into a
/// downstream observer, since that observer may re-enter the same cell.
#[derive(Default)]
pub struct MutRc<T>(Rc<RefCell<T>>);

impl<T> MutRc<T> {
  pub fn own(t: T) -> Self { Self(Rc::new(RefCell::new(t))) }

  #[inline]
  pub fn ptr_eq(&self, other: &Self) -> bool { Rc::ptr_eq(&self.0, &other.0) }
}

impl<T> MutRc<Option<T>> {
  /// Moves the value out, leaving `None` for every other handle.
  ///
  /// This is how a terminal signal claims the downstream observer: whoever
  /// takes it first delivers, later callers get `None`.
  #[inline]
  pub fn take(&self) -> Option<T> { self.0.borrow_mut().take() }

  #[inline]
  pub fn is_some(&self) -> bool { self.0.borrow().is_some() }
}

impl<T> RcDeref for MutRc<T> {
  type Target<'a>
    = Ref<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref<'a>(&'a self) -> Self::Target<'a> { self.0.borrow() }
}

impl<T> RcDerefMut for MutRc<T> {
  type Target<'a>
    = RefMut<'a, T>
  where
    Self: 'a;

  #[inline]
  #[allow(clippy::needless_lifetimes)]
  fn rc_deref_mut<'a>(&'a self) -> Self::Target<'a> { self.0.borrow_mut() }
}

impl<T> Clone for MutRc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[rxstream_macro::test]
  fn take_is_visible_through_every_clone() {
    let slot = MutRc::own(Some(7));
    let other = slot.clone();
    assert!(other.is_some());
    assert_eq!(slot.take(), Some(7));
    assert!(!other.is_some());
    assert_eq!(other.take(), None);
    assert!(slot.ptr_eq(&other));
  }

  #[rxstream_macro::test]
  fn borrows_end_with_the_guard() {
    let cell = MutRc::own(vec![1]);
    cell.rc_deref_mut().push(2);
    let len = cell.rc_deref().len();
    cell.rc_deref_mut().push(3);
    assert_eq!(len, 2);
    assert_eq!(*cell.rc_deref(), vec![1, 2, 3]);
  }
}
