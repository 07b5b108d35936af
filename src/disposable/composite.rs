use std::{cell::RefCell, mem, rc::Rc};

use smallvec::SmallVec;

use super::{Disposable, Subscription};

/// An ordered group of disposables released together.
///
/// Disposing the group disposes every member in membership order. Adding to
/// a disposed group disposes the added item right away instead of storing it.
#[derive(Clone, Default)]
pub struct CompositeDisposable(Rc<RefCell<Inner>>);

#[derive(Default)]
struct Inner {
  disposed: bool,
  items: SmallVec<[Subscription; 2]>,
}

impl CompositeDisposable {
  pub fn new() -> Self { Self::default() }

  /// Adds `item` to the group, or disposes it if the group is already
  /// disposed.
  pub fn add(&self, item: impl Into<Subscription>) {
    let item = item.into();
    let rejected = {
      let mut inner = self.0.borrow_mut();
      if inner.disposed {
        Some(item)
      } else {
        inner.items.push(item);
        None
      }
    };
    if let Some(item) = rejected {
      item.dispose();
    }
  }

  /// Removes `item` and disposes it. Returns whether it was a member.
  pub fn remove(&self, item: &Subscription) -> bool {
    let removed = {
      let mut inner = self.0.borrow_mut();
      let idx = inner.items.iter().position(|v| v.ptr_eq(item));
      idx.map(|idx| inner.items.remove(idx))
    };
    match removed {
      Some(item) => {
        item.dispose();
        true
      }
      None => false,
    }
  }

  /// Disposes all members without disposing the group itself.
  pub fn clear(&self) {
    let items = mem::take(&mut self.0.borrow_mut().items);
    for item in items {
      item.dispose();
    }
  }

  pub fn contains(&self, item: &Subscription) -> bool {
    self.0.borrow().items.iter().any(|v| v.ptr_eq(item))
  }

  pub fn len(&self) -> usize { self.0.borrow().items.len() }

  pub fn is_empty(&self) -> bool { self.0.borrow().items.is_empty() }

  pub fn to_vec(&self) -> Vec<Subscription> { self.0.borrow().items.to_vec() }
}

impl<I: Into<Subscription>> FromIterator<I> for CompositeDisposable {
  fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
    let items = iter.into_iter().map(Into::into).collect();
    Self(Rc::new(RefCell::new(Inner { disposed: false, items })))
  }
}

impl Disposable for CompositeDisposable {
  fn dispose(&self) {
    let items = {
      let mut inner = self.0.borrow_mut();
      if inner.disposed {
        return;
      }
      inner.disposed = true;
      mem::take(&mut inner.items)
    };
    for item in items {
      item.dispose();
    }
  }

  #[inline]
  fn is_disposed(&self) -> bool { self.0.borrow().disposed }
}

impl From<CompositeDisposable> for Subscription {
  fn from(d: CompositeDisposable) -> Self { Subscription::new(d) }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;

  fn recording(log: &Rc<RefCell<Vec<usize>>>, id: usize) -> Subscription {
    let log = log.clone();
    Subscription::from_fn(move || log.borrow_mut().push(id))
  }

  #[rxstream_macro::test]
  fn dispose_in_membership_order_once() {
    let log = Rc::new(RefCell::new(vec![]));
    let group: CompositeDisposable = (0..3).map(|i| recording(&log, i)).collect();
    assert_eq!(group.len(), 3);

    group.dispose();
    group.dispose();
    assert_eq!(*log.borrow(), vec![0, 1, 2]);
    assert!(group.is_disposed());
    assert!(group.is_empty());
  }

  #[rxstream_macro::test]
  fn add_after_dispose_disposes_immediately() {
    let log = Rc::new(RefCell::new(vec![]));
    let group = CompositeDisposable::new();
    group.dispose();

    let late = recording(&log, 7);
    group.add(late.clone());
    assert_eq!(*log.borrow(), vec![7]);
    assert!(!group.contains(&late));
    assert_eq!(group.len(), 0);
  }

  #[rxstream_macro::test]
  fn remove_disposes_member() {
    let log = Rc::new(RefCell::new(vec![]));
    let group = CompositeDisposable::new();
    let a = recording(&log, 1);
    let b = recording(&log, 2);
    group.add(a.clone());
    group.add(b.clone());

    assert!(group.remove(&a));
    assert!(!group.remove(&a));
    assert_eq!(*log.borrow(), vec![1]);
    assert!(group.contains(&b));
    assert_eq!(group.to_vec().len(), 1);
  }

  #[rxstream_macro::test]
  fn clear_keeps_group_usable() {
    let log = Rc::new(RefCell::new(vec![]));
    let group = CompositeDisposable::new();
    group.add(recording(&log, 1));
    group.clear();
    assert_eq!(*log.borrow(), vec![1]);
    assert!(!group.is_disposed());

    group.add(recording(&log, 2));
    assert_eq!(group.len(), 1);
    assert_eq!(*log.borrow(), vec![1]);
  }

  #[rxstream_macro::test]
  fn member_may_remove_itself_while_group_disposes() {
    let group = CompositeDisposable::new();
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::default();
    let c_group = group.clone();
    let c_slot = slot.clone();
    let member = Subscription::from_fn(move || {
      if let Some(me) = c_slot.borrow_mut().take() {
        c_group.remove(&me);
      }
    });
    *slot.borrow_mut() = Some(member.clone());
    group.add(member.clone());

    group.dispose();
    assert!(member.is_disposed());
  }
}
