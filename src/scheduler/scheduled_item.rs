use std::{cell::RefCell, cmp::Ordering};

use tracing::warn;

use super::Action;
use crate::disposable::{Disposable, SingleAssignmentDisposable, Subscription};

/// A unit of work waiting in a [`PriorityQueue`](super::PriorityQueue).
///
/// The action runs at most once. Disposing the item before it runs cancels
/// it; disposing it afterwards releases whatever the action returned.
pub struct ScheduledItem<T> {
  due_time: T,
  action: RefCell<Option<Action>>,
  disposable: SingleAssignmentDisposable,
}

impl<T: Ord + Copy> ScheduledItem<T> {
  pub fn new(due_time: T, action: Action) -> Self {
    Self {
      due_time,
      action: RefCell::new(Some(action)),
      disposable: SingleAssignmentDisposable::new(),
    }
  }

  #[inline]
  pub fn due_time(&self) -> T { self.due_time }

  /// Runs the action unless the item was cancelled or already ran.
  pub fn invoke(&self) {
    let action = self.action.borrow_mut().take();
    let Some(action) = action else { return };
    if self.disposable.is_disposed() {
      return;
    }
    let returned = action();
    if let Err(err) = self.disposable.set(returned) {
      warn!(%err, "scheduled item produced a second disposable");
    }
  }

  #[inline]
  pub fn is_cancelled(&self) -> bool { self.disposable.is_disposed() }

  #[inline]
  pub fn compare_to(&self, other: &Self) -> Ordering { self.due_time.cmp(&other.due_time) }

  /// Handle that cancels the item, or releases its result once it ran.
  pub fn handle(&self) -> Subscription { self.disposable.clone().into() }
}
