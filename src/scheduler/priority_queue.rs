use std::{
  cmp::Ordering,
  rc::Rc,
  sync::atomic::{AtomicU64, Ordering as AtomicOrdering},
};

use super::ScheduledItem;

/// Sequence numbers shared by every queue, so the enqueue order of any two
/// items is always comparable.
static COUNT: AtomicU64 = AtomicU64::new(0);

struct IndexedItem<T> {
  id: u64,
  value: Rc<ScheduledItem<T>>,
}

/// Binary min-heap of scheduled items keyed by `(due_time, enqueue order)`.
///
/// Items due at the same time come out in the order they went in.
pub struct PriorityQueue<T> {
  items: Vec<IndexedItem<T>>,
}

impl<T: Ord + Copy> Default for PriorityQueue<T> {
  fn default() -> Self { Self::new() }
}

impl<T: Ord + Copy> PriorityQueue<T> {
  pub fn new() -> Self { Self { items: Vec::new() } }

  pub fn with_capacity(capacity: usize) -> Self { Self { items: Vec::with_capacity(capacity) } }

  #[inline]
  pub fn len(&self) -> usize { self.items.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  fn is_higher_priority(&self, left: usize, right: usize) -> bool {
    let (left, right) = (&self.items[left], &self.items[right]);
    match left.value.compare_to(&right.value) {
      Ordering::Less => true,
      Ordering::Greater => false,
      Ordering::Equal => left.id < right.id,
    }
  }

  fn percolate(&mut self, mut index: usize) {
    while index > 0 {
      let parent = (index - 1) / 2;
      if !self.is_higher_priority(index, parent) {
        break;
      }
      self.items.swap(index, parent);
      index = parent;
    }
  }

  fn heapify(&mut self, mut index: usize) {
    let len = self.items.len();
    loop {
      let left = 2 * index + 1;
      let right = left + 1;
      let mut first = index;
      if left < len && self.is_higher_priority(left, first) {
        first = left;
      }
      if right < len && self.is_higher_priority(right, first) {
        first = right;
      }
      if first == index {
        break;
      }
      self.items.swap(index, first);
      index = first;
    }
  }

  /// The item that would be dequeued next.
  pub fn peek(&self) -> Option<&Rc<ScheduledItem<T>>> { self.items.first().map(|i| &i.value) }

  fn remove_at(&mut self, index: usize) -> Option<Rc<ScheduledItem<T>>> {
    let last = self.items.len().checked_sub(1)?;
    self.items.swap(index, last);
    let removed = self.items.pop().map(|i| i.value);
    if index < self.items.len() {
      if index > 0 && self.is_higher_priority(index, (index - 1) / 2) {
        self.percolate(index);
      } else {
        self.heapify(index);
      }
    }
    removed
  }

  pub fn dequeue(&mut self) -> Option<Rc<ScheduledItem<T>>> { self.remove_at(0) }

  pub fn enqueue(&mut self, item: Rc<ScheduledItem<T>>) {
    let id = COUNT.fetch_add(1, AtomicOrdering::Relaxed);
    self.items.push(IndexedItem { id, value: item });
    self.percolate(self.items.len() - 1);
  }

  /// Removes `item` (by identity) from anywhere in the queue.
  pub fn remove(&mut self, item: &Rc<ScheduledItem<T>>) -> Option<Rc<ScheduledItem<T>>> {
    let index = self.items.iter().position(|i| Rc::ptr_eq(&i.value, item))?;
    self.remove_at(index)
  }
}
