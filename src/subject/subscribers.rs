/// Subscribers container with ID-based management.
///
/// Entries keep insertion order. While an observer is being called it is
/// taken out of its slot, so the subject never holds a borrow of this
/// container across a callback; a slot removed in the meantime simply does
/// not take the observer back.
pub struct Subscribers<Ob> {
  entries: Vec<(usize, Option<Ob>)>,
  next_id: usize,
}

impl<Ob> Default for Subscribers<Ob> {
  fn default() -> Self { Self { entries: Vec::new(), next_id: 0 } }
}

impl<Ob> Subscribers<Ob> {
  /// Add an observer and return its unique ID.
  pub fn add(&mut self, observer: Ob) -> usize {
    let id = self.next_id;
    self.next_id += 1;
    self.entries.push((id, Some(observer)));
    id
  }

  /// Remove an observer by ID, handing it back if it was not in use.
  pub fn remove(&mut self, id: usize) -> Option<Ob> {
    let idx = self.entries.iter().position(|(i, _)| *i == id)?;
    self.entries.remove(idx).1
  }

  pub fn contains(&self, id: usize) -> bool { self.entries.iter().any(|(i, _)| *i == id) }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Snapshot of the registered IDs, in subscription order.
  pub fn ids(&self) -> Vec<usize> { self.entries.iter().map(|(id, _)| *id).collect() }

  /// Takes the observer out of its slot for the duration of a call.
  pub fn take(&mut self, id: usize) -> Option<Ob> {
    self.entries.iter_mut().find(|(i, _)| *i == id).and_then(|(_, slot)| slot.take())
  }

  /// Puts an observer back into its slot. If the slot was removed while the
  /// observer was out, the observer is returned so the caller can drop it.
  pub fn restore(&mut self, id: usize, observer: Ob) -> Option<Ob> {
    match self.entries.iter_mut().find(|(i, _)| *i == id) {
      Some((_, slot)) => {
        *slot = Some(observer);
        None
      }
      None => Some(observer),
    }
  }

  /// Removes every observer, in subscription order.
  pub fn drain(&mut self) -> Vec<Ob> {
    self.entries.drain(..).filter_map(|(_, observer)| observer).collect()
  }
}
