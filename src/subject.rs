//! Subjects: values that are both an [`Observer`] and an [`Observable`].
//!
//! A [`Subject`] multicasts every signal it receives to the observers
//! currently subscribed to it. Once it has terminated, late subscribers get
//! the terminal signal replayed right away.
//!
//! # Re-entrancy
//!
//! A signal pushed into a subject from inside one of its own callbacks is
//! queued and delivered once the current broadcast finishes, so every
//! observer sees signals in the same order. Observers may subscribe or
//! unsubscribe from inside a callback: a new observer does not see the
//! in-flight value, and a removed one receives nothing further.
//!
//! ```rust
//! use std::{cell::RefCell, convert::Infallible, rc::Rc};
//!
//! use rxstream::prelude::*;
//!
//! let subject = Subject::<i32, Infallible>::new();
//! let results = Rc::new(RefCell::new(vec![]));
//! let c_results = results.clone();
//!
//! subject.clone().subscribe(move |v| c_results.borrow_mut().push(v));
//!
//! subject.clone().next(1);
//! subject.clone().next(2);
//! assert_eq!(*results.borrow(), vec![1, 2]);
//! ```

use std::{
  cell::RefCell,
  collections::VecDeque,
  rc::{Rc, Weak},
};

use tracing::warn;

use crate::{
  disposable::{Disposable, Subscription},
  notification::Notification,
  observable::Observable,
  observer::{BoxedObserver, Observer},
};

mod anonymous;
mod async_subject;
mod subscribers;

pub use anonymous::AnonymousSubject;
pub use async_subject::AsyncSubject;
pub use subscribers::Subscribers;

enum Terminal<Err> {
  Error(Err),
  Completed,
}

struct SubjectState<Item, Err> {
  subscribers: Subscribers<BoxedObserver<Item, Err>>,
  /// Set once a terminal signal was accepted, even if still queued.
  stopped: bool,
  /// Set once the terminal signal was delivered; replayed to late
  /// subscribers.
  terminal: Option<Terminal<Err>>,
  disposed: bool,
  emitting: bool,
  pending: VecDeque<Notification<Item, Err>>,
}

/// A hot observable that multicasts values to many observers.
///
/// Clones share the same observer list.
pub struct Subject<Item, Err>(Rc<RefCell<SubjectState<Item, Err>>>);

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Self(Rc::new(RefCell::new(SubjectState {
      subscribers: Subscribers::default(),
      stopped: false,
      terminal: None,
      disposed: false,
      emitting: false,
      pending: VecDeque::new(),
    })))
  }
}

struct EmitGuard<'a, Item, Err>(&'a RefCell<SubjectState<Item, Err>>);

impl<Item, Err> Drop for EmitGuard<'_, Item, Err> {
  fn drop(&mut self) { self.0.borrow_mut().emitting = false; }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// Whether any observer is currently subscribed.
  pub fn has_observers(&self) -> bool { !self.0.borrow().subscribers.is_empty() }

  pub fn observer_count(&self) -> usize { self.0.borrow().subscribers.len() }

  /// Whether an error or completion was received.
  pub fn is_stopped(&self) -> bool { self.0.borrow().stopped }

  fn unsubscribe_handle(&self, id: usize) -> Subscription
  where
    Item: 'static,
    Err: 'static,
  {
    let state: Weak<RefCell<SubjectState<Item, Err>>> = Rc::downgrade(&self.0);
    Subscription::from_fn(move || {
      if let Some(state) = state.upgrade() {
        let removed = state.borrow_mut().subscribers.remove(id);
        drop(removed);
      }
    })
  }
}

impl<Item: Clone, Err: Clone> Subject<Item, Err> {
  fn emit(&self, notification: Notification<Item, Err>) {
    {
      let mut state = self.0.borrow_mut();
      if state.disposed {
        warn!(kind = ?notification.kind(), "signal pushed into a disposed subject is ignored");
        return;
      }
      if state.stopped {
        return;
      }
      if !notification.has_value() {
        state.stopped = true;
      }
      if state.emitting {
        state.pending.push_back(notification);
        return;
      }
      state.emitting = true;
    }
    let _guard = EmitGuard(&self.0);

    let mut current = Some(notification);
    while let Some(notification) = current {
      self.deliver(notification);
      current = self.0.borrow_mut().pending.pop_front();
    }
  }

  fn deliver(&self, notification: Notification<Item, Err>) {
    match notification {
      Notification::Next(value) => {
        let ids = self.0.borrow().subscribers.ids();
        let last = ids.len().saturating_sub(1);
        let mut value = Some(value);
        for (idx, id) in ids.into_iter().enumerate() {
          let observer = self.0.borrow_mut().subscribers.take(id);
          let Some(mut observer) = observer else { continue };
          let v = if idx == last { value.take() } else { value.clone() };
          if let Some(v) = v {
            observer.next(v);
          }
          let orphan = self.0.borrow_mut().subscribers.restore(id, observer);
          drop(orphan);
        }
      }
      Notification::Error(err) => {
        let observers = {
          let mut state = self.0.borrow_mut();
          state.terminal = Some(Terminal::Error(err.clone()));
          state.subscribers.drain()
        };
        for observer in observers {
          observer.error(err.clone());
        }
      }
      Notification::Completed => {
        let observers = {
          let mut state = self.0.borrow_mut();
          state.terminal = Some(Terminal::Completed);
          state.subscribers.drain()
        };
        for observer in observers {
          observer.complete();
        }
      }
    }
  }
}

impl<Item, Err> Disposable for Subject<Item, Err> {
  /// Releases every observer without notifying it. Signals pushed afterwards
  /// are ignored.
  fn dispose(&self) {
    let observers = {
      let mut state = self.0.borrow_mut();
      state.disposed = true;
      state.pending.clear();
      state.subscribers.drain()
    };
    drop(observers);
  }

  fn is_disposed(&self) -> bool { self.0.borrow().disposed }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for Subject<Item, Err> {
  fn next(&mut self, value: Item) { self.emit(Notification::Next(value)) }

  fn error(self, err: Err) { self.emit(Notification::Error(err)) }

  fn complete(self) { self.emit(Notification::Completed) }

  fn is_closed(&self) -> bool {
    let state = self.0.borrow();
    state.stopped || state.disposed
  }
}

impl<Item: 'static, Err: Clone + 'static> Observable for Subject<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    let mut state = self.0.borrow_mut();
    if state.disposed {
      drop(state);
      warn!("subscribing to a disposed subject");
      return Subscription::empty();
    }
    let replay = match &state.terminal {
      Some(Terminal::Error(err)) => Some(Terminal::Error(err.clone())),
      Some(Terminal::Completed) => Some(Terminal::Completed),
      None => None,
    };
    let Some(replay) = replay else {
      let id = state.subscribers.add(Box::new(observer));
      drop(state);
      return self.unsubscribe_handle(id);
    };
    drop(state);
    match replay {
      Terminal::Error(err) => observer.error(err),
      Terminal::Completed => observer.complete(),
    }
    Subscription::empty()
  }
}
