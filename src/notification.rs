use crate::{
  observable::{create, Observable},
  observer::{Emitter, Observer},
  scheduler::SchedulerExt,
};

/// A signal of an observable, reified as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Completed,
}

/// Which signal a [`Notification`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
  Next,
  Error,
  Completed,
}

impl<Item, Err> Notification<Item, Err> {
  pub fn kind(&self) -> NotificationKind {
    match self {
      Notification::Next(_) => NotificationKind::Next,
      Notification::Error(_) => NotificationKind::Error,
      Notification::Completed => NotificationKind::Completed,
    }
  }

  /// Only `Next` carries a value.
  pub fn has_value(&self) -> bool { matches!(self, Notification::Next(_)) }

  /// Delivers this notification to `observer`. A terminal notification
  /// consumes the observer, leaving `None` behind.
  pub fn accept<O>(self, observer: &mut Option<O>)
  where
    O: Observer<Item, Err>,
  {
    match self {
      Notification::Next(value) => {
        if let Some(observer) = observer.as_mut() {
          observer.next(value);
        }
      }
      Notification::Error(err) => {
        if let Some(observer) = observer.take() {
          observer.error(err);
        }
      }
      Notification::Completed => {
        if let Some(observer) = observer.take() {
          observer.complete();
        }
      }
    }
  }

  /// Folds the notification with one callback per signal.
  pub fn accept_with<R>(
    self, on_next: impl FnOnce(Item) -> R, on_error: impl FnOnce(Err) -> R,
    on_completed: impl FnOnce() -> R,
  ) -> R {
    match self {
      Notification::Next(value) => on_next(value),
      Notification::Error(err) => on_error(err),
      Notification::Completed => on_completed(),
    }
  }
}

impl<Item: Clone + 'static, Err: Clone + 'static> Notification<Item, Err> {
  /// An observable that replays this notification on `scheduler`. A `Next`
  /// is followed by completion.
  pub fn to_observable<S>(self, scheduler: S) -> impl Observable<Item = Item, Err = Err> + Clone
  where
    S: SchedulerExt,
  {
    create(move |mut subscriber| {
      scheduler.schedule(move || match self {
        Notification::Next(value) => {
          subscriber.next(value);
          subscriber.complete();
        }
        Notification::Error(err) => subscriber.error(err),
        Notification::Completed => subscriber.complete(),
      })
    })
  }
}

impl<Item, Err> From<Result<Item, Err>> for Notification<Item, Err> {
  fn from(value: Result<Item, Err>) -> Self {
    match value {
      Ok(v) => Notification::Next(v),
      Err(e) => Notification::Error(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, rc::Rc};

  use super::*;
  use crate::{observable::ObservableExt, scheduler::VirtualTimeScheduler};

  #[rxstream_macro::test]
  fn kind_and_value() {
    let n: Notification<i32, ()> = Notification::Next(1);
    assert!(n.has_value());
    assert_eq!(n.kind(), NotificationKind::Next);
    assert_eq!(Notification::<i32, ()>::Completed.kind(), NotificationKind::Completed);
    assert!(!Notification::<i32, ()>::Error(()).has_value());
  }

  #[rxstream_macro::test]
  fn accept_with_folds() {
    let n: Notification<i32, &str> = Notification::Error("bad");
    let text = n.accept_with(|v| v.to_string(), |e| e.to_string(), || "done".to_string());
    assert_eq!(text, "bad");
  }

  #[rxstream_macro::test]
  fn to_observable_replays_on_scheduler() {
    let scheduler = VirtualTimeScheduler::new();
    let log = Rc::new(RefCell::new(vec![]));
    let c_log = log.clone();
    let c_log2 = log.clone();
    Notification::<i32, ()>::Next(42).to_observable(scheduler.clone()).subscribe_all(
      move |v| c_log.borrow_mut().push(v),
      |_| {},
      move || c_log2.borrow_mut().push(-1),
    );
    assert!(log.borrow().is_empty());
    scheduler.start();
    assert_eq!(*log.borrow(), vec![42, -1]);
  }
}
