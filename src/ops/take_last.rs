use std::collections::VecDeque;

use crate::{
  disposable::{CompositeDisposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerExt,
};

/// Emits only the last `count` values emitted by the source Observable,
/// once it completes.
///
/// Without a scheduler the buffered values are emitted synchronously from
/// the source's completion. With one, each value and the final completion
/// are delivered by their own scheduled action.
#[derive(Clone)]
pub struct TakeLastOp<S, Sch> {
  source: S,
  count: usize,
  scheduler: Option<Sch>,
}

impl<S, Sch> TakeLastOp<S, Sch> {
  pub(crate) fn new(source: S, count: usize, scheduler: Option<Sch>) -> Self {
    Self { source, count, scheduler }
  }
}

impl<S, Sch> Observable for TakeLastOp<S, Sch>
where
  S: Observable,
  Sch: SchedulerExt,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let drain = SingleAssignmentDisposable::new();
    let observer = TakeLastObserver {
      observer,
      count: self.count,
      queue: VecDeque::new(),
      scheduler: self.scheduler,
      drain: drain.clone(),
    };
    let upstream = self.source.actual_subscribe(observer);
    CompositeDisposable::from_iter([upstream, drain.into()]).into()
  }
}

pub struct TakeLastObserver<O, Item, Sch> {
  observer: O,
  count: usize,
  queue: VecDeque<Item>,
  scheduler: Option<Sch>,
  drain: SingleAssignmentDisposable,
}

impl<Item, Err, O, Sch> Observer<Item, Err> for TakeLastObserver<O, Item, Sch>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Sch: SchedulerExt,
{
  fn next(&mut self, value: Item) {
    if self.count == 0 {
      return;
    }
    if self.queue.len() == self.count {
      self.queue.pop_front();
    }
    self.queue.push_back(value);
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) {
    let Self { mut observer, mut queue, scheduler, drain, .. } = self;
    match scheduler {
      None => {
        for value in queue {
          if observer.is_closed() {
            return;
          }
          observer.next(value);
        }
        observer.complete();
      }
      Some(scheduler) => {
        let mut observer = Some(observer);
        let sub = scheduler.schedule_recursive(move |again| match queue.pop_front() {
          Some(value) => {
            if let Some(observer) = observer.as_mut() {
              observer.next(value);
            }
            again();
          }
          None => {
            if let Some(observer) = observer.take() {
              observer.complete();
            }
          }
        });
        let _ = drain.set(sub);
      }
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::{
    disposable::Disposable,
    observable::{from_iter, ObservableExt},
    scheduler::{Duration, VirtualTimeScheduler},
  };

  #[rxstream_macro::test]
  fn emits_last_values_on_completion() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    from_iter::<_, Infallible>(0..10).take_last(3).subscribe(move |v| c_seen.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec![7, 8, 9]);
  }

  #[rxstream_macro::test]
  fn zero_count_only_completes() {
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (log.clone(), log.clone());
    from_iter::<_, ()>(0..10).take_last(0).subscribe_all(
      move |v| c1.borrow_mut().push(v),
      |_| {},
      move || c2.borrow_mut().push(-1),
    );
    assert_eq!(*log.borrow(), vec![-1]);
  }

  #[rxstream_macro::test]
  fn delivers_through_scheduler() {
    let scheduler = VirtualTimeScheduler::new();
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (log.clone(), log.clone());
    from_iter::<_, ()>(0..5).take_last_on(2, scheduler.clone()).subscribe_all(
      move |v| c1.borrow_mut().push(v),
      |_| {},
      move || c2.borrow_mut().push(-1),
    );
    assert!(log.borrow().is_empty());
    assert_eq!(scheduler.pending_count(), 1);

    scheduler.advance_by(Duration::ZERO);
    assert_eq!(*log.borrow(), vec![3, 4, -1]);
  }

  #[rxstream_macro::test]
  fn scheduled_drain_stops_on_dispose() {
    let scheduler = VirtualTimeScheduler::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let sub = from_iter::<_, Infallible>(0..5)
      .take_last_on(3, scheduler.clone())
      .subscribe(move |v| c_seen.borrow_mut().push(v));
    sub.dispose();
    scheduler.start();
    assert!(seen.borrow().is_empty());
    assert!(scheduler.is_empty());
  }
}
