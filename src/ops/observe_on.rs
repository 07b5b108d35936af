use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

use crate::{
  disposable::{CompositeDisposable, Disposable, SerialDisposable, Subscription},
  notification::Notification,
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerExt,
};

/// Re-delivers every signal of the source from an action scheduled on
/// `scheduler`.
///
/// Signals are queued and drained in arrival order by a single scheduled
/// action at a time, so the source's order is kept whatever the scheduler.
#[derive(Clone)]
pub struct ObserveOnOp<S, Sch> {
  source: S,
  scheduler: Sch,
}

impl<S, Sch> ObserveOnOp<S, Sch> {
  pub(crate) fn new(source: S, scheduler: Sch) -> Self { Self { source, scheduler } }
}

impl<S, Sch> Observable for ObserveOnOp<S, Sch>
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
    let drain = SerialDisposable::new();
    let shared = Rc::new(ObserveOnShared {
      observer: RefCell::new(Some(observer)),
      queue: RefCell::new(VecDeque::new()),
      scheduled: Cell::new(false),
      drain: drain.clone(),
      scheduler: self.scheduler,
    });
    let upstream = self.source.actual_subscribe(ObserveOnObserver { shared });
    CompositeDisposable::from_iter([upstream, drain.into()]).into()
  }
}

struct ObserveOnShared<O, Item, Err, Sch> {
  observer: RefCell<Option<O>>,
  queue: RefCell<VecDeque<Notification<Item, Err>>>,
  scheduled: Cell<bool>,
  drain: SerialDisposable,
  scheduler: Sch,
}

impl<O, Item, Err, Sch> ObserveOnShared<O, Item, Err, Sch>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: 'static,
  Sch: SchedulerExt,
{
  fn push(self: &Rc<Self>, notification: Notification<Item, Err>) {
    self.queue.borrow_mut().push_back(notification);
    if self.scheduled.replace(true) || self.drain.is_disposed() {
      return;
    }
    let this = self.clone();
    let handle = self.scheduler.schedule(move || this.drain_queue());
    self.drain.set(handle);
  }

  fn drain_queue(&self) {
    loop {
      let next = self.queue.borrow_mut().pop_front();
      let Some(notification) = next else { break };
      let observer = self.observer.borrow_mut().take();
      let Some(mut observer) = observer else {
        self.queue.borrow_mut().clear();
        break;
      };
      match notification {
        Notification::Next(value) => {
          observer.next(value);
          *self.observer.borrow_mut() = Some(observer);
        }
        Notification::Error(err) => observer.error(err),
        Notification::Completed => observer.complete(),
      }
    }
    self.scheduled.set(false);
  }
}

struct ObserveOnObserver<O, Item, Err, Sch> {
  shared: Rc<ObserveOnShared<O, Item, Err, Sch>>,
}

impl<O, Item, Err, Sch> Observer<Item, Err> for ObserveOnObserver<O, Item, Err, Sch>
where
  O: Observer<Item, Err> + 'static,
  Item: 'static,
  Err: 'static,
  Sch: SchedulerExt,
{
  fn next(&mut self, value: Item) { self.shared.push(Notification::Next(value)) }

  fn error(self, err: Err) { self.shared.push(Notification::Error(err)) }

  fn complete(self) { self.shared.push(Notification::Completed) }

  fn is_closed(&self) -> bool {
    self.shared.drain.is_disposed()
      || self.shared.observer.borrow().as_ref().map_or(true, O::is_closed)
  }
}
