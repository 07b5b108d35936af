use std::{
  cell::{Cell, RefCell},
  collections::VecDeque,
  rc::Rc,
};

use super::{Action, Duration, Scheduler};
use crate::disposable::{CompositeDisposable, Disposable, Subscription};

/// How a recursive action asks to be run again.
#[derive(Clone, Copy)]
pub(crate) enum When {
  Now,
  At,
  After,
}

type RecursiveAction<S> = Box<dyn FnMut(S, &mut dyn FnMut(S, Duration))>;

/// Shared state of one recursive scheduling chain.
///
/// Every reschedule goes through the scheduler, but a run that arrives while
/// this chain is already executing (a synchronous scheduler running the
/// reschedule inline) is only queued in `ready`. The outermost `run` drains
/// the queue in a loop, so the call stack stays flat.
pub(crate) struct Recursion<Sch, S> {
  scheduler: Sch,
  when: When,
  group: CompositeDisposable,
  ready: RefCell<VecDeque<S>>,
  draining: Cell<bool>,
  action: RefCell<RecursiveAction<S>>,
}

struct DrainGuard<'a>(&'a Cell<bool>);

impl Drop for DrainGuard<'_> {
  fn drop(&mut self) { self.0.set(false) }
}

impl<Sch: Scheduler + 'static, S: 'static> Recursion<Sch, S> {
  pub(crate) fn start(
    scheduler: Sch, when: When, state: S, time: Duration,
    action: impl FnMut(S, &mut dyn FnMut(S, Duration)) + 'static,
  ) -> Subscription {
    let this = Rc::new(Self {
      scheduler,
      when,
      group: CompositeDisposable::new(),
      ready: RefCell::new(VecDeque::new()),
      draining: Cell::new(false),
      action: RefCell::new(Box::new(action)),
    });
    this.reschedule(state, time);
    this.group.clone().into()
  }

  fn run(self: &Rc<Self>, state: S) {
    self.ready.borrow_mut().push_back(state);
    if self.draining.replace(true) {
      return;
    }
    let _guard = DrainGuard(&self.draining);

    loop {
      let Some(state) = self.ready.borrow_mut().pop_front() else { break };
      if self.group.is_disposed() {
        self.ready.borrow_mut().clear();
        break;
      }
      let mut again = |next: S, time: Duration| self.reschedule(next, time);
      let mut action = self.action.borrow_mut();
      (&mut **action)(state, &mut again);
    }
  }

  fn reschedule(self: &Rc<Self>, state: S, time: Duration) {
    if self.group.is_disposed() {
      return;
    }
    let slot: Rc<RefCell<Option<Subscription>>> = Rc::default();
    let fired = Rc::new(Cell::new(false));

    let this = self.clone();
    let c_slot = slot.clone();
    let c_fired = fired.clone();
    let task: Action = Box::new(move || {
      c_fired.set(true);
      let scheduled = c_slot.borrow_mut().take();
      if let Some(scheduled) = scheduled {
        this.group.remove(&scheduled);
      }
      this.run(state);
      Subscription::empty()
    });

    let scheduled = match self.when {
      When::Now => self.scheduler.schedule_now(task),
      When::At => self.scheduler.schedule_at(time, task),
      When::After => self.scheduler.schedule_after(time, task),
    };
    if !fired.get() {
      *slot.borrow_mut() = Some(scheduled.clone());
      self.group.add(scheduled);
    }
  }
}
