//! Cross-module behaviour: queues, disposal, combinators and scheduling
//! working together through the public prelude.

use std::{
  cell::{Cell, RefCell},
  panic::{catch_unwind, AssertUnwindSafe},
  rc::Rc,
};

use rxstream::{prelude::*, scheduler::PriorityQueue, scheduler::ScheduledItem};

type Log<T> = Rc<RefCell<Vec<T>>>;

fn log<T>() -> Log<T> { Rc::new(RefCell::new(vec![])) }

fn recording(log: &Log<usize>, id: usize) -> Subscription {
  let log = log.clone();
  Subscription::from_fn(move || log.borrow_mut().push(id))
}

#[rxstream_macro::test]
fn priority_queue_is_fifo_among_equal_due_times() {
  let mut queue = PriorityQueue::new();
  let due = Duration::from_millis(5);
  let items: Vec<_> = (0..3)
    .map(|_| Rc::new(ScheduledItem::new(due, Box::new(Subscription::empty))))
    .collect();
  let early = Rc::new(ScheduledItem::new(Duration::ZERO, Box::new(Subscription::empty)));
  for item in &items {
    queue.enqueue(item.clone());
  }
  queue.enqueue(early.clone());

  let first = queue.dequeue().expect("queue holds four items");
  assert!(Rc::ptr_eq(&first, &early));
  for expected in &items {
    let item = queue.dequeue().expect("equal due items remain");
    assert!(Rc::ptr_eq(&item, expected));
  }
  assert!(queue.dequeue().is_none());
}

#[rxstream_macro::test]
fn priority_queue_remove_keeps_order() {
  let mut queue = PriorityQueue::new();
  let items: Vec<_> = [7u64, 3, 9, 1, 5]
    .into_iter()
    .map(|ms| Rc::new(ScheduledItem::new(Duration::from_millis(ms), Box::new(Subscription::empty))))
    .collect();
  for item in &items {
    queue.enqueue(item.clone());
  }
  assert!(queue.remove(&items[1]).is_some());
  let order: Vec<_> = std::iter::from_fn(|| queue.dequeue())
    .map(|i| i.due_time().as_millis())
    .collect();
  assert_eq!(order, vec![1, 5, 7, 9]);
}

#[rxstream_macro::test]
fn composite_disposes_members_once_in_order() {
  let disposed = log();
  let group = CompositeDisposable::new();
  for id in 0..3 {
    group.add(recording(&disposed, id));
  }
  group.dispose();
  group.dispose();
  assert_eq!(*disposed.borrow(), vec![0, 1, 2]);

  group.add(recording(&disposed, 3));
  assert_eq!(*disposed.borrow(), vec![0, 1, 2, 3]);
  assert!(group.is_empty());
}

#[rxstream_macro::test]
fn single_assignment_rejects_second_value() {
  let slot = SingleAssignmentDisposable::new();
  assert!(slot.set(Subscription::empty()).is_ok());
  assert_eq!(slot.set(Subscription::empty()), Err(DisposableError::AlreadyAssigned));

  let disposed = log();
  let late = SingleAssignmentDisposable::new();
  late.dispose();
  assert!(late.set(recording(&disposed, 0)).is_ok());
  assert_eq!(*disposed.borrow(), vec![0]);
}

#[rxstream_macro::test]
fn ref_count_waits_for_every_leg() {
  let disposed = log();
  let ref_count = RefCountDisposable::new(recording(&disposed, 0));
  let a = ref_count.get_disposable();
  let b = ref_count.get_disposable();

  a.dispose();
  ref_count.dispose();
  assert!(disposed.borrow().is_empty());
  b.dispose();
  assert_eq!(*disposed.borrow(), vec![0]);
}

#[rxstream_macro::test]
fn combine_latest_waits_for_every_source() {
  let seen = log();
  let c_seen = seen.clone();
  observable::from_iter::<_, ()>([1, 2])
    .combine_latest(observable::from_iter([10]), |a, b| a + b)
    .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, || {});
  assert_eq!(*seen.borrow(), vec![12]);
}

#[rxstream_macro::test]
fn zip_stops_at_the_shorter_source() {
  let seen = log();
  let done = Rc::new(Cell::new(false));
  let (c_seen, c_done) = (seen.clone(), done.clone());
  observable::from_iter::<_, ()>([1, 2, 3])
    .zip(observable::from_iter([10, 20]), |a, b| a + b)
    .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, move || c_done.set(true));
  assert_eq!(*seen.borrow(), vec![11, 22]);
  assert!(done.get());
}

#[rxstream_macro::test]
fn merge_error_disposes_sibling_first() {
  let x = Subject::<i32, &'static str>::new();
  let y = Subject::<i32, &'static str>::new();
  let events = log();
  let (c_next, c_err) = (events.clone(), events.clone());
  let c_y = y.clone();
  x.clone().merge(y.clone()).subscribe_all(
    move |v: i32| c_next.borrow_mut().push(v.to_string()),
    move |e| c_err.borrow_mut().push(format!("{e}, sibling alive: {}", c_y.has_observers())),
    || {},
  );

  x.clone().next(1);
  x.clone().error("boom");
  assert_eq!(*events.borrow(), vec!["1".to_string(), "boom, sibling alive: false".to_string()]);
}

#[rxstream_macro::test]
fn retry_makes_initial_plus_count_attempts() {
  let attempts = Rc::new(Cell::new(0));
  let error = Rc::new(RefCell::new(None));
  let (c_attempts, c_error) = (attempts.clone(), error.clone());
  observable::defer(move || {
    let attempts = c_attempts.clone();
    observable::create(move |mut subscriber: observable::Subscriber<i32, String>| {
      attempts.set(attempts.get() + 1);
      subscriber.error(format!("attempt {}", attempts.get()));
      Subscription::empty()
    })
  })
  .retry(2)
  .subscribe_all(|_| {}, move |e| *c_error.borrow_mut() = Some(e), || {});

  assert_eq!(attempts.get(), 3);
  assert_eq!(error.borrow().as_deref(), Some("attempt 3"));
}

#[rxstream_macro::test]
fn current_thread_recursion_does_not_grow_the_stack() {
  const TIMES: usize = 10_000;
  let order = log();
  let c_order = order.clone();
  CURRENT_THREAD.schedule_recursive_with_state(0, move |n, again| {
    c_order.borrow_mut().push(n);
    if n + 1 < TIMES {
      again(n + 1);
    }
  });
  assert_eq!(order.borrow().len(), TIMES);
  assert!(order.borrow().iter().copied().eq(0..TIMES));
}

#[rxstream_macro::test]
fn virtual_time_orders_work_and_skips_cancelled_items() {
  let scheduler = VirtualTimeScheduler::new();
  let ran = log();
  for (id, ms) in [(0, 20), (1, 10), (2, 20), (3, 5)] {
    let ran = ran.clone();
    scheduler.schedule_with_relative(Duration::from_millis(ms), move || ran.borrow_mut().push(id));
  }
  let c_ran = ran.clone();
  let cancelled =
    scheduler.schedule_with_relative(Duration::from_millis(15), move || c_ran.borrow_mut().push(9));
  cancelled.dispose();

  scheduler.start();
  assert_eq!(*ran.borrow(), vec![3, 1, 0, 2]);
  assert_eq!(scheduler.clock(), Duration::from_millis(20));
}

#[rxstream_macro::test]
fn periodic_work_stops_when_disposed() {
  let scheduler = VirtualTimeScheduler::new();
  let ticks = Rc::new(Cell::new(0));
  let c_ticks = ticks.clone();
  let periodic =
    scheduler.schedule_periodic(Duration::from_secs(1), move || c_ticks.set(c_ticks.get() + 1));
  scheduler.advance_by(Duration::from_millis(3500));
  assert_eq!(ticks.get(), 3);
  periodic.dispose();
  scheduler.advance_by(Duration::from_secs(5));
  assert_eq!(ticks.get(), 3);
  assert!(scheduler.is_empty());
}

#[rxstream_macro::test]
fn catch_scheduler_recovers_handled_panics() {
  let scheduler = VirtualTimeScheduler::new();
  let guarded = scheduler.catch(|payload| payload.downcast_ref::<&str>() == Some(&"recoverable"));
  let ran = Rc::new(Cell::new(false));
  let c_ran = ran.clone();
  guarded.schedule(|| panic!("recoverable"));
  guarded.schedule(move || c_ran.set(true));
  scheduler.start();
  assert!(ran.get());

  guarded.schedule(|| panic!("fatal"));
  let outcome = catch_unwind(AssertUnwindSafe(|| scheduler.start()));
  assert!(outcome.is_err());
}

#[rxstream_macro::test]
fn switch_latest_follows_newest_inner() {
  let outer = Subject::<Subject<i32, ()>, ()>::new();
  let first = Subject::<i32, ()>::new();
  let second = Subject::<i32, ()>::new();
  let seen = log();
  let done = Rc::new(Cell::new(false));
  let (c_seen, c_done) = (seen.clone(), done.clone());
  outer
    .clone()
    .switch_latest()
    .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, move || c_done.set(true));

  outer.clone().next(first.clone());
  first.clone().next(1);
  outer.clone().next(second.clone());
  first.clone().next(2);
  second.clone().next(3);
  outer.clone().complete();
  assert!(!done.get());
  second.clone().complete();

  assert_eq!(*seen.borrow(), vec![1, 3]);
  assert!(done.get());
  assert!(!first.has_observers());
}

#[rxstream_macro::test]
fn group_by_until_reopens_expired_groups() {
  let scheduler = VirtualTimeScheduler::new();
  let source = Subject::<(char, i32), ()>::new();
  let opened = log();
  let c_opened = opened.clone();
  let c_scheduler = scheduler.clone();
  source
    .clone()
    .group_by_until(
      |&(key, _)| key,
      |(_, value)| value,
      move |_| observable::timer(Duration::from_secs(1), c_scheduler.clone()),
    )
    .subscribe_all(move |group| c_opened.borrow_mut().push(*group.key()), |_| {}, || {});

  source.clone().next(('a', 1));
  source.clone().next(('a', 2));
  scheduler.advance_by(Duration::from_secs(2));
  source.clone().next(('a', 3));
  assert_eq!(*opened.borrow(), vec!['a', 'a']);
}

#[rxstream_macro::test]
fn finalize_runs_once_for_every_ending() {
  let runs = Rc::new(Cell::new(0));
  let counter = |runs: &Rc<Cell<i32>>| {
    let runs = runs.clone();
    move || runs.set(runs.get() + 1)
  };

  observable::from_iter::<_, ()>(0..2).finalize(counter(&runs)).subscribe_all(|_| {}, |_| {}, || {});
  assert_eq!(runs.get(), 1);

  observable::throw_err::<i32, _>(()).finalize(counter(&runs)).subscribe_all(|_| {}, |_| {}, || {});
  assert_eq!(runs.get(), 2);

  let sub = observable::never::<i32, ()>()
    .finalize(counter(&runs))
    .subscribe_all(|_| {}, |_| {}, || {});
  sub.dispose();
  sub.dispose();
  assert_eq!(runs.get(), 3);
}

#[rxstream_macro::test]
fn take_last_on_delivers_through_scheduler() {
  let scheduler = VirtualTimeScheduler::new();
  let seen = log();
  let c_seen = seen.clone();
  observable::from_iter::<_, ()>(0..5)
    .take_last_on(2, scheduler.clone())
    .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, || {});
  assert!(seen.borrow().is_empty());
  scheduler.start();
  assert_eq!(*seen.borrow(), vec![3, 4]);
}

#[rxstream_macro::test]
fn observe_on_keeps_pipeline_order() {
  let scheduler = VirtualTimeScheduler::new();
  let seen = log();
  let c_seen = seen.clone();
  observable::from_iter::<_, ()>(1..=6)
    .filter(|v| v % 2 == 0)
    .observe_on(scheduler.clone())
    .map(|v| v * 10)
    .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, || {});
  scheduler.start();
  assert_eq!(*seen.borrow(), vec![20, 40, 60]);
}

#[rxstream_macro::test]
fn amb_picks_the_earlier_timer() {
  let scheduler = VirtualTimeScheduler::new();
  let seen = log();
  let c_seen = seen.clone();
  let slow = observable::timer::<_, ()>(Duration::from_millis(50), scheduler.clone());
  let fast = observable::timer(Duration::from_millis(10), scheduler.clone());
  let (slow, fast) = (slow.map(|_| "slow"), fast.map(|_| "fast"));
  slow.amb(fast).subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, || {});
  scheduler.start();
  assert_eq!(*seen.borrow(), vec!["fast"]);
}

#[rxstream_macro::test]
fn skip_until_gates_an_interval() {
  let scheduler = VirtualTimeScheduler::new();
  let seen = log();
  let c_seen = seen.clone();
  observable::interval::<_, ()>(Duration::from_millis(10), scheduler.clone())
    .skip_until(observable::timer(Duration::from_millis(25), scheduler.clone()))
    .take(2)
    .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, || {});
  scheduler.start();
  assert_eq!(*seen.borrow(), vec![2, 3]);
}

#[rxstream_macro::test]
fn interval_on_current_thread_ends_with_take() {
  let seen = log();
  let c_seen = seen.clone();
  observable::interval::<_, ()>(Duration::from_millis(1), CURRENT_THREAD)
    .take(2)
    .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, || {});
  assert_eq!(*seen.borrow(), vec![0, 1]);
}
