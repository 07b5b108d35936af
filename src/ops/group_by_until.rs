//! Grouping operators.
//!
//! `group_by_until` splits a source into one [`GroupedObservable`] per key.
//! A group lives until the observable returned by its duration selector
//! signals; the next value with the same key then opens a fresh group.

use std::{
  cell::{Cell, RefCell},
  collections::HashMap,
  hash::Hash,
  marker::PhantomData,
  rc::Rc,
};

use crate::{
  disposable::{
    CompositeDisposable, Disposable, RefCountDisposable, SingleAssignmentDisposable, Subscription,
  },
  observable::{never, Never, Observable},
  observer::Observer,
  rc::MutRc,
  subject::Subject,
};

/// A `group_by_until` whose groups never expire.
pub type GroupBy<S, K, KF> = GroupByUntilOp<
  S,
  KF,
  fn(<S as Observable>::Item) -> <S as Observable>::Item,
  fn(
    &GroupedObservable<K, <S as Observable>::Item, <S as Observable>::Err>,
  ) -> Never<(), <S as Observable>::Err>,
  fn(&K) -> K,
>;

pub(crate) fn identity<V>(value: V) -> V { value }

pub(crate) fn endless<K, V, Err>(_: &GroupedObservable<K, V, Err>) -> Never<(), Err> { never() }

pub(crate) fn clone_key<K: Clone>(key: &K) -> K { key.clone() }

#[derive(Clone)]
pub struct GroupByUntilOp<S, KF, EF, DF, NF> {
  source: S,
  key_selector: KF,
  element_selector: EF,
  duration_selector: DF,
  normalizer: NF,
}

impl<S, KF, EF, DF, NF> GroupByUntilOp<S, KF, EF, DF, NF> {
  pub(crate) fn new(
    source: S, key_selector: KF, element_selector: EF, duration_selector: DF, normalizer: NF,
  ) -> Self {
    Self { source, key_selector, element_selector, duration_selector, normalizer }
  }
}

impl<S, K, KF> GroupBy<S, K, KF>
where
  S: Observable,
  K: Clone,
{
  pub(crate) fn group_by(source: S, key_selector: KF) -> Self {
    Self::new(
      source,
      key_selector,
      identity::<S::Item> as fn(S::Item) -> S::Item,
      endless::<K, S::Item, S::Err> as fn(&GroupedObservable<K, S::Item, S::Err>) -> Never<(), S::Err>,
      clone_key::<K> as fn(&K) -> K,
    )
  }
}

impl<S, K, V, N, D, KF, EF, DF, NF> Observable for GroupByUntilOp<S, KF, EF, DF, NF>
where
  S: Observable,
  S::Err: Clone,
  K: Clone + 'static,
  V: Clone + 'static,
  N: Hash + Eq + 'static,
  D: Observable<Err = S::Err>,
  KF: FnMut(&S::Item) -> K + 'static,
  EF: FnMut(S::Item) -> V + 'static,
  DF: FnMut(&GroupedObservable<K, V, S::Err>) -> D + 'static,
  NF: FnMut(&K) -> N + 'static,
{
  type Item = GroupedObservable<K, V, S::Err>;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let group = CompositeDisposable::new();
    let ref_count = RefCountDisposable::new(group.clone());
    let shared = Rc::new(GroupShared {
      observer: MutRc::own(Some(observer)),
      groups: RefCell::new(HashMap::new()),
      group: group.clone(),
      ref_count: ref_count.clone(),
      next_id: Cell::new(0),
      _key: PhantomData,
    });

    let upstream = SingleAssignmentDisposable::new();
    group.add(upstream.clone());
    let observer = GroupByObserver {
      shared,
      key_selector: self.key_selector,
      element_selector: self.element_selector,
      duration_selector: self.duration_selector,
      normalizer: self.normalizer,
    };
    let _ = upstream.set(self.source.actual_subscribe(observer));
    ref_count.into()
  }
}

/// The values of one key, emitted by `group_by_until`.
///
/// Groups are hot: values that arrive before anyone subscribes are not
/// replayed. While a group has subscribers, the source stays subscribed even
/// if the downstream of `group_by_until` itself unsubscribed.
pub struct GroupedObservable<K, V, Err> {
  key: K,
  subject: Subject<V, Err>,
  ref_count: RefCountDisposable,
}

impl<K, V, Err> GroupedObservable<K, V, Err> {
  #[inline]
  pub fn key(&self) -> &K { &self.key }
}

impl<K: Clone, V, Err> Clone for GroupedObservable<K, V, Err> {
  fn clone(&self) -> Self {
    Self { key: self.key.clone(), subject: self.subject.clone(), ref_count: self.ref_count.clone() }
  }
}

impl<K, V, Err> Observable for GroupedObservable<K, V, Err>
where
  V: 'static,
  Err: Clone + 'static,
{
  type Item = V;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<V, Err> + 'static,
  {
    let leg = self.ref_count.get_disposable();
    let subscription = self.subject.actual_subscribe(observer);
    CompositeDisposable::from_iter([subscription, leg]).into()
  }
}

// ==================== Shared State ====================

struct GroupShared<O, K, N, V, Err> {
  observer: MutRc<Option<O>>,
  groups: RefCell<HashMap<N, (usize, Subject<V, Err>)>>,
  group: CompositeDisposable,
  ref_count: RefCountDisposable,
  next_id: Cell<usize>,
  _key: PhantomData<K>,
}

impl<O, K, N, V, Err> GroupShared<O, K, N, V, Err>
where
  O: Observer<GroupedObservable<K, V, Err>, Err>,
  V: Clone,
  Err: Clone,
{
  fn take_groups(&self) -> Vec<Subject<V, Err>> {
    self.groups.borrow_mut().drain().map(|(_, (_, subject))| subject).collect()
  }

  fn error(&self, err: Err) {
    let observer = self.observer.take();
    for subject in self.take_groups() {
      subject.error(err.clone());
    }
    self.group.dispose();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(&self) {
    let observer = self.observer.take();
    for subject in self.take_groups() {
      subject.complete();
    }
    self.group.dispose();
    if let Some(observer) = observer {
      observer.complete();
    }
  }

  /// Evicts the group `id` if it is still open.
  fn close(&self, id: usize) {
    self.groups.borrow_mut().retain(|_, (group_id, _)| *group_id != id);
  }
}

struct GroupByObserver<O, K, N, V, Err, KF, EF, DF, NF> {
  shared: Rc<GroupShared<O, K, N, V, Err>>,
  key_selector: KF,
  element_selector: EF,
  duration_selector: DF,
  normalizer: NF,
}

impl<O, Item, K, N, V, Err, D, KF, EF, DF, NF> Observer<Item, Err>
  for GroupByObserver<O, K, N, V, Err, KF, EF, DF, NF>
where
  O: Observer<GroupedObservable<K, V, Err>, Err> + 'static,
  K: Clone + 'static,
  V: Clone + 'static,
  Err: Clone + 'static,
  N: Hash + Eq + 'static,
  D: Observable<Err = Err>,
  KF: FnMut(&Item) -> K,
  EF: FnMut(Item) -> V,
  DF: FnMut(&GroupedObservable<K, V, Err>) -> D,
  NF: FnMut(&K) -> N,
{
  fn next(&mut self, value: Item) {
    let key = (self.key_selector)(&value);
    let normalized = (self.normalizer)(&key);
    let element = (self.element_selector)(value);

    let existing = self.shared.groups.borrow().get(&normalized).map(|(_, s)| s.clone());
    let mut subject = match existing {
      Some(subject) => subject,
      None => self.open_group(key, normalized),
    };
    subject.next(element);
  }

  fn error(self, err: Err) { self.shared.error(err) }

  fn complete(self) { self.shared.complete() }

  fn is_closed(&self) -> bool { self.shared.ref_count.is_disposed() }
}

impl<O, K, N, V, Err, KF, EF, DF, NF> GroupByObserver<O, K, N, V, Err, KF, EF, DF, NF>
where
  O: Observer<GroupedObservable<K, V, Err>, Err> + 'static,
  K: Clone + 'static,
  V: Clone + 'static,
  Err: Clone + 'static,
  N: Hash + Eq + 'static,
{
  fn open_group<D>(&mut self, key: K, normalized: N) -> Subject<V, Err>
  where
    D: Observable<Err = Err>,
    DF: FnMut(&GroupedObservable<K, V, Err>) -> D,
  {
    let id = self.shared.next_id.get();
    self.shared.next_id.set(id + 1);
    let subject = Subject::new();
    self.shared.groups.borrow_mut().insert(normalized, (id, subject.clone()));

    let grouped =
      GroupedObservable { key, subject: subject.clone(), ref_count: self.shared.ref_count.clone() };
    let duration = (self.duration_selector)(&grouped);
    self.shared.observer.clone().next(grouped);

    let slot = SingleAssignmentDisposable::new();
    let handle: Subscription = slot.clone().into();
    self.shared.group.add(handle.clone());
    let closer =
      DurationObserver { shared: self.shared.clone(), id, subject: subject.clone(), handle };
    let _ = slot.set(duration.actual_subscribe(closer));
    subject
  }
}

/// Closes one group on the first signal of its duration observable.
struct DurationObserver<O, K, N, V, Err> {
  shared: Rc<GroupShared<O, K, N, V, Err>>,
  id: usize,
  subject: Subject<V, Err>,
  handle: Subscription,
}

impl<O, K, N, V, Err> DurationObserver<O, K, N, V, Err>
where
  O: Observer<GroupedObservable<K, V, Err>, Err>,
  V: Clone,
  Err: Clone,
{
  fn expire(&self) {
    if self.subject.is_stopped() {
      return;
    }
    self.shared.close(self.id);
    self.shared.group.remove(&self.handle);
    self.subject.clone().complete();
  }
}

impl<O, Item, K, N, V, Err> Observer<Item, Err> for DurationObserver<O, K, N, V, Err>
where
  O: Observer<GroupedObservable<K, V, Err>, Err>,
  V: Clone,
  Err: Clone,
{
  fn next(&mut self, _: Item) { self.expire() }

  fn error(self, err: Err) { self.shared.error(err) }

  fn complete(self) { self.expire() }

  fn is_closed(&self) -> bool { self.subject.is_stopped() }
}
