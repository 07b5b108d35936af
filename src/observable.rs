//! Observable trait, operator methods and factories.
//!
//! An [`Observable`] is a description of a sequence: subscribing runs it, and
//! every subscription is an independent execution. Operators are methods of
//! [`ObservableExt`], implemented for every observable; each returns a new
//! observable wrapping its source.
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxstream::prelude::*;
//!
//! let out = Rc::new(RefCell::new(vec![]));
//! let c_out = out.clone();
//! observable::from_iter(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .subscribe(move |v| c_out.borrow_mut().push(v));
//! assert_eq!(*out.borrow(), vec![0, 4, 8, 12, 16]);
//! ```

use std::{convert::Infallible, hash::Hash};

use crate::{
  disposable::{BooleanDisposable, CompositeDisposable, SingleAssignmentDisposable, Subscription},
  notification::Notification,
  observer::{AutoDetachObserver, FnMutObserver, Observer, ObserverAll},
  ops::{
    amb::AmbOp,
    catch_error::CatchErrorOp,
    combine_latest::CombineLatestOp,
    filter::FilterOp,
    finalize::FinalizeOp,
    group_by_until::{self, GroupByUntilOp, GroupedObservable},
    map::MapOp,
    materialize::{DematerializeOp, MaterializeOp},
    merge::{ConcatOp, MergeOp},
    merge_all::MergeAllOp,
    observe_on::ObserveOnOp,
    on_error_resume_next::OnErrorResumeNextOp,
    retry::{RepeatOp, RetryOp},
    skip_until::SkipUntilOp,
    subscribe_on::SubscribeOnOp,
    switch_latest::SwitchLatestOp,
    take::TakeOp,
    take_last::TakeLastOp,
    take_until::TakeUntilOp,
    tap::{self, TapOp},
    zip::ZipOp,
  },
  scheduler::{ImmediateScheduler, SchedulerExt},
};

mod boxed;
mod create;
mod defer;
mod from_iter;
mod interval;
mod trivial;
mod using;

pub use boxed::{BoxedObservable, BoxedObservableClone, DynObservable, DynObservableClone};
pub use create::{create, Create, Subscriber};
pub use defer::{defer, Defer};
pub use from_iter::{from_iter, from_iter_on, of, FromIter, FromIterOn, Of};
pub use interval::{interval, timer, Interval, Timer};
pub use trivial::{empty, empty_on, never, throw_err, Empty, EmptyOn, Never, ThrowErr};
pub use using::{using, Using};

pub use crate::ops::{
  amb::amb,
  combine_latest::{combine_latest_all, CombineLatestAll},
  merge::{merge, Merge},
  on_error_resume_next::on_error_resume_next,
  zip::{zip_all, ZipAll},
};

/// A representation of any set of values over any amount of time.
///
/// Implementors only provide [`actual_subscribe`](Observable::actual_subscribe),
/// which starts one execution pushing into `observer` and returns the handle
/// that tears it down. Users subscribe through [`ObservableExt`].
pub trait Observable: Sized {
  type Item: 'static;
  type Err: 'static;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static;
}

/// Subscription entry points and operators, available on every
/// [`Observable`].
pub trait ObservableExt: Observable {
  // ==========================================================================
  // Subscribing
  // ==========================================================================

  /// Subscribes with a `next` callback. Only available for streams that
  /// cannot fail.
  fn subscribe<F>(self, next: F) -> Subscription
  where
    Self: Observable<Err = Infallible>,
    F: FnMut(Self::Item) + 'static,
  {
    self.subscribe_with(FnMutObserver(next))
  }

  /// Subscribes with one callback per signal.
  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Subscription
  where
    N: FnMut(Self::Item) + 'static,
    E: FnOnce(Self::Err) + 'static,
    C: FnOnce() + 'static,
  {
    self.subscribe_with(ObserverAll::new(next, error, complete))
  }

  /// Subscribes a full observer.
  ///
  /// Disposing the returned subscription stops any further delivery to
  /// `observer` right away, even if the producer keeps emitting, and then
  /// releases the upstream resources.
  fn subscribe_with<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let closed = BooleanDisposable::new();
    let upstream = SingleAssignmentDisposable::new();
    let source = self.actual_subscribe(AutoDetachObserver::new(
      observer,
      closed.clone(),
      upstream.clone(),
    ));
    // Fresh slot, it cannot already hold a value.
    let _ = upstream.set(source);
    CompositeDisposable::from_iter([Subscription::from(closed), upstream.into()]).into()
  }

  // ==========================================================================
  // Transformation & filtering
  // ==========================================================================

  /// Creates a new stream which calls a closure on each element and uses
  /// its return as the value.
  fn map<B, F>(self, f: F) -> MapOp<Self, F>
  where
    F: FnMut(Self::Item) -> B,
  {
    MapOp::new(self, f)
  }

  /// Emit only those items from an Observable that pass a predicate test.
  fn filter<F>(self, predicate: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Self::Item) -> bool,
  {
    FilterOp::new(self, predicate)
  }

  /// Emits the first `count` values, then completes.
  fn take(self, count: usize) -> TakeOp<Self, ImmediateScheduler> { TakeOp::new(self, count, None) }

  /// Like [`take`](ObservableExt::take), but a `take(0)` completes through
  /// `scheduler` instead of synchronously.
  fn take_on<S: SchedulerExt>(self, count: usize, scheduler: S) -> TakeOp<Self, S> {
    TakeOp::new(self, count, Some(scheduler))
  }

  /// Emits the last `count` values once the source completes.
  fn take_last(self, count: usize) -> TakeLastOp<Self, ImmediateScheduler> {
    TakeLastOp::new(self, count, None)
  }

  /// Like [`take_last`](ObservableExt::take_last), draining the buffered
  /// values through `scheduler` one at a time.
  fn take_last_on<S: SchedulerExt>(self, count: usize, scheduler: S) -> TakeLastOp<Self, S> {
    TakeLastOp::new(self, count, Some(scheduler))
  }

  /// Mirrors the source until `notifier` emits a value, then completes.
  fn take_until<N>(self, notifier: N) -> TakeUntilOp<Self, N>
  where
    N: Observable<Err = Self::Err>,
  {
    TakeUntilOp::new(self, notifier)
  }

  /// Drops values until `notifier` emits a value, then mirrors the source.
  fn skip_until<N>(self, notifier: N) -> SkipUntilOp<Self, N>
  where
    N: Observable<Err = Self::Err>,
  {
    SkipUntilOp::new(self, notifier)
  }

  // ==========================================================================
  // Combination
  // ==========================================================================

  /// Interleaves the values of `self` and `other`.
  fn merge<S>(self, other: S) -> MergeOp<Self, S>
  where
    S: Observable<Item = Self::Item, Err = Self::Err>,
  {
    MergeOp::new(self, other)
  }

  /// Flattens an observable of observables, subscribing to at most
  /// `max_concurrent` inner observables at a time. Pass `usize::MAX` for no
  /// limit.
  fn merge_all(self, max_concurrent: usize) -> MergeAllOp<Self>
  where
    Self::Item: Observable<Err = Self::Err>,
  {
    MergeAllOp::new(self, max_concurrent)
  }

  /// Emits all values of `self`, then all values of `other`.
  fn concat<S>(self, other: S) -> ConcatOp<Self, S>
  where
    S: Observable<Item = Self::Item, Err = Self::Err>,
  {
    ConcatOp::new(self, other)
  }

  /// Maps every value to an observable and merges their values.
  ///
  /// Shorthand for `map(f).merge_all(usize::MAX)`. To pair inner values with
  /// the outer one, or to map every value to the same observable, do it in
  /// `f`.
  fn flat_map<Inner, F>(self, f: F) -> MergeAllOp<MapOp<Self, F>>
  where
    F: FnMut(Self::Item) -> Inner + 'static,
    Inner: Observable<Err = Self::Err> + 'static,
  {
    MergeAllOp::new(MapOp::new(self, f), usize::MAX)
  }

  /// Flattens an observable of observables one inner observable at a time.
  fn concat_all(self) -> MergeAllOp<Self>
  where
    Self::Item: Observable<Err = Self::Err>,
  {
    MergeAllOp::new(self, 1)
  }

  /// Combines the latest value of `self` and `other` whenever either emits,
  /// once both have emitted.
  fn combine_latest<S, F, R>(self, other: S, selector: F) -> CombineLatestOp<Self, S, F>
  where
    S: Observable<Err = Self::Err>,
    Self::Item: Clone,
    S::Item: Clone,
    F: FnMut(Self::Item, S::Item) -> R + 'static,
    R: 'static,
  {
    CombineLatestOp::new(self, other, selector)
  }

  /// Pairs the n-th value of `self` with the n-th value of `other`.
  fn zip<S, F, R>(self, other: S, selector: F) -> ZipOp<Self, S, F>
  where
    S: Observable<Err = Self::Err>,
    F: FnMut(Self::Item, S::Item) -> R + 'static,
    R: 'static,
  {
    ZipOp::new(self, other, selector)
  }

  /// Mirrors whichever of `self` and `other` signals first and drops the
  /// other.
  fn amb<S>(self, other: S) -> AmbOp<BoxedObservable<Self::Item, Self::Err>>
  where
    Self: 'static,
    S: Observable<Item = Self::Item, Err = Self::Err> + 'static,
  {
    AmbOp::new(vec![self.box_it(), other.box_it()])
  }

  /// Mirrors the most recent inner observable of an observable of
  /// observables.
  fn switch_latest(self) -> SwitchLatestOp<Self>
  where
    Self::Item: Observable<Err = Self::Err>,
  {
    SwitchLatestOp::new(self)
  }

  // ==========================================================================
  // Grouping
  // ==========================================================================

  /// Groups values by key. Groups stay open until the source terminates.
  fn group_by<K, KF>(self, key_selector: KF) -> group_by_until::GroupBy<Self, K, KF>
  where
    K: Hash + Eq + Clone + 'static,
    KF: FnMut(&Self::Item) -> K,
    Self::Item: Clone,
    Self::Err: Clone,
  {
    GroupByUntilOp::group_by(self, key_selector)
  }

  /// Groups values by key; each group completes when the observable
  /// returned by `duration_selector` for it emits or completes.
  fn group_by_until<K, V, KF, EF, D, DF>(
    self, key_selector: KF, element_selector: EF, duration_selector: DF,
  ) -> GroupByUntilOp<Self, KF, EF, DF, fn(&K) -> K>
  where
    K: Hash + Eq + Clone + 'static,
    V: Clone + 'static,
    KF: FnMut(&Self::Item) -> K,
    EF: FnMut(Self::Item) -> V,
    D: Observable<Err = Self::Err>,
    DF: FnMut(&GroupedObservable<K, V, Self::Err>) -> D,
    Self::Err: Clone,
  {
    GroupByUntilOp::new(
      self,
      key_selector,
      element_selector,
      duration_selector,
      group_by_until::clone_key::<K> as fn(&K) -> K,
    )
  }

  /// Like [`group_by_until`](ObservableExt::group_by_until) for keys that
  /// are not hashable themselves: `normalizer` maps a key to the hashable
  /// surrogate used to look up its group.
  fn group_by_until_with<K, N, V, KF, EF, D, DF, NF>(
    self, key_selector: KF, element_selector: EF, duration_selector: DF, normalizer: NF,
  ) -> GroupByUntilOp<Self, KF, EF, DF, NF>
  where
    K: Clone + 'static,
    N: Hash + Eq + 'static,
    V: Clone + 'static,
    KF: FnMut(&Self::Item) -> K,
    EF: FnMut(Self::Item) -> V,
    D: Observable<Err = Self::Err>,
    DF: FnMut(&GroupedObservable<K, V, Self::Err>) -> D,
    NF: FnMut(&K) -> N,
    Self::Err: Clone,
  {
    GroupByUntilOp::new(self, key_selector, element_selector, duration_selector, normalizer)
  }

  // ==========================================================================
  // Side effects & lifecycle
  // ==========================================================================

  /// Runs `f` on every value without altering the stream.
  fn tap<F>(self, f: F) -> TapOp<Self, F, tap::NoopError<Self::Err>, tap::NoopComplete>
  where
    F: FnMut(&Self::Item),
  {
    TapOp::new(
      self,
      f,
      tap::noop_error::<Self::Err> as tap::NoopError<Self::Err>,
      tap::noop_complete as tap::NoopComplete,
    )
  }

  /// Runs one side effect per signal without altering the stream.
  fn tap_all<N, E, C>(self, next: N, error: E, complete: C) -> TapOp<Self, N, E, C>
  where
    N: FnMut(&Self::Item),
    E: FnOnce(&Self::Err),
    C: FnOnce(),
  {
    TapOp::new(self, next, error, complete)
  }

  /// Runs `f` exactly once, when the stream completes, errors or is
  /// unsubscribed, whichever happens first.
  fn finalize<F>(self, f: F) -> FinalizeOp<Self, F>
  where
    F: FnOnce() + 'static,
  {
    FinalizeOp::new(self, f)
  }

  /// Reifies every signal as a [`Notification`] value. The resulting stream
  /// never errors.
  fn materialize(self) -> MaterializeOp<Self> { MaterializeOp::new(self) }

  /// Turns a stream of [`Notification`]s back into signals.
  fn dematerialize<Item>(self) -> DematerializeOp<Self>
  where
    Self: Observable<Item = Notification<Item, <Self as Observable>::Err>>,
    Item: 'static,
  {
    DematerializeOp::new(self)
  }

  // ==========================================================================
  // Error handling & resubscription
  // ==========================================================================

  /// On error, resubscribes up to `count` more times before giving up with
  /// the last error.
  fn retry(self, count: usize) -> RetryOp<Self>
  where
    Self: Clone + 'static,
  {
    RetryOp::new(self, Some(count))
  }

  /// On error, resubscribes forever.
  fn retry_forever(self) -> RetryOp<Self>
  where
    Self: Clone + 'static,
  {
    RetryOp::new(self, None)
  }

  /// On completion, resubscribes up to `count` more times.
  fn repeat(self, count: usize) -> RepeatOp<Self>
  where
    Self: Clone + 'static,
  {
    RepeatOp::new(self, Some(count))
  }

  /// On completion, resubscribes forever.
  fn repeat_forever(self) -> RepeatOp<Self>
  where
    Self: Clone + 'static,
  {
    RepeatOp::new(self, None)
  }

  /// On error, continues with the observable returned by `handler`.
  fn catch_error<S, F>(self, handler: F) -> CatchErrorOp<Self, F>
  where
    S: Observable<Item = Self::Item>,
    F: FnOnce(Self::Err) -> S + 'static,
  {
    CatchErrorOp::new(self, handler)
  }

  /// Continues with `other` once `self` terminates, whether it completed
  /// or failed. The error is dropped.
  fn on_error_resume_next<S>(
    self, other: S,
  ) -> OnErrorResumeNextOp<BoxedObservable<Self::Item, Self::Err>>
  where
    Self: 'static,
    S: Observable<Item = Self::Item, Err = Self::Err> + 'static,
  {
    OnErrorResumeNextOp::new(vec![self.box_it(), other.box_it()])
  }

  // ==========================================================================
  // Scheduling
  // ==========================================================================

  /// Delivers every signal through `scheduler`, preserving order.
  fn observe_on<S>(self, scheduler: S) -> ObserveOnOp<Self, S>
  where
    S: SchedulerExt,
  {
    ObserveOnOp::new(self, scheduler)
  }

  /// Subscribes to (and unsubscribes from) the source on `scheduler`.
  fn subscribe_on<S>(self, scheduler: S) -> SubscribeOnOp<Self, S>
  where
    S: SchedulerExt,
  {
    SubscribeOnOp::new(self, scheduler)
  }

  // ==========================================================================
  // Type erasure
  // ==========================================================================

  fn box_it(self) -> BoxedObservable<Self::Item, Self::Err>
  where
    Self: 'static,
  {
    BoxedObservable::new(self)
  }

  fn box_clone(self) -> BoxedObservableClone<Self::Item, Self::Err>
  where
    Self: Clone + 'static,
  {
    BoxedObservableClone::new(self)
  }
}

impl<T: Observable> ObservableExt for T {}
