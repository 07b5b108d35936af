//! Boxed Observable types and traits for type erasure
//!
//! This module provides type-erased observable types for use in contexts
//! where heterogeneous observables need to be stored or passed around, such
//! as the sources of a `merge` or the inner sequences of `switch_latest`.

use crate::{
  disposable::Subscription,
  observable::Observable,
  observer::{BoxedObserver, Observer},
};

// ============================================================================
// DynObservable Trait
// ============================================================================

/// Object-safe observable trait for type erasure.
pub trait DynObservable<Item, Err> {
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> Subscription;
}

/// Object-safe clone support for type-erased observables.
///
/// This enables `Clone` for boxed observables when (and only when) the
/// underlying observable pipeline is `Clone`.
pub trait DynObservableClone<Item, Err>: DynObservable<Item, Err> {
  fn clone_box(&self) -> Box<dyn DynObservableClone<Item, Err>>;
}

impl<T> DynObservable<T::Item, T::Err> for T
where
  T: Observable,
{
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<T::Item, T::Err>) -> Subscription {
    (*self).actual_subscribe(observer)
  }
}

impl<T> DynObservableClone<T::Item, T::Err> for T
where
  T: Observable + Clone + 'static,
{
  fn clone_box(&self) -> Box<dyn DynObservableClone<T::Item, T::Err>> { Box::new(self.clone()) }
}

// ============================================================================
// Boxed observable types
// ============================================================================

/// An observable with its concrete type erased.
pub struct BoxedObservable<Item, Err>(Box<dyn DynObservable<Item, Err>>);

impl<Item, Err> BoxedObservable<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err> + 'static,
  {
    Self(Box::new(source))
  }
}

impl<Item: 'static, Err: 'static> Observable for BoxedObservable<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    self.0.box_subscribe(Box::new(observer))
  }
}

/// A clonable [`BoxedObservable`], for pipelines that resubscribe.
pub struct BoxedObservableClone<Item, Err>(Box<dyn DynObservableClone<Item, Err>>);

impl<Item, Err> BoxedObservableClone<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err> + Clone + 'static,
  {
    Self(Box::new(source))
  }
}

impl<Item, Err> Clone for BoxedObservableClone<Item, Err> {
  fn clone(&self) -> Self { Self(self.0.clone_box()) }
}

impl<Item: 'static, Err: 'static> Observable for BoxedObservableClone<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Item, Err> + 'static,
  {
    self.0.box_subscribe(Box::new(observer))
  }
}
