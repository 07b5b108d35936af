use std::{
  any::Any,
  panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
  rc::Rc,
};

use tracing::{debug, error};

use super::{Action, Duration, Scheduler};
use crate::disposable::Subscription;

/// A scheduler that offers panics escaping its actions to a handler.
///
/// The handler receives the panic payload and returns whether it handled
/// it. A handled panic is swallowed and the scheduler carries on with its
/// remaining work. An unhandled one keeps unwinding into the host.
pub struct CatchScheduler<S, H> {
  inner: S,
  handler: Rc<H>,
}

impl<S: Clone, H> Clone for CatchScheduler<S, H> {
  fn clone(&self) -> Self { Self { inner: self.inner.clone(), handler: self.handler.clone() } }
}

impl<S, H> CatchScheduler<S, H>
where
  S: Scheduler,
  H: Fn(&(dyn Any + Send)) -> bool + 'static,
{
  pub fn new(inner: S, handler: H) -> Self { Self { inner, handler: Rc::new(handler) } }

  fn wrap(&self, action: Action) -> Action {
    let handler = self.handler.clone();
    Box::new(move || match catch_unwind(AssertUnwindSafe(action)) {
      Ok(subscription) => subscription,
      Err(payload) => {
        if handler(&*payload) {
          debug!(panic = panic_message(&*payload), "scheduled action panicked, handler recovered");
          Subscription::empty()
        } else {
          error!(panic = panic_message(&*payload), "unhandled panic in scheduled action");
          resume_unwind(payload)
        }
      }
    })
  }
}

/// Best effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
  if let Some(msg) = payload.downcast_ref::<&'static str>() {
    msg
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg.as_str()
  } else {
    "<non string panic payload>"
  }
}

impl<S, H> Scheduler for CatchScheduler<S, H>
where
  S: Scheduler,
  H: Fn(&(dyn Any + Send)) -> bool + 'static,
{
  #[inline]
  fn now(&self) -> Duration { self.inner.now() }

  fn schedule_now(&self, action: Action) -> Subscription { self.inner.schedule_now(self.wrap(action)) }

  fn schedule_at(&self, due: Duration, action: Action) -> Subscription {
    self.inner.schedule_at(due, self.wrap(action))
  }

  fn schedule_after(&self, delay: Duration, action: Action) -> Subscription {
    self.inner.schedule_after(delay, self.wrap(action))
  }
}
