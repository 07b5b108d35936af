use thiserror::Error;

/// Misuse of a disposable container.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DisposableError {
  /// A `SingleAssignmentDisposable` already holds a disposable.
  #[error("single assignment disposable already holds a disposable")]
  AlreadyAssigned,
}

/// A signal a checked observer refused to deliver.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ObserverError {
  /// The observer already received `error` or `complete`.
  #[error("observer already terminated")]
  Terminated,
  /// A signal arrived while the observer was still handling another one.
  #[error("re-entrant call into an observer that is still busy")]
  Reentrant,
}
