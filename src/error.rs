//! The single error type carried by `on_error`.
//!
//! Every recoverable failure in a stream ends up here and is delivered
//! through [`Subscriber::on_error`](crate::subscriber::Subscriber::on_error);
//! nothing is reported out of band.

use std::{error::Error, sync::Arc};

/// A type-erased, shareable error produced by user code (a transform or a
/// fallible source).
pub type BoxError = Arc<dyn Error + Send + Sync>;

/// Terminal error signaled to a [`Subscriber`](crate::subscriber::Subscriber).
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamError {
  /// The subscriber asked for a non-positive number of elements.
  #[error("subscriber requested {count} elements; requests must be strictly positive")]
  IllegalRequest { count: i64 },

  /// The publisher (or processor side) only serves a single subscriber and
  /// already has one.
  #[error("only one subscriber is allowed")]
  MultipleSubscribers,

  /// The transform of a processing stage failed on an element.
  #[error("transform failed: {0}")]
  Transform(#[source] BoxError),

  /// The element source failed while producing the next element.
  #[error("source failed: {0}")]
  Source(#[source] BoxError),
}

impl StreamError {
  pub fn transform<E: Error + Send + Sync + 'static>(err: E) -> Self {
    StreamError::Transform(Arc::new(err))
  }

  pub fn source<E: Error + Send + Sync + 'static>(err: E) -> Self {
    StreamError::Source(Arc::new(err))
  }

  /// Whether this error reports a broken contract rather than a failure of
  /// the data itself.
  pub fn is_contract_violation(&self) -> bool {
    matches!(self, StreamError::IllegalRequest { .. } | StreamError::MultipleSubscribers)
  }
}
