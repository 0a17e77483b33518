//! Testing utilities and mock implementations of the cycle collaborators.
//!
//! The mocks let a whole import cycle run without any network I/O.
//!
//! # Example
//!
//! ```rust,ignore
//! use fetchcycle_core::testing::{MockGetter, MockNotifier, MockStorer};
//!
//! let getter = MockGetter::new().with_records(vec![json!({"id": 1})]);
//! let storer = MockStorer::new();
//! storer.fail_payload(json!({"id": 1})).await;
//!
//! // Run an ImportCycle with them...
//! ```

mod mock_getter;
mod mock_notifier;
mod mock_storer;

pub use mock_getter::MockGetter;
pub use mock_notifier::MockNotifier;
pub use mock_storer::{MockStorer, RecordedStore};
