//! # drda-testing
//!
//! Test infrastructure for DRDA client development.
//!
//! ## Features
//!
//! - [`MockStream`]: a `Read + Write` stream with scripted replies and
//!   captured requests, so clients can be driven without a server
//! - [`ReplyBuilder`]: encodes server reply chains (reply messages, SQLCARD,
//!   SQLDARD, QRYDSC, QRYDTA) in either dialect's encoding and byte order
//! - [`fixtures`]: canned replies for whole client phases
//!
//! ## Example
//!
//! ```rust,ignore
//! use drda_testing::{MockColumn, MockStream, fixtures};
//!
//! let mut replies = fixtures::handshake(Dialect::Derby)?;
//! replies.extend(fixtures::query(
//!     Dialect::Derby,
//!     &[MockColumn::integer("ID")],
//!     &[vec![SqlValue::Int(1)]],
//! )?);
//! let stream = MockStream::new().with_input(replies);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod fixtures;
pub mod mock_stream;
pub mod replies;

pub use mock_stream::MockStream;
pub use replies::{MockCard, MockColumn, MockError, QUERY_INSTANCE, ReplyBuilder};
