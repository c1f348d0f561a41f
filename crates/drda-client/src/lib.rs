//! # drda-client
//!
//! Blocking DRDA client for Apache Derby and IBM Db2.
//!
//! This is the public API surface of the workspace. It runs the DRDA
//! conversation over any `Read + Write` transport and returns typed rows.
//!
//! ## Dialects
//!
//! | | Derby | Db2 |
//! |---|---|---|
//! | character data | UTF-8 | EBCDIC code page 500 |
//! | numeric byte order | big-endian | little-endian |
//! | credentials | `APP`, no password | user and password |
//! | query round trips | 1 | 2 reply chains + describe + close |
//!
//! When no dialect is configured, Derby is assumed without a user and Db2
//! with one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use drda_client::{Client, Config};
//!
//! let config = Config::from_connection_string(
//!     "Host=localhost;Port=50000;Database=SAMPLE;User=db2inst1;Password=secret",
//! )?;
//! let mut client = Client::connect(config)?;
//!
//! client.execute_with("INSERT INTO T (ID, NAME) VALUES (?, ?)", &[&1, &"A"])?;
//! for row in client.query("SELECT ID, NAME FROM T")? {
//!     let id: i32 = row.get(0)?;
//!     let name: String = row.get_by_name("NAME")?;
//!     println!("{id}: {name}");
//! }
//!
//! client.close()?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod response;
pub mod row;
pub mod state;

pub use client::Client;
pub use config::Config;
pub use drda_protocol::Dialect;
pub use drda_types::{FromSql, SqlValue, ToSql};
pub use error::{Error, Result};
pub use response::{ParserState, Response, ResponseParser, read_response};
pub use row::{Column, ResultSet, Row};
pub use state::ProtocolState;
