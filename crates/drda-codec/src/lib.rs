//! # drda-codec
//!
//! Blocking framing layer for DRDA.
//!
//! This crate moves DSS units between a byte stream and the IO-free
//! structures in `drda-protocol`: it reassembles continuation segments on
//! read and assigns chaining flags and correlation ids on write.
//!
//! ## Architecture
//!
//! ```text
//! Read + Write stream → read_unit / read_chain → DssUnit → client
//! client → command payloads → write_request / write_many → stream
//! ```
//!
//! Any `std::io::Read + Write` works as a transport; the client uses
//! `TcpStream`, tests use in-memory streams.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod framed;

pub use error::CodecError;
pub use framed::{chain_payload, is_command_object, read_chain, read_unit, write_many, write_request};
