//! # Lazulite
//!
//! A reliable, ordered, connection-oriented transport core carried over an
//! unreliable datagram substrate, wire-compatible with KCP.
//!
//! The crate is sans-IO: a [`Session`] owns the per-conversation ARQ state
//! machine (fragmentation, retransmission, selective ACKs, window and
//! congestion control) and never touches a socket. The caller feeds received
//! datagrams through [`Session::input`], drives time through
//! [`Session::update`]/[`Session::check`], and receives encoded datagrams
//! through the [`Output`] sink installed at construction.
//!
//! ```
//! use lazulite::Session;
//!
//! let mut session = Session::new(0x1234_5678, |datagram: &[u8]| {
//!     // hand the datagram to the UDP socket
//!     let _ = datagram;
//! })
//! .unwrap();
//! session.send(b"hello").unwrap();
//! session.update(0).unwrap();
//! ```

pub mod config;
pub mod congestion;
pub mod consts;
pub mod error;
pub mod rtt;
pub mod segment;
pub mod session;

pub use config::{Config, NoDelay};
pub use error::{Result, SessionError};
pub use segment::{peek_conv, Command, Segment};
pub use session::{Output, Session};
