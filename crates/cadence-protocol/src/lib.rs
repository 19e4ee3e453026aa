//! `cadence-protocol`: the request/response records exchanged between the
//! `cadence` controller and the `cadenced` daemon, and their wire codec.
//!
//! One TCP connection carries exactly one request. `task` and `stop` are
//! fire-and-forget; only `list` is answered, with a [`JobList`].

pub mod codec;
pub mod error;
pub mod frames;

pub use codec::{decode, encode, framed, recv, send, FramedConn};
pub use error::{ProtocolError, Result};
pub use frames::{JobList, Request, TaskSpec};
