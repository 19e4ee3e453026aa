//! Length-delimited bincode framing.
//!
//! Every record travels as a single frame: a 4-byte big-endian length
//! followed by the bincode (standard config) encoding of the record.
//! bincode writes an explicit tag for each `Option`, so an absent username
//! stays absent on the other side.

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::{ProtocolError, Result};

/// Largest frame any connection will accept, whatever the caller asks for.
const FRAME_CAP: usize = cadence_core::config::MAX_FRAME_BYTES;

/// Upper bound on the bytes bincode may allocate while decoding one record.
/// bincode charges containers by in-memory size (`size_of::<T>()` per
/// element), which runs well above the encoded size, so a full frame of
/// short ids needs headroom over `FRAME_CAP`.
const DECODE_LIMIT: usize = 32 * FRAME_CAP;

/// A connection wrapped in the length-delimited codec.
pub type FramedConn<S> = Framed<S, LengthDelimitedCodec>;

/// Wrap `io` so it yields and accepts whole frames of at most
/// `max_frame_bytes`, clamped to `MAX_FRAME_BYTES`.
pub fn framed<S>(io: S, max_frame_bytes: usize) -> FramedConn<S>
where
    S: AsyncRead + AsyncWrite,
{
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_bytes.min(FRAME_CAP))
        .new_codec();
    Framed::new(io, codec)
}

/// Encode a record to its frame payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| ProtocolError::Encode(e.to_string()))
}

/// Decode a frame payload. Trailing bytes after the record are rejected.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let config = bincode::config::standard().with_limit::<DECODE_LIMIT>();
    let (value, read) = bincode::serde::decode_from_slice(bytes, config)
        .map_err(|e| ProtocolError::Decode(e.to_string()))?;
    if read != bytes.len() {
        return Err(ProtocolError::Decode(format!(
            "{} trailing bytes after record",
            bytes.len() - read
        )));
    }
    Ok(value)
}

/// Write one record as one frame.
pub async fn send<S, T>(conn: &mut FramedConn<S>, value: &T) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = encode(value)?;
    conn.send(Bytes::from(payload)).await?;
    Ok(())
}

/// Read the next frame and decode it as `T`.
pub async fn recv<S, T>(conn: &mut FramedConn<S>) -> Result<T>
where
    S: AsyncRead + AsyncWrite + Unpin,
    T: DeserializeOwned,
{
    match conn.next().await {
        Some(Ok(frame)) => decode(&frame),
        Some(Err(e)) => Err(ProtocolError::Io(e)),
        None => Err(ProtocolError::ConnectionClosed),
    }
}
