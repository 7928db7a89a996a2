//! Newline-delimited framing over an async stream, built on
//! `tokio_util::codec::{FramedRead, LinesCodec}`, with a line-size ceiling so
//! a single oversized line can't buffer unboundedly.

use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};

/// 16 MiB: a single JSON-RPC line larger than this is treated as a
/// transport error rather than buffered indefinitely.
pub const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// Wrap an async byte stream in a line-delimited frame reader.
pub fn frame_reader<R: AsyncRead + Unpin>(reader: R) -> FramedRead<R, LinesCodec> {
    FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_LINE_BYTES))
}
