//! Async I/O traits and utilities.
//!
//! Re-exports Tokio's I/O traits so bridge implementations and the storage
//! core agree on a single reader/writer vocabulary.

pub use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWrite,
    AsyncWriteExt, BufReader, BufWriter, ReadBuf, SeekFrom,
};
