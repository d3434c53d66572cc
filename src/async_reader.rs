//! Async archive loading for Tokio sources (files, sockets, in-memory, etc.)
//!
//! The decoder works on a retained in-memory buffer, so the async side only
//! has to fill that buffer. Everything after the read is the synchronous core.

use crate::decoder::{DecoderOptions, SZipDecoder};
use crate::error::Result;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

impl SZipDecoder {
    /// Read an archive from any async reader and open it
    pub async fn open_async<R: AsyncRead + Unpin>(reader: R) -> Result<Self> {
        Self::open_async_with_options(reader, DecoderOptions::default()).await
    }

    pub async fn open_async_with_options<R: AsyncRead + Unpin>(
        mut reader: R,
        options: DecoderOptions,
    ) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;
        Self::open_with_options(data, options)
    }

    /// Read an archive file with Tokio's file I/O and open it
    pub async fn open_file_async<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_file_async_with_options(path, DecoderOptions::default()).await
    }

    pub async fn open_file_async_with_options<P: AsRef<Path>>(
        path: P,
        options: DecoderOptions,
    ) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        Self::open_with_options(data, options)
    }
}
