//! Async archive output for Tokio sinks
//!
//! Compression stays CPU-bound and synchronous; only the final write of the
//! finished archive goes through the async writer.

use crate::encoder::SZipEncoder;
use crate::error::Result;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

impl SZipEncoder {
    /// Build the archive and write it to an async writer, returning the writer
    pub async fn build_into_async<W: AsyncWrite + Unpin>(&mut self, mut output: W) -> Result<W> {
        let archive = self.build()?;
        output.write_all(&archive).await?;
        output.flush().await?;
        Ok(output)
    }

    /// Build the archive straight into a new file
    pub async fn build_to_file_async<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = tokio::fs::File::create(path).await?;
        let mut file = self.build_into_async(file).await?;
        file.shutdown().await?;
        Ok(())
    }
}
