//! FileMedia - byte sources an archive can be loaded from.

use crate::archive::{Archive, ArchiveDecoder};
use crate::error::Result;
use std::io::{Read, Seek, SeekFrom};

/// Interval for reading a byte range (inclusive end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReadInterval {
    pub start: u64,
    pub end: u64,
}

impl ReadInterval {
    /// The whole of a source `length` bytes long, or `None` when empty.
    pub fn whole(length: u64) -> Option<Self> {
        length.checked_sub(1).map(|end| Self { start: 0, end })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Local file implementation.
#[derive(Debug, Clone)]
pub struct LocalFileMedia {
    path: String,
    name: String,
    length: u64,
}

impl LocalFileMedia {
    pub fn new(path: &str) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            path: path.to_string(),
            name,
            length: metadata.len(),
        })
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sync read
    pub fn read_range_sync(&self, interval: ReadInterval) -> Result<Vec<u8>> {
        let mut file = std::fs::File::open(&self.path)?;
        file.seek(SeekFrom::Start(interval.start))?;
        let mut buffer = vec![0u8; interval.len() as usize];
        file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    pub fn read_all_sync(&self) -> Result<Vec<u8>> {
        match ReadInterval::whole(self.length) {
            Some(interval) => self.read_range_sync(interval),
            None => Ok(Vec::new()),
        }
    }
}

impl ArchiveDecoder {
    /// Load a local file and decode it.
    pub fn decode_file(&self, media: &LocalFileMedia) -> Result<Archive> {
        let data = media.read_all_sync()?;
        self.decode_bytes(&data)
    }
}

// Async FileMedia trait (requires 'async' feature)
#[cfg(feature = "async")]
use std::future::Future;
#[cfg(feature = "async")]
use std::pin::Pin;

/// Abstract file source that can provide byte ranges asynchronously.
///
/// Implement this trait for custom byte sources (e.g., HTTP range requests).
/// The library provides [`LocalFileMedia`] for local files.
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub trait FileMedia: Send + Sync {
    fn length(&self) -> u64;
    fn name(&self) -> &str;
    fn read_range(
        &self,
        interval: ReadInterval,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>>;
}

#[cfg(feature = "async")]
impl FileMedia for LocalFileMedia {
    fn length(&self) -> u64 {
        self.length
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn read_range(
        &self,
        interval: ReadInterval,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + '_>> {
        let path = self.path.clone();
        Box::pin(async move {
            use tokio::io::{AsyncReadExt, AsyncSeekExt};
            let mut file = tokio::fs::File::open(&path).await?;
            file.seek(std::io::SeekFrom::Start(interval.start)).await?;
            let mut buffer = vec![0u8; interval.len() as usize];
            file.read_exact(&mut buffer).await?;
            Ok(buffer)
        })
    }
}

#[cfg(feature = "async")]
impl ArchiveDecoder {
    /// Fetch the whole source, then decode it.
    ///
    /// Decoding itself is synchronous; only the load awaits.
    pub async fn decode_media(&self, media: &dyn FileMedia) -> Result<Archive> {
        let data = match ReadInterval::whole(media.length()) {
            Some(interval) => media.read_range(interval).await?,
            None => Vec::new(),
        };
        self.decode_bytes(&data)
    }
}
