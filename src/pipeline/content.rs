//! Payload access for work items.
//!
//! A work item never owns its payload bytes directly. It holds a factory that
//! can hand out a fresh seekable reader on demand, so clones and children can
//! share the same payload without copying it.

use std::fmt::Debug;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::Arc;

pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// Yields seekable views over a work item's payload.
pub trait ContentFactory: Debug + Send + Sync {
    fn open(&self) -> io::Result<Box<dyn ReadSeek>>;

    fn size(&self) -> io::Result<u64> {
        let mut reader = self.open()?;
        reader.seek(SeekFrom::End(0))
    }
}

/// Payload held in memory.
#[derive(Debug, Clone)]
pub struct BytesContent {
    data: Arc<[u8]>,
}

impl BytesContent {
    pub fn new(data: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            data: Arc::from(data.into()),
        })
    }
}

impl ContentFactory for BytesContent {
    fn open(&self) -> io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(Cursor::new(self.data.clone())))
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.data.len() as u64)
    }
}

/// Reads the whole payload behind a factory.
pub fn read_all(factory: &dyn ContentFactory) -> io::Result<Vec<u8>> {
    let mut reader = factory.open()?;
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}
