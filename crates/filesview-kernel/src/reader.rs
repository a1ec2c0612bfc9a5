//! Bounded partial reads of a single file.

use std::io::SeekFrom;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::FilesResult;

/// Reads are capped at this many memory pages.
pub const READ_CAP_PAGES: u64 = 16;

/// Largest number of bytes a single read returns.
pub fn max_read_length() -> u64 {
    rustix::param::page_size() as u64 * READ_CAP_PAGES
}

/// Result of a ranged read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadChunk {
    /// Offset the data starts at. For reads at or past the end of the file
    /// this is the file size.
    pub offset: u64,
    /// The bytes read, one `char` per byte (Latin-1), so chunks can be
    /// concatenated and mapped back to the file's bytes.
    pub data: String,
}

impl ReadChunk {
    fn eof(size: u64) -> Self {
        Self {
            offset: size,
            data: String::new(),
        }
    }
}

/// Read up to `length` bytes of `path` starting at `offset`.
///
/// - `offset` defaults to the file size, which makes an offset-less read a
///   size probe returning no data.
/// - `length` defaults to the rest of the file and is always capped at
///   [`max_read_length`].
/// - Reading at or past the end returns `{ offset: size, data: "" }`.
///
/// The file handle lives only for the duration of this call.
pub async fn read_range(
    path: &Path,
    offset: Option<u64>,
    length: Option<u64>,
) -> FilesResult<ReadChunk> {
    let mut file = File::open(path).await?;
    let size = file.seek(SeekFrom::End(0)).await?;

    let offset = offset.unwrap_or(size);
    let length = length
        .unwrap_or_else(|| size.saturating_sub(offset))
        .min(max_read_length());

    if offset >= size {
        return Ok(ReadChunk::eof(size));
    }

    file.seek(SeekFrom::Start(offset)).await?;

    let mut data = Vec::with_capacity(length as usize);
    file.take(length).read_to_end(&mut data).await?;

    Ok(ReadChunk {
        offset,
        data: data.into_iter().map(char::from).collect(),
    })
}
