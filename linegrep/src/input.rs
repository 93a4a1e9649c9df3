//! Input acquisition: resolves a byte stream (standard input or a single
//! file) into the in-memory, ordered line sequence the engine operates on.
//!
//! The whole input is materialized before matching begins. Ordinary files are
//! read through a buffered reader; files past [`LARGE_INPUT_THRESHOLD`] are
//! memory-mapped instead of copied through the buffer. Newline bytes are
//! stripped; `\r\n` endings lose the `\r` as well.

use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

use crate::config::EncodingMode;
use crate::errors::{SearchError, SearchResult};

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const LARGE_INPUT_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Where the line sequence comes from
#[derive(Debug, Clone)]
pub enum LineSource {
    Stdin,
    File(PathBuf),
}

impl LineSource {
    /// Standard input when no path is given, otherwise the file at `path`
    pub fn from_arg(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::File(path),
            None => Self::Stdin,
        }
    }

    /// Reads the entire source and splits it into lines
    pub fn read_lines(&self, encoding_mode: EncodingMode) -> SearchResult<Vec<String>> {
        let contents = match self {
            Self::Stdin => {
                trace!("Reading lines from standard input");
                let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, io::stdin().lock());
                let mut bytes = Vec::new();
                reader.read_to_end(&mut bytes).map_err(SearchError::IoError)?;
                decode_bytes(&bytes, Path::new("<stdin>"), encoding_mode)?
            }
            Self::File(path) => read_file(path, encoding_mode)?,
        };

        Ok(contents.lines().map(str::to_owned).collect())
    }
}

/// Reads a file, memory-mapping it when it is large enough to make the
/// buffered copy wasteful
fn read_file(path: &Path, encoding_mode: EncodingMode) -> SearchResult<String> {
    trace!("Reading lines from file: {}", path.display());

    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => SearchError::file_not_found(path),
        io::ErrorKind::PermissionDenied => SearchError::permission_denied(path),
        _ => SearchError::IoError(e),
    })?;

    let use_mmap = match file.metadata() {
        Ok(metadata) => metadata.len() >= LARGE_INPUT_THRESHOLD,
        Err(e) => {
            warn!("Failed to get metadata for {}: {}", path.display(), e);
            false
        }
    };

    if use_mmap {
        let mmap = unsafe { Mmap::map(&file) }.map_err(SearchError::IoError)?;
        decode_bytes(&mmap, path, encoding_mode)
    } else {
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(SearchError::IoError)?;
        decode_bytes(&bytes, path, encoding_mode)
    }
}

/// Decodes raw bytes into a String according to the encoding mode
fn decode_bytes(bytes: &[u8], origin: &Path, encoding_mode: EncodingMode) -> SearchResult<String> {
    match encoding_mode {
        EncodingMode::FailFast => {
            // Validate in place first so the valid case costs a single copy
            match std::str::from_utf8(bytes) {
                Ok(valid_str) => Ok(valid_str.to_owned()),
                Err(_) => {
                    let from_utf8_err = match String::from_utf8(bytes.to_vec()) {
                        Ok(_) => unreachable!("validation already failed"),
                        Err(e) => e,
                    };
                    Err(SearchError::encoding_error(origin, from_utf8_err))
                }
            }
        }
        EncodingMode::Lossy => {
            let cow = String::from_utf8_lossy(bytes);
            // Owned means at least one invalid sequence was replaced
            if let std::borrow::Cow::Owned(_) = cow {
                warn!("Invalid UTF-8 replaced in input: {}", origin.display());
            }
            Ok(cow.into_owned())
        }
    }
}
