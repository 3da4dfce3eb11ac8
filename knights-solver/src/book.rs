//! Binary tour book format.
//!
//! Format:
//! - Header (32 bytes):
//!   - Magic: "KTB1" (4 bytes)
//!   - Version: u32 LE (4 bytes)
//!   - Entry count: u64 LE (8 bytes)
//!   - Checksum: u64 LE xxhash of data section (8 bytes)
//!   - Reserved: 8 bytes (zeros)
//! - Data section (entry_count × 67 bytes):
//!   - Start square: u8 (0-63)
//!   - Method: u8 (0 = brute force, 1 = Warnsdorff)
//!   - Status: u8 (0 = found, 1 = not found, 2 = timed out)
//!   - Path: 64 square indices (zeros unless found)
//!
//! Entries are sorted by (method, start).

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use knights_core::search::EMPTY_PATH;
use knights_core::{Method, Square, Status, TourPath, BOARD_SIZE};
use xxhash_rust::xxh64::xxh64;

const MAGIC: &[u8; 4] = b"KTB1";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 32;
const ENTRY_SIZE: usize = 3 + BOARD_SIZE;

/// One search result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookEntry {
    pub start: Square,
    pub method: Method,
    pub status: Status,
    /// Present only when `status` is `Found`.
    pub path: Option<TourPath>,
}

impl BookEntry {
    pub fn new(start: Square, method: Method, status: Status, path: &TourPath) -> Self {
        Self {
            start,
            method,
            status,
            path: status.is_found().then_some(*path),
        }
    }

    fn key(&self) -> (u8, u8) {
        (method_code(self.method), self.start.0)
    }
}

fn method_code(method: Method) -> u8 {
    match method {
        Method::BruteForce => 0,
        Method::Warnsdorff => 1,
    }
}

fn method_from_code(code: u8) -> Option<Method> {
    match code {
        0 => Some(Method::BruteForce),
        1 => Some(Method::Warnsdorff),
        _ => None,
    }
}

fn status_code(status: Status) -> u8 {
    match status {
        Status::Found => 0,
        Status::NotFound => 1,
        Status::TimedOut => 2,
    }
}

fn status_from_code(code: u8) -> Option<Status> {
    match code {
        0 => Some(Status::Found),
        1 => Some(Status::NotFound),
        2 => Some(Status::TimedOut),
        _ => None,
    }
}

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

/// Search results keyed by (start square, method).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TourBook {
    pub entries: Vec<BookEntry>,
}

impl TourBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, replacing any previous one for the same start and method.
    pub fn insert(&mut self, entry: BookEntry) {
        match self.entries.iter_mut().find(|e| e.key() == entry.key()) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn get(&self, start: Square, method: Method) -> Option<&BookEntry> {
        self.entries
            .iter()
            .find(|e| e.start == start && e.method == method)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode header and data section.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|e| e.key());

        let mut data = Vec::with_capacity(entries.len() * ENTRY_SIZE);
        for entry in &entries {
            data.push(entry.start.0);
            data.push(method_code(entry.method));
            data.push(status_code(entry.status));
            let path = entry.path.unwrap_or(EMPTY_PATH);
            data.extend(path.iter().map(|sq| sq.0));
        }

        let checksum = xxh64(&data, 0);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&VERSION.to_le_bytes());
        bytes.extend_from_slice(&(entries.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&checksum.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 8]); // Reserved
        bytes.extend_from_slice(&data);
        bytes
    }

    /// Decode a complete book.
    pub fn from_reader(reader: &mut impl Read) -> io::Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(invalid("Invalid tour book magic"));
        }

        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != VERSION {
            return Err(invalid(format!("Unsupported tour book version: {}", version)));
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&header[8..16]);
        let count = u64::from_le_bytes(count_bytes) as usize;
        let mut checksum_bytes = [0u8; 8];
        checksum_bytes.copy_from_slice(&header[16..24]);
        let stored_checksum = u64::from_le_bytes(checksum_bytes);

        // One entry per (method, start) at most
        if count > 2 * BOARD_SIZE {
            return Err(invalid(format!("Implausible entry count: {}", count)));
        }

        let mut data = vec![0u8; count * ENTRY_SIZE];
        reader.read_exact(&mut data)?;

        if xxh64(&data, 0) != stored_checksum {
            return Err(invalid("Tour book checksum mismatch"));
        }

        let mut book = TourBook::new();
        for chunk in data.chunks_exact(ENTRY_SIZE) {
            let start = Square::from_index(chunk[0]).map_err(|e| invalid(e.to_string()))?;
            let method = method_from_code(chunk[1])
                .ok_or_else(|| invalid(format!("Unknown method code: {}", chunk[1])))?;
            let status = status_from_code(chunk[2])
                .ok_or_else(|| invalid(format!("Unknown status code: {}", chunk[2])))?;

            let mut path = EMPTY_PATH;
            for (slot, &index) in path.iter_mut().zip(&chunk[3..]) {
                *slot = Square::from_index(index).map_err(|e| invalid(e.to_string()))?;
            }
            book.entries.push(BookEntry::new(start, method, status, &path));
        }
        Ok(book)
    }

    /// Save to a binary file. Returns the number of entries written.
    pub fn save(&self, path: &Path) -> io::Result<usize> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&self.to_bytes())?;
        writer.flush()?;
        Ok(self.entries.len())
    }

    /// Load from a binary file.
    pub fn load(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::from_reader(&mut reader)
    }

    /// Get file size estimate for a given number of entries.
    pub fn estimate_size(count: usize) -> usize {
        HEADER_SIZE + count * ENTRY_SIZE
    }
}
