//! Append-only write-ahead log.
//!
//! Every record is framed as `[crc32 LE][payload]` where the payload is
//! `op(1) | key_len(2 LE) | key | vec_len(4 LE) | vec_len * f32-bits(4 LE)`.
//! The CRC is the IEEE CRC-32 of the payload. Appends flush to the OS on
//! every call but issue no fsync: the log survives process crash, not power
//! loss.
//!
//! Replay recomputes each record's CRC from the bytes actually read. A
//! short read or CRC mismatch marks a truncated tail and ends replay
//! cleanly; everything before it is delivered.

use crate::config;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Record opcode: insert a vector under a key.
pub const OP_INSERT: u8 = 1;
/// Record opcode reserved for deletion. Written by nothing today; replay
/// parses and skips it.
pub const OP_DELETE: u8 = 2;

/// Diagnostic counters from one replay pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// Insert records delivered to the callback.
    pub records: usize,
    /// Records with an unknown or reserved opcode, or an undecodable key.
    pub skipped: usize,
    /// CRC mismatches (at most one; the first ends replay).
    pub crc_mismatches: usize,
    /// Whether replay stopped at a partially written record.
    pub truncated: bool,
}

/// Framed, checksum-guarded append log.
///
/// Appends are serialized by a mutex over the buffered writer. Replay reads
/// through an independent handle on the same path, so the writer keeps its
/// append-only position.
pub struct WriteAheadLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl WriteAheadLog {
    /// Opens the log at `path` in create-append mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path,
        })
    }

    /// Appends an insert record and flushes it to the OS.
    pub fn append_insert(&self, id: &str, vector: &[f32]) -> Result<()> {
        if id.len() > u16::MAX as usize {
            return Err(Error::IdTooLong(id.len()));
        }
        let payload = encode_insert(id, vector);
        let crc = crc32fast::hash(&payload);

        let mut writer = self.writer.lock();
        writer.write_all(&crc.to_le_bytes())?;
        writer.write_all(&payload)?;
        writer.flush()?;
        Ok(())
    }

    /// Flushes any buffered bytes to the OS.
    pub fn flush(&self) -> Result<()> {
        self.writer.lock().flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the log from the start, invoking `on_insert` for every intact
    /// insert record in order.
    ///
    /// Returns `Err` only when the file itself is unreadable; a damaged
    /// tail ends replay cleanly and is reported through [`ReplayStats`].
    pub fn replay<F>(&self, mut on_insert: F) -> Result<ReplayStats>
    where
        F: FnMut(&str, Vec<f32>),
    {
        self.flush()?;
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut stats = ReplayStats::default();
        let mut payload = Vec::new();

        loop {
            let mut crc_buf = [0u8; 4];
            match reader.read_exact(&mut crc_buf) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            }
            let stored_crc = u32::from_le_bytes(crc_buf);

            // Accumulate the payload field by field; it is checksummed as a
            // whole once its self-delimiting layout has been read.
            payload.clear();
            if !read_into(&mut reader, &mut payload, 1)? {
                stats.truncated = true;
                break;
            }
            let op = payload[0];

            if !read_into(&mut reader, &mut payload, 2)? {
                stats.truncated = true;
                break;
            }
            let key_len = u16::from_le_bytes([payload[1], payload[2]]) as usize;
            if !read_into(&mut reader, &mut payload, key_len)? {
                stats.truncated = true;
                break;
            }

            if !read_into(&mut reader, &mut payload, 4)? {
                stats.truncated = true;
                break;
            }
            let vec_off = 3 + key_len;
            let vec_len = u32::from_le_bytes([
                payload[vec_off],
                payload[vec_off + 1],
                payload[vec_off + 2],
                payload[vec_off + 3],
            ]) as usize;
            if vec_len > config::WAL_MAX_VECTOR_COMPONENTS {
                tracing::warn!(vec_len, "implausible vector length, dropping log tail");
                stats.truncated = true;
                break;
            }
            if !read_into(&mut reader, &mut payload, vec_len * 4)? {
                stats.truncated = true;
                break;
            }

            if crc32fast::hash(&payload) != stored_crc {
                tracing::warn!("record checksum mismatch, dropping log tail");
                stats.crc_mismatches += 1;
                break;
            }

            if op != OP_INSERT {
                // Unknown and reserved opcodes skip silently so older
                // binaries can replay logs written by newer ones.
                stats.skipped += 1;
                continue;
            }

            let Ok(key) = std::str::from_utf8(&payload[3..3 + key_len]) else {
                tracing::warn!("record key is not UTF-8, skipping");
                stats.skipped += 1;
                continue;
            };
            let mut vector = Vec::with_capacity(vec_len);
            for chunk in payload[vec_off + 4..].chunks_exact(4) {
                vector.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
            }
            on_insert(key, vector);
            stats.records += 1;
        }

        Ok(stats)
    }
}

/// Appends `n` bytes from the reader onto `payload`. Returns `Ok(false)` on
/// end-of-file, which replay treats as a truncated record.
fn read_into(reader: &mut impl Read, payload: &mut Vec<u8>, n: usize) -> Result<bool> {
    let start = payload.len();
    payload.resize(start + n, 0);
    match reader.read_exact(&mut payload[start..]) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

fn encode_insert(id: &str, vector: &[f32]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(1 + 2 + id.len() + 4 + vector.len() * 4);
    payload.push(OP_INSERT);
    payload.extend_from_slice(&(id.len() as u16).to_le_bytes());
    payload.extend_from_slice(id.as_bytes());
    payload.extend_from_slice(&(vector.len() as u32).to_le_bytes());
    for &component in vector {
        payload.extend_from_slice(&component.to_le_bytes());
    }
    payload
}
