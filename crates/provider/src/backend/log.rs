//! Append-only log backend used by `log` databases.
//!
//! Every mutation is appended to `<root>/<name>.log` before it is applied to
//! the in-memory index. Opening the database replays the file.
//!
//! # Record Layout
//!
//! ```text
//! ┌─────────────────┬──────────────────┬─────────────────────────┬──────────┐
//! │ Length (4 bytes)│ Format Ver (1)   │ Payload (variable)      │ CRC32 (4)│
//! └─────────────────┴──────────────────┴─────────────────────────┴──────────┘
//!
//! Payload:
//! ┌──────────┬─────────────┬──────────────────────────────────────────────┐
//! │ Op (1)   │ Count (4)   │ Count × (KeyLen (4), Key, [ValLen (4), Val]) │
//! └──────────┴─────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Length covers version + payload; the CRC covers the same bytes. A batch is
//! one record, so a torn write drops the whole batch on replay.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;
use kvlink_core::{Error, Key, Result, Value};
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::{scan_range, Backend};

/// Current record format version
pub const LOG_RECORD_FORMAT_VERSION: u8 = 1;

/// File extension of log databases
pub const LOG_EXTENSION: &str = "log";

const OP_PUT: u8 = 1;
const OP_ERASE: u8 = 2;

struct LogState {
    file: File,
    index: BTreeMap<Key, Value>,
}

/// Log-structured backend: durable appends plus an ordered in-memory index.
pub struct LogBackend {
    path: PathBuf,
    state: Mutex<LogState>,
}

impl LogBackend {
    /// Open (or create) the log for `name` under `root` and replay it.
    pub fn open(root: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(root)?;
        let path = root.join(format!("{}.{}", name, LOG_EXTENSION));
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let (index, valid_len) = replay(&mut file)?;
        let file_len = file.metadata()?.len();
        if valid_len < file_len {
            warn!(
                target: "kvlink::backend",
                path = %path.display(),
                valid_len,
                file_len,
                "Truncating torn log tail"
            );
            file.set_len(valid_len)?;
        }
        debug!(target: "kvlink::backend", path = %path.display(), keys = index.len(), "Log replayed");

        Ok(LogBackend {
            path,
            state: Mutex::new(LogState { file, index }),
        })
    }

    /// Location of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(file: &mut File, op: u8, entries: &[(&[u8], Option<&[u8]>)]) -> Result<()> {
        let record = encode_record(op, entries)?;
        file.write_all(&record)?;
        Ok(())
    }
}

/// A length as stored in a record; the format caps every field at 4 bytes.
fn length_field(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::ConstraintViolation {
        reason: format!("{} of {} bytes does not fit a log record", what, len),
    })
}

fn encode_record(op: u8, entries: &[(&[u8], Option<&[u8]>)]) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    body.write_u8(LOG_RECORD_FORMAT_VERSION)?;
    body.write_u8(op)?;
    body.write_u32::<LittleEndian>(length_field(entries.len(), "batch")?)?;
    for (key, value) in entries {
        body.write_u32::<LittleEndian>(length_field(key.len(), "key")?)?;
        body.write_all(key)?;
        if let Some(value) = value {
            body.write_u32::<LittleEndian>(length_field(value.len(), "value")?)?;
            body.write_all(value)?;
        }
    }
    let body_len = length_field(body.len(), "record")?;

    let mut hasher = Hasher::new();
    hasher.update(&body);
    let crc = hasher.finalize();

    let mut record = Vec::with_capacity(body.len() + 8);
    record.write_u32::<LittleEndian>(body_len)?;
    record.extend_from_slice(&body);
    record.write_u32::<LittleEndian>(crc)?;
    Ok(record)
}

/// Replay every intact record. Returns the index and the byte length of the
/// valid prefix of the file.
fn replay(file: &mut File) -> Result<(BTreeMap<Key, Value>, u64)> {
    let file_len = file.metadata()?.len();
    file.seek(SeekFrom::Start(0))?;
    let mut reader = BufReader::new(&*file);
    let mut index = BTreeMap::new();
    let mut valid_len = 0u64;

    loop {
        let len = match reader.read_u32::<LittleEndian>() {
            Ok(len) => len,
            Err(_) => break,
        };
        // A length running past the end of the file is a torn or corrupt tail.
        if valid_len + 4 + u64::from(len) + 4 > file_len {
            break;
        }
        let len = len as usize;
        let mut body = vec![0u8; len];
        if reader.read_exact(&mut body).is_err() {
            break;
        }
        let crc = match reader.read_u32::<LittleEndian>() {
            Ok(crc) => crc,
            Err(_) => break,
        };
        let mut hasher = Hasher::new();
        hasher.update(&body);
        if hasher.finalize() != crc {
            break;
        }
        if apply_record(&mut index, &body).is_err() {
            break;
        }
        valid_len += 4 + len as u64 + 4;
    }

    Ok((index, valid_len))
}

fn apply_record(index: &mut BTreeMap<Key, Value>, body: &[u8]) -> Result<()> {
    let corrupt = |what: &str| Error::Io {
        reason: format!("corrupt log record: {}", what),
    };
    let mut cur = Cursor::new(body);
    let version = cur.read_u8()?;
    if version != LOG_RECORD_FORMAT_VERSION {
        return Err(corrupt("unknown format version"));
    }
    let op = cur.read_u8()?;
    let count = cur.read_u32::<LittleEndian>()?;

    let read_bytes = |cur: &mut Cursor<&[u8]>| -> Result<Vec<u8>> {
        let n = u64::from(cur.read_u32::<LittleEndian>()?);
        if n > body.len() as u64 - cur.position() {
            return Err(corrupt("field runs past the record"));
        }
        let mut buf = vec![0u8; n as usize];
        cur.read_exact(&mut buf)?;
        Ok(buf)
    };

    // Decode fully before touching the index so a bad record applies nothing.
    // Every entry takes at least its 4-byte key length.
    let mut ops = Vec::with_capacity((count as usize).min(body.len() / 4));
    for _ in 0..count {
        let key = read_bytes(&mut cur)?;
        let value = match op {
            OP_PUT => Some(read_bytes(&mut cur)?),
            OP_ERASE => None,
            _ => return Err(corrupt("unknown op")),
        };
        ops.push((key, value));
    }
    for (key, value) in ops {
        match value {
            Some(v) => index.insert(key, v),
            None => index.remove(&key),
        };
    }
    Ok(())
}

impl Backend for LogBackend {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        Self::append(&mut state.file, OP_PUT, &[(key, Some(value))])?;
        state.index.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn put_multi(&self, entries: &[(Key, Value)]) -> Result<()> {
        let borrowed: Vec<(&[u8], Option<&[u8]>)> = entries
            .iter()
            .map(|(k, v)| (k.as_slice(), Some(v.as_slice())))
            .collect();
        let mut state = self.state.lock();
        Self::append(&mut state.file, OP_PUT, &borrowed)?;
        for (k, v) in entries {
            state.index.insert(k.clone(), v.clone());
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Value>> {
        Ok(self.state.lock().index.get(key).cloned())
    }

    fn length(&self, key: &[u8]) -> Result<Option<u64>> {
        Ok(self.state.lock().index.get(key).map(|v| v.len() as u64))
    }

    fn erase(&self, key: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if !state.index.contains_key(key) {
            return Ok(());
        }
        Self::append(&mut state.file, OP_ERASE, &[(key, None)])?;
        state.index.remove(key);
        Ok(())
    }

    fn erase_multi(&self, keys: &[Key]) -> Result<()> {
        let mut state = self.state.lock();
        let present: Vec<(&[u8], Option<&[u8]>)> = keys
            .iter()
            .filter(|k| state.index.contains_key(k.as_slice()))
            .map(|k| (k.as_slice(), None))
            .collect();
        if present.is_empty() {
            return Ok(());
        }
        let record = encode_record(OP_ERASE, &present)?;
        state.file.write_all(&record)?;
        for k in keys {
            state.index.remove(k);
        }
        Ok(())
    }

    fn scan(&self, start_key: &[u8], prefix: &[u8], max: usize) -> Result<Vec<(Key, Value)>> {
        let state = self.state.lock();
        Ok(scan_range(&state.index, start_key, prefix)
            .take(max)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    fn flush(&self) -> Result<()> {
        self.state.lock().file.sync_data()?;
        Ok(())
    }

    fn destroy(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.index.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
