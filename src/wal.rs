//! On-disk log of slot events.
//!
//! Each record is `[u32 LE: len][bincode Event][u32 LE: crc32 of payload]`.
//! Records are only ever appended; a rewrite replaces the whole file with a
//! snapshot through a rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::limits::MAX_ENTRY_BYTES;
use crate::model::Event;

/// Why replay stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    /// The file ended on a record boundary.
    Clean,
    /// The last record was cut short.
    Torn,
    /// A length prefix larger than any slot event.
    Oversized(u32),
    /// A record that fails its checksum or does not decode.
    Corrupt,
}

/// Events recovered from disk, up to the first unreadable record.
#[derive(Debug)]
pub struct Replay {
    pub events: Vec<Event>,
    pub tail: Tail,
}

/// Writer activity since open or the last rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalCounters {
    /// Events written.
    pub events: u64,
    /// fsyncs issued.
    pub syncs: u64,
}

enum Record {
    Event(Event),
    End(Tail),
}

fn invalid(msg: impl ToString) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

fn frame(event: &Event) -> io::Result<Vec<u8>> {
    let payload = bincode::serialize(event).map_err(invalid)?;
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_ENTRY_BYTES)
        .ok_or_else(|| invalid(format!("slot event of {} bytes", payload.len())))?;

    let mut record = Vec::with_capacity(payload.len() + 8);
    record.extend_from_slice(&len.to_le_bytes());
    record.extend_from_slice(&payload);
    record.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    Ok(record)
}

/// Read until `buf` is full or the input ends; returns the bytes read.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match reader.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(read)
}

fn read_record(reader: &mut impl Read) -> io::Result<Record> {
    let mut header = [0u8; 4];
    match fill(reader, &mut header)? {
        0 => return Ok(Record::End(Tail::Clean)),
        4 => {}
        _ => return Ok(Record::End(Tail::Torn)),
    }
    let len = u32::from_le_bytes(header);
    if len > MAX_ENTRY_BYTES {
        return Ok(Record::End(Tail::Oversized(len)));
    }

    let len = len as usize;
    let mut body = vec![0u8; len + 4];
    if fill(reader, &mut body)? < body.len() {
        return Ok(Record::End(Tail::Torn));
    }
    let mut crc = [0u8; 4];
    crc.copy_from_slice(&body[len..]);
    let payload = &body[..len];
    if u32::from_le_bytes(crc) != crc32fast::hash(payload) {
        return Ok(Record::End(Tail::Corrupt));
    }
    Ok(bincode::deserialize(payload).map_or(Record::End(Tail::Corrupt), Record::Event))
}

fn snapshot_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".snapshot");
    PathBuf::from(name)
}

fn open_append(path: &Path) -> io::Result<BufWriter<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

/// Writer half of the log. Owned by a single task.
pub struct Wal {
    out: BufWriter<File>,
    path: PathBuf,
    counters: WalCounters,
}

impl Wal {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            out: open_append(path)?,
            path: path.to_path_buf(),
            counters: WalCounters::default(),
        })
    }

    /// Buffer one event. It is not durable until `sync`.
    pub fn buffer(&mut self, event: &Event) -> io::Result<()> {
        self.out.write_all(&frame(event)?)?;
        self.counters.events += 1;
        Ok(())
    }

    pub fn sync(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        self.counters.syncs += 1;
        Ok(())
    }

    #[cfg(test)]
    pub fn append(&mut self, event: &Event) -> io::Result<()> {
        self.buffer(event)?;
        self.sync()
    }

    pub fn counters(&self) -> WalCounters {
        self.counters
    }

    /// Replace the log with `events`: write and fsync a snapshot file, rename
    /// it over the log, then keep appending to the new file.
    pub fn rewrite(&mut self, events: &[Event]) -> io::Result<()> {
        self.sync()?;
        let snapshot = snapshot_path(&self.path);
        {
            let mut out = BufWriter::new(File::create(&snapshot)?);
            for event in events {
                out.write_all(&frame(event)?)?;
            }
            out.flush()?;
            out.get_ref().sync_all()?;
        }
        fs::rename(&snapshot, &self.path)?;
        #[cfg(unix)]
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            File::open(dir)?.sync_all()?;
        }
        self.out = open_append(&self.path)?;
        self.counters = WalCounters::default();
        Ok(())
    }

    /// Read every intact event. A missing file is an empty, clean log.
    pub fn replay(path: &Path) -> io::Result<Replay> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(Replay {
                    events: Vec::new(),
                    tail: Tail::Clean,
                });
            }
            Err(e) => return Err(e),
        };
        let mut reader = BufReader::new(file);
        let mut events = Vec::new();
        loop {
            match read_record(&mut reader)? {
                Record::Event(event) => events.push(event),
                Record::End(tail) => return Ok(Replay { events, tail }),
            }
        }
    }
}
