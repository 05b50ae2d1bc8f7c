//! Binary persistence for named vector indexes.
//!
//! Each index is a named directory under the databases root holding one
//! `vectors.bin`:
//!
//! Header (47 bytes):
//! - version: u8 (1)
//! - model identity: [u8; 32] (SHA256 of the embedder's model name)
//! - dimensions: u16 (little-endian)
//! - entry count: u64 (little-endian)
//! - checksum: u32 (CRC32 of the header bytes before it)
//!
//! Entries (repeated):
//! - id length: u16, id bytes (UTF-8)
//! - text length: u32, text bytes (UTF-8)
//! - metadata length: u32, metadata JSON bytes
//! - embedding: dimensions × f32 (little-endian)

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::records::SegmentMetadata;
use crate::store::index::{VectorEntry, VectorIndex};

const FORMAT_VERSION: u8 = 1;

/// version(1) + identity(32) + dimensions(2) + count(8) + checksum(4)
const HEADER_SIZE: usize = 47;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid index file: {0}")]
    InvalidFormat(String),

    #[error("Index version {0} unsupported (newest supported: {1})")]
    VersionMismatch(u8, u8),

    #[error("Index was built with a different embedding model")]
    ModelMismatch,

    #[error("Checksum mismatch: index file may be corrupted")]
    ChecksumMismatch,

    #[error("Dimension mismatch: expected {expected}, file has {got}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// Persistence for indexes under one databases root directory.
pub struct IndexPersistence {
    root: PathBuf,
}

struct Header {
    version: u8,
    identity: [u8; 32],
    dimensions: u16,
    entry_count: u64,
}

impl IndexPersistence {
    pub fn new(databases_root: PathBuf) -> Self {
        Self { root: databases_root }
    }

    /// Path of a named index's data file.
    pub fn index_file(&self, name: &str) -> PathBuf {
        self.root.join(name).join("vectors.bin")
    }

    pub fn exists(&self, name: &str) -> bool {
        self.index_file(name).exists()
    }

    /// Persist an index under `name`. Atomic: temp file, fsync, rename.
    pub fn save(
        &self,
        name: &str,
        index: &VectorIndex,
        identity: &[u8; 32],
    ) -> Result<(), PersistError> {
        let path = self.index_file(name);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let temp_path = path.with_extension("tmp");
        let result = write_index(&temp_path, index, identity);

        if result.is_err() {
            let _ = std::fs::remove_file(&temp_path);
            return result;
        }

        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }

    /// Load the index named `name`, validating model identity and
    /// dimensions against the embedder that will serve queries.
    pub fn load(
        &self,
        name: &str,
        identity: &[u8; 32],
        dimensions: usize,
    ) -> Result<VectorIndex, PersistError> {
        let file = File::open(self.index_file(name))?;
        let mut reader = BufReader::new(file);

        let header = read_header(&mut reader)?;
        if header.identity != *identity {
            return Err(PersistError::ModelMismatch);
        }
        if header.dimensions as usize != dimensions {
            return Err(PersistError::DimensionMismatch {
                expected: dimensions,
                got: header.dimensions as usize,
            });
        }

        let mut index =
            VectorIndex::with_capacity(header.dimensions as usize, header.entry_count as usize);
        for _ in 0..header.entry_count {
            let (id, entry) = read_entry(&mut reader, header.dimensions as usize)?;
            index
                .insert_new(id, entry)
                .map_err(|e| PersistError::InvalidFormat(e.to_string()))?;
        }

        Ok(index)
    }

    /// Remove a named index's directory.
    pub fn delete(&self, name: &str) -> Result<(), PersistError> {
        let dir = self.root.join(name);
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

fn write_index(path: &Path, index: &VectorIndex, identity: &[u8; 32]) -> Result<(), PersistError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_header(
        &mut writer,
        &Header {
            version: FORMAT_VERSION,
            identity: *identity,
            dimensions: index.dimensions() as u16,
            entry_count: index.len() as u64,
        },
    )?;

    for (id, entry) in index.iter() {
        write_entry(&mut writer, id, entry)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    file.sync_all()?;

    Ok(())
}

fn write_header(writer: &mut impl Write, header: &Header) -> Result<(), PersistError> {
    let mut bytes = [0u8; HEADER_SIZE];
    bytes[0] = header.version;
    bytes[1..33].copy_from_slice(&header.identity);
    bytes[33..35].copy_from_slice(&header.dimensions.to_le_bytes());
    bytes[35..43].copy_from_slice(&header.entry_count.to_le_bytes());

    let checksum = crc32fast::hash(&bytes[0..43]);
    bytes[43..47].copy_from_slice(&checksum.to_le_bytes());

    writer.write_all(&bytes)?;
    Ok(())
}

fn read_header(reader: &mut impl Read) -> Result<Header, PersistError> {
    let mut bytes = [0u8; HEADER_SIZE];
    reader.read_exact(&mut bytes)?;

    let version = bytes[0];
    if version > FORMAT_VERSION {
        return Err(PersistError::VersionMismatch(version, FORMAT_VERSION));
    }

    let stored_checksum = u32::from_le_bytes(bytes[43..47].try_into().expect("4 bytes"));
    if stored_checksum != crc32fast::hash(&bytes[0..43]) {
        return Err(PersistError::ChecksumMismatch);
    }

    let mut identity = [0u8; 32];
    identity.copy_from_slice(&bytes[1..33]);

    Ok(Header {
        version,
        identity,
        dimensions: u16::from_le_bytes(bytes[33..35].try_into().expect("2 bytes")),
        entry_count: u64::from_le_bytes(bytes[35..43].try_into().expect("8 bytes")),
    })
}

fn write_entry(writer: &mut impl Write, id: &str, entry: &VectorEntry) -> Result<(), PersistError> {
    let metadata = serde_json::to_vec(&entry.metadata)
        .map_err(|e| PersistError::InvalidFormat(e.to_string()))?;

    writer.write_all(&(id.len() as u16).to_le_bytes())?;
    writer.write_all(id.as_bytes())?;

    writer.write_all(&(entry.text.len() as u32).to_le_bytes())?;
    writer.write_all(entry.text.as_bytes())?;

    writer.write_all(&(metadata.len() as u32).to_le_bytes())?;
    writer.write_all(&metadata)?;

    for &value in &entry.embedding {
        writer.write_all(&value.to_le_bytes())?;
    }

    Ok(())
}

fn read_entry(
    reader: &mut impl Read,
    dimensions: usize,
) -> Result<(String, VectorEntry), PersistError> {
    let id = String::from_utf8(read_block_u16(reader)?)
        .map_err(|e| PersistError::InvalidFormat(format!("id is not UTF-8: {}", e)))?;

    let text = String::from_utf8(read_block_u32(reader)?)
        .map_err(|e| PersistError::InvalidFormat(format!("text is not UTF-8: {}", e)))?;

    let metadata: SegmentMetadata = serde_json::from_slice(&read_block_u32(reader)?)
        .map_err(|e| PersistError::InvalidFormat(format!("metadata: {}", e)))?;

    let mut embedding = Vec::with_capacity(dimensions);
    let mut float_bytes = [0u8; 4];
    for _ in 0..dimensions {
        reader.read_exact(&mut float_bytes)?;
        embedding.push(f32::from_le_bytes(float_bytes));
    }

    Ok((
        id,
        VectorEntry {
            embedding,
            text,
            metadata,
        },
    ))
}

fn read_block_u16(reader: &mut impl Read) -> Result<Vec<u8>, PersistError> {
    let mut len_bytes = [0u8; 2];
    reader.read_exact(&mut len_bytes)?;
    read_exact_vec(reader, u16::from_le_bytes(len_bytes) as usize)
}

fn read_block_u32(reader: &mut impl Read) -> Result<Vec<u8>, PersistError> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    read_exact_vec(reader, u32::from_le_bytes(len_bytes) as usize)
}

fn read_exact_vec(reader: &mut impl Read, len: usize) -> Result<Vec<u8>, PersistError> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}
