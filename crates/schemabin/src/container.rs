// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Self-contained container file (.schb)
//!
//! # Format Overview
//!
//! ```text
//! +---------------------------------------------------------+
//! |                    File Header (32 bytes)                |
//! |  Magic (8) | Version (4) | Flags (4) | RecordCount (8)  |
//! |  SchemaTableOffset (8)                                   |
//! +---------------------------------------------------------+
//! |                    Records                               |
//! |  index (4) | size (4) | block ...                        |
//! +---------------------------------------------------------+
//! |                    Schema Table                          |
//! |  count (4) | per schema: field count (2) + fields        |
//! +---------------------------------------------------------+
//! ```
//!
//! The header is written as a placeholder on create and rewritten by
//! [`ContainerWriter::finalize`]. A file whose table offset is still zero
//! was never finalized.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::any::Any;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;

use crate::binding::Schematic;
use crate::config::CodecConfig;
use crate::error::WireError;
use crate::reader::SchemaReader;
use crate::registry::{SchemaRegistryReader, SchemaRegistryWriter};
use crate::schema::{SchemaId, SchemaSet};
use crate::value::Value;
use crate::writer::SchemaWriter;

/// Magic bytes: "SCHMBIN\0"
pub const MAGIC: [u8; 8] = *b"SCHMBIN\0";

/// Current container version.
pub const FORMAT_VERSION: u32 = 1;

/// File header (32 bytes, fixed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic bytes (8).
    pub magic: [u8; 8],
    /// Format version (4).
    pub version: u32,
    /// Flags (4) - reserved.
    pub flags: u32,
    /// Records in the file (8).
    pub record_count: u64,
    /// Schema table offset (8).
    pub schema_table_offset: u64,
}

impl FileHeader {
    pub const SIZE: usize = 32;

    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            record_count: 0,
            schema_table_offset: 0,
        }
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.magic)?;
        w.write_u32::<LittleEndian>(self.version)?;
        w.write_u32::<LittleEndian>(self.flags)?;
        w.write_u64::<LittleEndian>(self.record_count)?;
        w.write_u64::<LittleEndian>(self.schema_table_offset)?;
        Ok(())
    }

    pub fn read<R: Read>(r: &mut R) -> Result<Self, ContainerError> {
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)?;

        if magic != MAGIC {
            return Err(ContainerError::InvalidMagic(magic));
        }

        Ok(Self {
            magic,
            version: r.read_u32::<LittleEndian>()?,
            flags: r.read_u32::<LittleEndian>()?,
            record_count: r.read_u64::<LittleEndian>()?,
            schema_table_offset: r.read_u64::<LittleEndian>()?,
        })
    }
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Container errors.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid container magic {0:02x?}")]
    InvalidMagic([u8; 8]),

    #[error("Version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },

    #[error("Container was not finalized")]
    NotFinalized,

    #[error("Container writer is unusable after a failed rollback")]
    Poisoned,

    #[error(transparent)]
    Wire(#[from] WireError),
}

/// Container file writer.
pub struct ContainerWriter {
    writer: BufWriter<File>,
    header: FileHeader,
    schemas: SchemaSet,
    registry: SchemaRegistryWriter,
    poisoned: bool,
}

impl ContainerWriter {
    /// Create a container at `path`, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P, schemas: SchemaSet) -> Result<Self, ContainerError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // Placeholder header (rewritten on finalize)
        let header = FileHeader::new();
        header.write(&mut writer)?;

        Ok(Self {
            writer,
            header,
            schemas,
            registry: SchemaRegistryWriter::new(),
            poisoned: false,
        })
    }

    /// Append a typed record. A failed append leaves the file as it was.
    pub fn append<T: Schematic>(
        &mut self,
        value: &T,
        context: &mut dyn Any,
    ) -> Result<(), ContainerError> {
        self.write_one(|writer| writer.write_from(value, context))
    }

    /// Append a dynamic record of schema `id`. A failed append leaves the
    /// file as it was.
    pub fn append_value(
        &mut self,
        id: SchemaId,
        value: &Value,
        context: &mut dyn Any,
    ) -> Result<(), ContainerError> {
        self.write_one(|writer| writer.write_record(id, value, context))
    }

    fn write_one<F>(&mut self, write: F) -> Result<(), ContainerError>
    where
        F: FnOnce(&mut SchemaWriter<'_>) -> Result<(), WireError>,
    {
        if self.poisoned {
            return Err(ContainerError::Poisoned);
        }

        let start = self.writer.stream_position()?;
        let result = {
            let mut writer =
                SchemaWriter::new(&mut self.writer, &self.schemas, &mut self.registry);
            write(&mut writer)
        };

        match result {
            Ok(()) => {
                self.header.record_count += 1;
                Ok(())
            }
            Err(err) => {
                if let Err(io_err) = self.discard_from(start) {
                    log::error!("[container] rollback to {} failed: {}", start, io_err);
                    self.poisoned = true;
                    return Err(io_err.into());
                }
                log::warn!("[container] append failed, record discarded: {}", err);
                Err(err.into())
            }
        }
    }

    /// Drop everything written at or after `start`.
    fn discard_from(&mut self, start: u64) -> io::Result<()> {
        // Seeking flushes the buffer before the file is cut.
        self.writer.seek(SeekFrom::Start(start))?;
        self.writer.get_ref().set_len(start)
    }

    pub fn record_count(&self) -> u64 {
        self.header.record_count
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// Write the schema table, then the final header.
    pub fn finalize(mut self) -> Result<FileHeader, ContainerError> {
        if self.poisoned {
            return Err(ContainerError::Poisoned);
        }
        let table_offset = self.writer.stream_position()?;
        let table_size = self.registry.finalize(&mut self.writer)?;

        self.header.schema_table_offset = table_offset;
        self.writer.seek(SeekFrom::Start(0))?;
        self.header.write(&mut self.writer)?;
        self.writer.flush()?;

        log::debug!(
            "[container] finalized {} records, schema table {} bytes at {}",
            self.header.record_count,
            table_size,
            table_offset
        );
        Ok(self.header)
    }
}

/// Container file reader.
pub struct ContainerReader {
    reader: BufReader<File>,
    header: FileHeader,
    schemas: SchemaSet,
    registry: SchemaRegistryReader,
    config: CodecConfig,
    remaining: u64,
}

impl ContainerReader {
    /// Open a finalized container. `schemas` holds the reader-side types;
    /// it may be empty when only [`next_dynamic`](Self::next_dynamic) is used.
    pub fn open<P: AsRef<Path>>(path: P, schemas: SchemaSet) -> Result<Self, ContainerError> {
        Self::open_with_config(path, schemas, CodecConfig::default())
    }

    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        schemas: SchemaSet,
        config: CodecConfig,
    ) -> Result<Self, ContainerError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let header = FileHeader::read(&mut reader)?;
        if header.version != FORMAT_VERSION {
            return Err(ContainerError::VersionMismatch {
                expected: FORMAT_VERSION,
                got: header.version,
            });
        }
        if header.schema_table_offset == 0 {
            return Err(ContainerError::NotFinalized);
        }

        reader.seek(SeekFrom::Start(header.schema_table_offset))?;
        let registry = SchemaRegistryReader::read_from(&mut reader, &config)?;
        reader.seek(SeekFrom::Start(FileHeader::SIZE as u64))?;

        Ok(Self {
            reader,
            remaining: header.record_count,
            header,
            schemas,
            registry,
            config,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn registry(&self) -> &SchemaRegistryReader {
        &self.registry
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Read the next record into `target`. Returns `false` at the end.
    pub fn next_into<T: Schematic>(
        &mut self,
        target: &mut T,
        context: &mut dyn Any,
    ) -> Result<bool, ContainerError> {
        if self.remaining == 0 {
            return Ok(false);
        }
        self.session().read_into(target, context)?;
        self.remaining -= 1;
        Ok(true)
    }

    /// Read the next record against reader schema `id`.
    pub fn next_value(
        &mut self,
        id: SchemaId,
        context: &mut dyn Any,
    ) -> Result<Option<Value>, ContainerError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let value = self.session().read_record(id, context)?;
        self.remaining -= 1;
        Ok(Some(value))
    }

    /// Read the next record from the schema table alone.
    pub fn next_dynamic(&mut self) -> Result<Option<Value>, ContainerError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let value = self.session().read_dynamic()?;
        self.remaining -= 1;
        Ok(Some(value))
    }

    fn session(&mut self) -> SchemaReader<'_> {
        SchemaReader::with_config(
            &mut self.reader,
            &self.schemas,
            &mut self.registry,
            self.config.clone(),
        )
    }
}
