//! Types for reading BSA archives
//!

use binrw::BinRead;
use bon::Builder;
use std::{
    collections::HashMap,
    fmt::{self, Debug},
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
    sync::Arc,
};
use tracing::{debug, instrument};

use crate::{
    error::{Error, RecordNotFoundError, Result},
    types::{BsaEntry, BsaHeader, BsaNameEntry, BsaNumberEntry, DirectoryType, HEADER_SIZE},
};

/// Fail with [`Error::InvalidFilename`] unless `path` ends with `.{extension}` (any case)
pub fn require_extension(path: &Path, extension: &str) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(e) if e.eq_ignore_ascii_case(extension) => Ok(()),
        _ => Err(Error::InvalidFilename(path.display().to_string())),
    }
}

/// Options for how the BSA file should be opened
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct BsaOptions {
    /// Open the backing file for writing so records can be replaced in place
    #[builder(default)]
    pub writable: bool,
}

/// A struct for streaming a single record out of a BSA file
pub struct BsaRecord<'a, R: Read + Seek> {
    data: &'a BsaEntry,
    reader: io::Take<&'a mut R>,
}

impl<R: Read + Seek> Debug for BsaRecord<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BsaRecord({:#?})", self.data)
    }
}

/// Methods for retrieving information on BSA records
impl<R: Read + Seek> BsaRecord<'_, R> {
    /// Get the name of the record
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Get the numeric id, if the archive is number keyed
    pub fn id(&self) -> Option<u32> {
        self.data.id
    }

    /// Get the size of the record, in bytes
    pub fn size(&self) -> u64 {
        self.data.size
    }

    /// Get the starting offset of the record data
    pub fn data_start(&self) -> u64 {
        self.data.offset
    }
}

impl<R: Read + Seek> Read for BsaRecord<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

#[derive(Debug)]
pub(crate) struct Shared {
    header: BsaHeader,
    directory_type: DirectoryType,
    entries: Vec<BsaEntry>,
    names: HashMap<Box<str>, usize>,
    ids: HashMap<u32, usize>,
}

/// BSA archive reader
///
/// ```no_run
/// use std::io::prelude::*;
///
/// fn list_bsa_contents(reader: impl Read + Seek) -> df_bsa::error::Result<()> {
///     let mut bsa = df_bsa::BsaArchive::new(reader)?;
///
///     for i in 0..bsa.len() {
///         let record = bsa.by_index(i)?;
///         println!("{}: {} bytes", record.name(), record.size());
///     }
///
///     Ok(())
/// }
/// ```
pub struct BsaArchive<R> {
    reader: R,
    shared: Arc<Shared>,
    writable: bool,
}

impl BsaArchive<File> {
    /// Open a `.BSA` file from disk.
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>, options: BsaOptions) -> Result<BsaArchive<File>> {
        let path = path.as_ref();
        require_extension(path, "BSA")?;

        let file = OpenOptions::new()
            .read(true)
            .write(options.writable)
            .open(path)?;

        let mut archive = BsaArchive::new(file)?;
        archive.writable = options.writable;
        Ok(archive)
    }
}

impl<R> BsaArchive<R> {
    /// Total size of the records in the archive.
    pub fn records_size(&self) -> u64 {
        self.shared.entries.iter().map(|e| e.size).sum()
    }
}

impl<R: Read + Seek> BsaArchive<R> {
    /// Read a BSA archive collecting the records it contains.
    #[instrument(skip_all, err)]
    pub fn new(mut reader: R) -> Result<BsaArchive<R>> {
        let shared = Self::get_metadata(&mut reader)?;
        debug!(
            records = shared.entries.len(),
            directory = ?shared.directory_type,
            "opened archive"
        );

        Ok(BsaArchive {
            reader,
            shared: shared.into(),
            writable: false,
        })
    }

    /// Number of records contained in this BSA.
    pub fn len(&self) -> usize {
        self.shared.entries.len()
    }

    /// Whether this BSA archive contains no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// How records are keyed in this archive
    pub fn directory_type(&self) -> DirectoryType {
        self.shared.directory_type
    }

    /// The raw header of the archive
    pub fn header(&self) -> BsaHeader {
        self.shared.header
    }

    /// All directory entries in directory order
    pub fn entries(&self) -> &[BsaEntry] {
        &self.shared.entries
    }

    /// Returns an iterator over all the record names in this archive.
    pub fn record_names(&self) -> impl Iterator<Item = &str> {
        self.shared.entries.iter().map(|e| e.name.as_ref())
    }

    /// Get the index of a record by name, ignoring case.
    pub fn index_for_name(&self, name: &str) -> Option<usize> {
        self.shared
            .names
            .get(name.to_ascii_uppercase().as_str())
            .copied()
    }

    /// Get the index of a record by numeric id.
    pub fn index_for_id(&self, id: u32) -> Option<usize> {
        self.shared.ids.get(&id).copied()
    }

    /// Get the name of a record, if it's present.
    pub fn name_for_index(&self, index: usize) -> Option<&str> {
        self.shared.entries.get(index).map(|e| e.name.as_ref())
    }

    fn entry(&self, index: usize) -> Result<&BsaEntry> {
        self.shared
            .entries
            .get(index)
            .ok_or(Error::RecordNotFound(RecordNotFoundError::Index(index)))
    }

    /// Name of the record at `index`
    pub fn record_name(&self, index: usize) -> Result<&str> {
        self.entry(index).map(|e| e.name.as_ref())
    }

    /// Numeric id of the record at `index`, `None` for name keyed archives
    pub fn record_id(&self, index: usize) -> Result<Option<u32>> {
        self.entry(index).map(|e| e.id)
    }

    /// Length in bytes of the record at `index`
    pub fn record_length(&self, index: usize) -> Result<u64> {
        self.entry(index).map(|e| e.size)
    }

    /// Absolute offset of the record at `index`
    pub fn record_offset(&self, index: usize) -> Result<u64> {
        self.entry(index).map(|e| e.offset)
    }

    /// Search for a record by name
    pub fn by_name(&mut self, name: &str) -> Result<BsaRecord<'_, R>> {
        let Some(index) = self.index_for_name(name) else {
            return Err(Error::RecordNotFound(RecordNotFoundError::Name(
                name.to_owned(),
            )));
        };
        self.by_index(index)
    }

    /// Get a contained record by index
    pub fn by_index(&mut self, index: usize) -> Result<BsaRecord<'_, R>> {
        let data = self
            .shared
            .entries
            .get(index)
            .ok_or(Error::RecordNotFound(RecordNotFoundError::Index(index)))?;

        self.reader.seek(SeekFrom::Start(data.offset))?;

        Ok(BsaRecord {
            data,
            reader: self.reader.by_ref().take(data.size),
        })
    }

    /// Read the full contents of the record at `index`
    #[instrument(skip(self), err)]
    pub fn record_bytes(&mut self, index: usize) -> Result<Vec<u8>> {
        let mut record = self.by_index(index)?;
        let needed = record.size() as usize;
        let mut buffer = Vec::with_capacity(needed);
        record.read_to_end(&mut buffer)?;

        if buffer.len() < needed {
            return Err(Error::UnexpectedEndOfData {
                position: record.data_start() as usize + buffer.len(),
                needed,
                available: buffer.len(),
            });
        }
        Ok(buffer)
    }

    /// Read the full contents of the record called `name`
    pub fn record_bytes_by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self
            .index_for_name(name)
            .ok_or_else(|| Error::RecordNotFound(RecordNotFoundError::Name(name.to_owned())))?;
        self.record_bytes(index)
    }

    /// Unwrap and return the inner reader object
    ///
    /// The position of the reader is undefined.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn get_metadata(reader: &mut R) -> Result<Shared> {
        let file_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let header = BsaHeader::read(reader)?;
        let directory_type = DirectoryType::try_from(header.directory_type)?;
        if header.records < 0 {
            return Err(Error::InvalidArchive);
        }

        let count = header.records as u64;
        let directory_start = file_len
            .checked_sub(count * directory_type.entry_size())
            .filter(|&start| start >= HEADER_SIZE)
            .ok_or(Error::InvalidArchive)?;
        reader.seek(SeekFrom::Start(directory_start))?;

        let mut entries = Vec::with_capacity(count as usize);
        let mut offset = HEADER_SIZE;
        for index in 0..count as usize {
            let (name, id, flags, size) = match directory_type {
                DirectoryType::NameRecord => {
                    let e = BsaNameEntry::read(reader)?;
                    (e.name(), None, e.flags, e.size)
                }
                DirectoryType::NumberRecord => {
                    let e = BsaNumberEntry::read(reader)?;
                    (e.id.to_string(), Some(e.id), 0, e.size)
                }
            };

            entries.push(BsaEntry {
                index,
                name: name.into(),
                id,
                flags,
                size: size as u64,
                offset,
            });
            offset += size as u64;
        }

        if offset > directory_start {
            return Err(Error::InvalidArchive);
        }

        let mut names = HashMap::with_capacity(entries.len());
        let mut ids = HashMap::new();
        for entry in &entries {
            names
                .entry(entry.name.to_ascii_uppercase().into_boxed_str())
                .or_insert(entry.index);
            if let Some(id) = entry.id {
                ids.entry(id).or_insert(entry.index);
            }
        }

        Ok(Shared {
            header,
            directory_type,
            entries,
            names,
            ids,
        })
    }
}

impl<R: Read + Write + Seek> BsaArchive<R> {
    /// Whether [`BsaArchive::rewrite_record`] is permitted
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Replace the contents of a record in place.
    ///
    /// The replacement must be exactly as long as the stored record; the directory is never touched.
    #[instrument(skip(self, bytes), fields(len = bytes.len()), err)]
    pub fn rewrite_record(&mut self, index: usize, bytes: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(Error::ReadOnly);
        }

        let entry = self.entry(index)?;
        if entry.size != bytes.len() as u64 {
            return Err(Error::LengthMismatch {
                index,
                expected: entry.size as usize,
                actual: bytes.len(),
            });
        }

        let offset = entry.offset;
        self.reader.seek(SeekFrom::Start(offset))?;
        self.reader.write_all(bytes)?;
        self.reader.flush()?;

        debug!(index, "rewrote record");
        Ok(())
    }
}
