//! Reading decoded blocks out of BLOCKS.BSA
//!

use std::{
    fs::File,
    io::{Read, Seek},
    path::Path,
};

use df_bsa::{
    error::{Error as BsaError, RecordNotFoundError},
    BsaArchive, BsaOptions, CacheOptions, RecordCache, RecordView,
};
use tracing::{debug, instrument};

use crate::{
    block::{decode_block, Block},
    error::Result,
    types::BlockType,
};

/// Lazily decoding view of a block archive
///
/// ```no_run
/// use df_blocks::BlocksArchive;
///
/// fn print_ground(path: &str) -> df_blocks::error::Result<()> {
///     let mut blocks = BlocksArchive::open(path)?;
///
///     if let Some(rmb) = blocks.load_block("TVRNAL01.RMB")?.as_exterior() {
///         println!("{:?}", rmb.ground.tile(0, 0));
///     }
///
///     Ok(())
/// }
/// ```
pub struct BlocksArchive<R> {
    bsa: BsaArchive<R>,
    cache: RecordCache<usize, Block>,
}

impl BlocksArchive<File> {
    /// Open a block archive from disk with auto discard enabled
    #[instrument(skip_all, fields(path = %path.as_ref().display()), err)]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bsa = BsaArchive::open(path, BsaOptions::default())?;
        Ok(Self::from_archive(bsa, CacheOptions::default()))
    }
}

impl<R: Read + Seek> BlocksArchive<R> {
    pub fn new(reader: R, options: CacheOptions) -> Result<Self> {
        Ok(Self::from_archive(BsaArchive::new(reader)?, options))
    }

    pub fn from_archive(bsa: BsaArchive<R>, options: CacheOptions) -> Self {
        Self {
            bsa,
            cache: RecordCache::new(options),
        }
    }

    /// Number of block records
    pub fn len(&self) -> usize {
        self.bsa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bsa.is_empty()
    }

    /// The underlying container
    pub fn archive(&self) -> &BsaArchive<R> {
        &self.bsa
    }

    pub fn block_name(&self, index: usize) -> Result<&str> {
        Ok(self.bsa.record_name(index)?)
    }

    /// Index of a block by record name, ignoring case
    pub fn block_index(&self, name: &str) -> Option<usize> {
        self.bsa.index_for_name(name)
    }

    pub fn block_type(&self, index: usize) -> Result<BlockType> {
        BlockType::from_name(self.block_name(index)?)
    }

    /// Names of every block of one type
    pub fn block_names(&self, block_type: BlockType) -> impl Iterator<Item = &str> {
        self.bsa
            .record_names()
            .filter(move |name| BlockType::from_name(name).ok() == Some(block_type))
    }

    /// Decode a block by record name, or return it from the cache
    pub fn load_block(&mut self, name: &str) -> Result<&Block> {
        let index = self
            .block_index(name)
            .ok_or_else(|| BsaError::RecordNotFound(RecordNotFoundError::Name(name.to_owned())))?;
        self.load_block_by_index(index)
    }

    /// Decode a block by index, or return it from the cache
    pub fn load_block_by_index(&mut self, index: usize) -> Result<&Block> {
        let bsa = &mut self.bsa;
        self.cache.get_or_load(index, |&index| -> Result<Block> {
            let name = bsa.record_name(index)?.to_owned();
            let block_type = BlockType::from_name(&name)?;
            let bytes = bsa.record_bytes(index)?;

            debug!(index, %name, %block_type, "decoding block");
            decode_block(&mut RecordView::new(&bytes), &name, block_type)
        })
    }

    pub fn is_loaded(&self, index: usize) -> bool {
        self.cache.contains(&index)
    }

    /// Drop a decoded block, returning whether it was resident
    pub fn discard_block(&mut self, index: usize) -> bool {
        self.cache.discard(&index).is_some()
    }

    pub fn discard_all_blocks(&mut self) {
        self.cache.discard_all();
    }

    pub fn auto_discard(&self) -> bool {
        self.cache.auto_discard()
    }

    pub fn set_auto_discard(&mut self, auto_discard: bool) {
        self.cache.set_auto_discard(auto_discard);
    }

    pub fn into_inner(self) -> BsaArchive<R> {
        self.bsa
    }
}
