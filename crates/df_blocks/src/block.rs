//! Decoded block records of any type
//!
//! [`decode_block`] picks the decoder from the record's [`BlockType`].

use df_bsa::RecordView;
use tracing::instrument;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::{
    error::Result,
    rdb::RdbBlock,
    rmb::RmbBlock,
    types::BlockType,
};

/// Size of an RDI payload
pub const RDI_SIZE: usize = 512;

/// Opaque RDI record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RdiBlock {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub data: Vec<u8>,
}

impl RdiBlock {
    pub fn decode(view: &mut RecordView, name: &str) -> Result<Self> {
        Ok(Self {
            name: name.to_owned(),
            data: view.read_bytes(RDI_SIZE)?.to_vec(),
        })
    }
}

/// A decoded block record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum Block {
    Exterior(RmbBlock),
    Dungeon(RdbBlock),
    Unknown(RdiBlock),
}

impl Block {
    pub fn name(&self) -> &str {
        match self {
            Block::Exterior(b) => &b.name,
            Block::Dungeon(b) => &b.name,
            Block::Unknown(b) => &b.name,
        }
    }

    pub fn block_type(&self) -> BlockType {
        match self {
            Block::Exterior(_) => BlockType::Rmb,
            Block::Dungeon(_) => BlockType::Rdb,
            Block::Unknown(_) => BlockType::Rdi,
        }
    }

    pub fn as_exterior(&self) -> Option<&RmbBlock> {
        match self {
            Block::Exterior(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_dungeon(&self) -> Option<&RdbBlock> {
        match self {
            Block::Dungeon(b) => Some(b),
            _ => None,
        }
    }
}

/// Decode a block record with the decoder its type selects
#[instrument(skip(view), fields(len = view.len()), err)]
pub fn decode_block(view: &mut RecordView, name: &str, block_type: BlockType) -> Result<Block> {
    Ok(match block_type {
        BlockType::Rmb => Block::Exterior(RmbBlock::decode(view, name)?),
        BlockType::Rdb => Block::Dungeon(RdbBlock::decode(view, name)?),
        BlockType::Rdi => Block::Unknown(RdiBlock::decode(view, name)?),
    })
}
