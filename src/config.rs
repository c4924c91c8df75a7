use byte_unit::Byte;

use crate::error::{FtlError, Result};

pub type BaseType = usize;

pub type BlockId = BaseType;
pub type LogicalBlock = BlockId;
pub type PhysicalBlock = BlockId;
pub type PageId = BaseType;
pub type Counter = BaseType;

pub const TOTAL_BLOCKS: BaseType = 256;
pub const PAGES_PER_BLOCK: BaseType = 16;

pub const PAGE_SIZE: BaseType = 4096;

pub const BLOCK_SIZE: BaseType = PAGES_PER_BLOCK * PAGE_SIZE;
pub const CAPACITY: usize = TOTAL_BLOCKS * BLOCK_SIZE;

/// Shape of the flash medium. The logical address space is `total_blocks`
/// wide unless overridden with `with_logical_blocks`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub page_size: BaseType,
    pub pages_per_block: BaseType,
    pub total_blocks: BaseType,
    pub logical_blocks: BaseType,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            page_size: PAGE_SIZE,
            pages_per_block: PAGES_PER_BLOCK,
            total_blocks: TOTAL_BLOCKS,
            logical_blocks: TOTAL_BLOCKS,
        }
    }
}

impl Geometry {
    pub fn new(page_size: BaseType, pages_per_block: BaseType, total_blocks: BaseType) -> Result<Self> {
        if page_size == 0 {
            return Err(FtlError::InvalidGeometry("page size must be non-zero"));
        }
        if pages_per_block == 0 {
            return Err(FtlError::InvalidGeometry("block must hold at least one page"));
        }
        if total_blocks == 0 {
            return Err(FtlError::InvalidGeometry("medium must hold at least one block"));
        }

        Ok(Geometry {
            page_size,
            pages_per_block,
            total_blocks,
            logical_blocks: total_blocks,
        })
    }

    /// Exposes a logical address space of a different size than the medium.
    pub fn with_logical_blocks(mut self, logical_blocks: BaseType) -> Result<Self> {
        if logical_blocks == 0 {
            return Err(FtlError::InvalidGeometry("logical space must hold at least one block"));
        }
        self.logical_blocks = logical_blocks;
        Ok(self)
    }

    pub fn block_size(&self) -> BaseType {
        self.pages_per_block * self.page_size
    }

    /// Physical capacity in bytes.
    pub fn capacity(&self) -> BaseType {
        self.total_blocks * self.block_size()
    }

    pub fn capacity_human(&self) -> String {
        Byte::from(self.capacity())
            .get_appropriate_unit(true)
            .to_string()
    }
}
