use thiserror::Error;

use crate::config::{BaseType, LogicalBlock, PageId};

pub type Result<T> = std::result::Result<T, FtlError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FtlError {
    /// Every physical block is bound, even after one reclamation pass.
    #[error("no free physical block left after reclamation")]
    NoFreeBlock,
    #[error("logical block {0} is out of range ({1} blocks)")]
    LogicalOutOfRange(LogicalBlock, BaseType),
    #[error("page {0} is out of range ({1} pages per block)")]
    PageOutOfRange(PageId, BaseType),
    #[error("buffer of {0} bytes does not fit a {1} byte page")]
    BufferTooLarge(usize, BaseType),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),
    /// Returned by `Ftl::verify` when the map or the medium is in a state the
    /// engine never produces.
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}
