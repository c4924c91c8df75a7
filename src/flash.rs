use crate::config::*;

/// One erase unit: `pages_per_block` pages stored back to back, plus a
/// validity flag per page.
#[derive(Clone, Debug)]
pub struct Block {
    block_id: PhysicalBlock,
    page_size: BaseType,
    data: Vec<u8>,
    valid: Vec<bool>,
    valid_counter: Counter,
    erase_counter: Counter,
}

impl Block {
    pub fn new(block_id: PhysicalBlock, geometry: &Geometry) -> Self {
        Block {
            block_id,
            page_size: geometry.page_size,
            data: vec![0; geometry.block_size()],
            valid: vec![false; geometry.pages_per_block],
            valid_counter: 0,
            erase_counter: 0,
        }
    }

    pub fn block_id(&self) -> PhysicalBlock {
        self.block_id
    }

    pub fn pages(&self) -> BaseType {
        self.valid.len()
    }

    pub fn is_valid(&self, page: PageId) -> bool {
        self.valid[page]
    }

    pub fn valid_counter(&self) -> Counter {
        self.valid_counter
    }

    pub fn invalid_counter(&self) -> Counter {
        self.pages() - self.valid_counter
    }

    pub fn erase_counter(&self) -> Counter {
        self.erase_counter
    }

    pub fn full(&self) -> bool {
        self.valid_counter == self.pages()
    }

    pub fn is_empty(&self) -> bool {
        self.valid_counter == 0
    }

    pub fn page(&self, page: PageId) -> &[u8] {
        let start = page * self.page_size;
        &self.data[start..start + self.page_size]
    }

    fn page_mut(&mut self, page: PageId) -> &mut [u8] {
        let start = page * self.page_size;
        &mut self.data[start..start + self.page_size]
    }

    /// Programs an erased page. `buf` shorter than a page is zero-padded.
    pub fn program(&mut self, page: PageId, buf: &[u8]) {
        debug_assert!(!self.valid[page], "page {} of block {} programmed twice", page, self.block_id);
        debug_assert!(buf.len() <= self.page_size, "buffer larger than a page");

        let target = self.page_mut(page);
        target[..buf.len()].copy_from_slice(buf);
        target[buf.len()..].fill(0);

        self.valid[page] = true;
        self.valid_counter += 1;
    }

    pub fn erase(&mut self) {
        self.data.fill(0);
        self.valid.fill(false);
        self.valid_counter = 0;
        self.erase_counter += 1;
    }

    /// Full reset used by `Ftl::initialize`, wear history included.
    fn reset(&mut self) {
        self.erase();
        self.erase_counter = 0;
    }
}

/// The whole medium. Allocated once, never resized.
#[derive(Clone, Debug)]
pub struct Flash {
    blocks: Vec<Block>,
}

impl Flash {
    pub fn new(geometry: &Geometry) -> Self {
        Flash {
            blocks: (0..geometry.total_blocks)
                .map(|x| Block::new(x, geometry))
                .collect(),
        }
    }

    pub fn len(&self) -> BaseType {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, block: PhysicalBlock) -> &Block {
        &self.blocks[block]
    }

    pub fn block_mut(&mut self, block: PhysicalBlock) -> &mut Block {
        &mut self.blocks[block]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn reset(&mut self) {
        self.blocks.iter_mut().for_each(Block::reset);
    }

    /// Copies every valid page of `from` into the same offset of `to`,
    /// leaving `skip` behind. Returns the number of pages copied.
    pub fn copy_valid_pages(&mut self, from: PhysicalBlock, to: PhysicalBlock, skip: Option<PageId>) -> Counter {
        debug_assert_ne!(from, to, "copy onto itself");

        let (src, dst) = if from < to {
            let (head, tail) = self.blocks.split_at_mut(to);
            (&head[from], &mut tail[0])
        } else {
            let (head, tail) = self.blocks.split_at_mut(from);
            (&tail[0], &mut head[to])
        };

        let mut copied = 0;
        for page in (0..src.pages()).filter(|&p| src.is_valid(p) && Some(p) != skip) {
            trace!("Copy block {} page {} -> block {}", from, page, to);
            dst.program(page, src.page(page));
            copied += 1;
        }

        copied
    }
}
