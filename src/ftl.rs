use crate::config::*;
use crate::error::{FtlError, Result};
use crate::flash::{Block, Flash};
use crate::map::AddressMap;
use crate::stats::Stats;

/// Block-mapped translation engine over an in-memory flash medium.
pub struct Ftl {
    pub(crate) geometry: Geometry,
    pub(crate) flash: Flash,
    pub(crate) map: AddressMap,
    pub(crate) stats: Stats,
}

impl Default for Ftl {
    fn default() -> Self {
        Ftl::new(Geometry::default())
    }
}

impl Ftl {
    pub fn new(geometry: Geometry) -> Self {
        trace!("Blocks: {}, pages per block: {}, page size: {}", geometry.total_blocks, geometry.pages_per_block, geometry.page_size);
        trace!("Logical blocks: {}", geometry.logical_blocks);
        trace!("Physical Capacity: {} bytes, {}", geometry.capacity(), geometry.capacity_human());

        Ftl {
            geometry,
            flash: Flash::new(&geometry),
            map: AddressMap::new(geometry.logical_blocks, geometry.total_blocks),
            stats: Stats::default(),
        }
    }

    /// Drops every binding and zeroes the medium.
    pub fn initialize(&mut self) {
        self.flash.reset();
        self.map.clear();
        self.stats = Stats::default();
        info!("FTL initialized: {} blocks unmapped", self.flash.len());
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn map(&self) -> &AddressMap {
        &self.map
    }

    pub fn block(&self, physical: PhysicalBlock) -> &Block {
        self.flash.block(physical)
    }

    pub fn get_max_lba(&self) -> LogicalBlock {
        self.geometry.logical_blocks - 1
    }

    pub fn free_blocks(&self) -> Counter {
        (0..self.flash.len()).filter(|&p| self.map.is_free(p)).count()
    }

    pub fn mapped_blocks(&self) -> Counter {
        self.map.mapped_count()
    }

    fn check_logical(&self, logical: LogicalBlock) -> Result<()> {
        if logical >= self.geometry.logical_blocks {
            return Err(FtlError::LogicalOutOfRange(logical, self.geometry.logical_blocks));
        }
        Ok(())
    }

    fn check_page(&self, page: PageId) -> Result<()> {
        if page >= self.geometry.pages_per_block {
            return Err(FtlError::PageOutOfRange(page, self.geometry.pages_per_block));
        }
        Ok(())
    }

    /// First-fit scan for a physical block nothing is bound to.
    pub fn allocate(&self) -> Result<PhysicalBlock> {
        (0..self.flash.len())
            .find(|&p| self.map.is_free(p))
            .ok_or(FtlError::NoFreeBlock)
    }

    /// Allocates, falling back to exactly one reclamation pass. `keep` is
    /// never chosen as the victim.
    fn allocate_or_reclaim(&mut self, keep: Option<PhysicalBlock>) -> Result<PhysicalBlock> {
        if let Ok(physical) = self.allocate() {
            return Ok(physical);
        }

        warn!("No free block, running garbage collection");
        self.reclaim_except(keep);
        self.allocate()
    }

    /// Returns `None` for an unmapped block or a page never written since
    /// the last erase.
    pub fn read(&self, logical: LogicalBlock, page: PageId) -> Result<Option<Vec<u8>>> {
        self.check_logical(logical)?;
        self.check_page(page)?;

        let Some(physical) = self.map.physical(logical) else {
            return Ok(None);
        };
        let block = self.flash.block(physical);
        if !block.is_valid(page) {
            return Ok(None);
        }

        Ok(Some(block.page(page).to_vec()))
    }

    pub fn write(&mut self, logical: LogicalBlock, page: PageId, buf: &[u8]) -> Result<()> {
        self.check_logical(logical)?;
        self.check_page(page)?;
        if buf.len() > self.geometry.page_size {
            return Err(FtlError::BufferTooLarge(buf.len(), self.geometry.page_size));
        }

        let physical = match self.map.physical(logical) {
            Some(physical) => physical,
            None => {
                let physical = self.allocate_or_reclaim(None)?;
                self.map.bind(logical, physical);
                physical
            }
        };

        if self.flash.block(physical).is_valid(page) {
            self.relocate(logical, physical, page, buf)?;
        } else {
            self.program(physical, page, buf);
        }

        self.stats.host_writes += 1;
        Ok(())
    }

    fn program(&mut self, physical: PhysicalBlock, page: PageId, buf: &[u8]) {
        trace!("Program P{} page {}", physical, page);
        self.flash.block_mut(physical).program(page, buf);
        self.stats.page_programs += 1;
    }

    /// Out-of-place update of a valid page: copy the rest of the block
    /// forward, release the old block, then rebind and program.
    fn relocate(&mut self, logical: LogicalBlock, old: PhysicalBlock, page: PageId, buf: &[u8]) -> Result<()> {
        let new = self.allocate_or_reclaim(Some(old))?;
        debug!("Relocate L{}: P{} -> P{}", logical, old, new);

        let copied = self.flash.copy_valid_pages(old, new, Some(page));
        self.stats.copied_pages += copied;
        self.stats.page_programs += copied;

        // old block is released while still bound to `logical`
        self.erase_logical(logical);
        self.map.bind(logical, new);
        self.program(new, page, buf);

        self.stats.relocations += 1;
        Ok(())
    }

    /// Erases the block bound to `logical`. Returns `false` if it was unmapped.
    pub fn erase(&mut self, logical: LogicalBlock) -> Result<bool> {
        self.check_logical(logical)?;
        Ok(self.erase_logical(logical))
    }

    pub(crate) fn erase_logical(&mut self, logical: LogicalBlock) -> bool {
        let Some(physical) = self.map.physical(logical) else {
            return false;
        };

        debug!("Erase P{} (L{})", physical, logical);
        self.flash.block_mut(physical).erase();
        self.map.unbind(logical);
        self.stats.erases += 1;
        true
    }

    /// Checks the map bijection and that mapped and free blocks hold the
    /// page state they should.
    pub fn verify(&self) -> Result<()> {
        if let Some(broken) = self.map.check_bijection() {
            return Err(FtlError::Inconsistent(broken));
        }

        for block in self.flash.iter() {
            let physical = block.block_id();
            match self.map.logical(physical) {
                Some(logical) if block.is_empty() => {
                    return Err(FtlError::Inconsistent(format!("P{} bound to L{} holds no valid page", physical, logical)));
                }
                None if !block.is_empty() => {
                    return Err(FtlError::Inconsistent(format!("free P{} holds {} valid pages", physical, block.valid_counter())));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn small() -> Ftl {
        Ftl::new(Geometry::new(16, 2, 4).unwrap())
    }

    #[test]
    fn write_then_read() {
        let mut fw = Ftl::default();
        fw.write(10, 5, b"Hello").unwrap();

        let page = fw.read(10, 5).unwrap().unwrap();
        assert_eq!(page.len(), PAGE_SIZE);
        assert_eq!(&page[..5], b"Hello");
        assert!(page[5..].iter().all(|&b| b == 0));
        fw.verify().unwrap();
    }

    #[test]
    fn read_of_absent_data_is_empty() {
        let mut fw = small();
        assert_eq!(fw.read(0, 0).unwrap(), None);

        fw.write(0, 0, b"a").unwrap();
        assert_eq!(fw.read(0, 1).unwrap(), None);
    }

    #[test]
    fn rejects_out_of_range() {
        let mut fw = small();
        assert_eq!(fw.write(4, 0, b"a"), Err(FtlError::LogicalOutOfRange(4, 4)));
        assert_eq!(fw.write(0, 2, b"a"), Err(FtlError::PageOutOfRange(2, 2)));
        assert_eq!(fw.write(0, 0, &[0; 17]), Err(FtlError::BufferTooLarge(17, 16)));
        assert_eq!(fw.read(7, 0), Err(FtlError::LogicalOutOfRange(7, 4)));
        assert_eq!(fw.erase(9), Err(FtlError::LogicalOutOfRange(9, 4)));
        assert_eq!(fw.mapped_blocks(), 0);
    }

    #[test]
    fn allocate_is_first_fit() {
        let mut fw = small();
        assert_eq!(fw.allocate(), Ok(0));

        fw.write(3, 0, b"a").unwrap();
        fw.write(1, 0, b"b").unwrap();
        assert_eq!(fw.map().physical(3), Some(0));
        assert_eq!(fw.map().physical(1), Some(1));

        fw.erase(3).unwrap();
        assert_eq!(fw.allocate(), Ok(0));
    }

    #[test]
    fn update_relocates_and_keeps_other_pages() {
        let mut fw = small();
        fw.write(0, 0, b"first").unwrap();
        fw.write(0, 1, b"second").unwrap();
        assert_eq!(fw.map().physical(0), Some(0));
        assert!(fw.block(0).full());

        fw.write(0, 0, b"updated").unwrap();

        assert_eq!(fw.map().physical(0), Some(1));
        assert_eq!(&fw.read(0, 0).unwrap().unwrap()[..7], b"updated");
        assert_eq!(&fw.read(0, 1).unwrap().unwrap()[..6], b"second");

        assert!(fw.block(0).is_empty());
        assert_eq!(fw.block(0).erase_counter(), 1);
        assert_eq!(fw.allocate(), Ok(0));

        let stats = fw.stats();
        assert_eq!(stats.relocations, 1);
        assert_eq!(stats.copied_pages, 1);
        assert_eq!(stats.page_programs, 4);
        assert_eq!(stats.host_writes, 3);
        fw.verify().unwrap();
    }

    #[test]
    fn erase_releases_block() {
        let mut fw = small();
        fw.write(2, 1, b"x").unwrap();

        assert_eq!(fw.erase(2), Ok(true));
        assert_eq!(fw.erase(2), Ok(false));
        assert_eq!(fw.read(2, 1).unwrap(), None);
        assert_eq!(fw.free_blocks(), 4);
        fw.verify().unwrap();
    }

    #[test]
    fn exhaustion_without_garbage_fails_cleanly() {
        let mut fw = small();
        for l in 0..4 {
            fw.write(l, 0, &[l as u8]).unwrap();
            fw.write(l, 1, &[l as u8 + 10]).unwrap();
        }
        assert_eq!(fw.free_blocks(), 0);

        // no logical slot is left, so the only way to need a block is an update
        assert_eq!(fw.write(2, 0, b"new"), Err(FtlError::NoFreeBlock));
        assert_eq!(fw.stats().reclaims, 1);

        for l in 0..4 {
            assert_eq!(fw.read(l, 0).unwrap().unwrap()[0], l as u8);
            assert_eq!(fw.read(l, 1).unwrap().unwrap()[0], l as u8 + 10);
        }
        assert_eq!(fw.map().physical(2), Some(2));
        fw.verify().unwrap();
    }

    #[test]
    fn relocation_never_reclaims_its_source() {
        let mut fw = small();
        fw.write(0, 0, b"only").unwrap();
        for l in 1..4 {
            fw.write(l, 0, b"a").unwrap();
            fw.write(l, 1, b"b").unwrap();
        }

        // P0 is the only block with garbage, and it is the one being relocated
        assert_eq!(fw.write(0, 0, b"again"), Err(FtlError::NoFreeBlock));
        assert_eq!(fw.stats().victims, 0);
        assert_eq!(&fw.read(0, 0).unwrap().unwrap()[..4], b"only");
        assert_eq!(fw.map().physical(0), Some(0));
        fw.verify().unwrap();
    }

    #[test]
    fn relocation_reclaims_another_block() {
        let mut fw = small();
        fw.write(0, 0, b"zero").unwrap();
        fw.write(0, 1, b"one").unwrap();
        for l in 1..4 {
            fw.write(l, 0, &[l as u8]).unwrap();
        }

        fw.write(0, 0, b"fresh").unwrap();

        // P1..P3 tie on one invalid page, P1 (L1) goes
        assert_eq!(fw.stats().victims, 1);
        assert_eq!(fw.map().physical(1), None);
        assert_eq!(fw.map().physical(0), Some(1));
        assert_eq!(&fw.read(0, 0).unwrap().unwrap()[..5], b"fresh");
        assert_eq!(&fw.read(0, 1).unwrap().unwrap()[..3], b"one");
        assert_eq!(fw.allocate(), Ok(0));
        fw.verify().unwrap();
    }

    #[test]
    fn fifth_logical_block_reclaims_garbage() {
        let mut fw = Ftl::new(Geometry::new(16, 2, 4).unwrap().with_logical_blocks(5).unwrap());
        for l in 0..4 {
            fw.write(l, 0, &[l as u8]).unwrap();
        }

        fw.write(4, 0, b"four").unwrap();

        assert_eq!(fw.stats().reclaims, 1);
        assert_eq!(fw.map().physical(4), Some(0));
        assert_eq!(fw.read(0, 0).unwrap(), None);
        assert_eq!(&fw.read(4, 0).unwrap().unwrap()[..4], b"four");
        assert_eq!(fw.read(3, 0).unwrap().unwrap()[0], 3);
        fw.verify().unwrap();
    }

    #[test]
    fn fifth_logical_block_without_garbage_fails() {
        let mut fw = Ftl::new(Geometry::new(16, 2, 4).unwrap().with_logical_blocks(5).unwrap());
        for l in 0..4 {
            fw.write(l, 0, &[l as u8]).unwrap();
            fw.write(l, 1, &[l as u8]).unwrap();
        }

        assert_eq!(fw.write(4, 0, b"four"), Err(FtlError::NoFreeBlock));
        assert_eq!(fw.stats().reclaims, 1);
        assert_eq!(fw.stats().victims, 0);
        assert_eq!(fw.map().physical(4), None);
        for l in 0..4 {
            assert_eq!(fw.read(l, 1).unwrap().unwrap()[0], l as u8);
        }
        fw.verify().unwrap();
    }

    #[test]
    fn initialize_resets_everything() {
        let mut fw = small();
        fw.write(0, 0, b"a").unwrap();
        fw.write(0, 0, b"b").unwrap();

        fw.initialize();
        assert_eq!(fw.read(0, 0).unwrap(), None);
        assert_eq!(fw.free_blocks(), 4);
        assert_eq!(*fw.stats(), Stats::default());
        assert!(fw.flash.iter().all(|b| b.erase_counter() == 0));
    }
}
