use crate::config::*;
use crate::ftl::Ftl;

impl Ftl {
    /// Greedy victim: the mapped block with the most invalid pages, lowest
    /// index on ties. Blocks without garbage and free blocks never qualify.
    pub fn victim(&self) -> Option<PhysicalBlock> {
        self.select_victim(None)
    }

    fn select_victim(&self, keep: Option<PhysicalBlock>) -> Option<PhysicalBlock> {
        let mut victim = None;
        let mut max_invalid: Counter = 0;

        for block in self.flash.iter() {
            let id = block.block_id();
            if Some(id) == keep || self.map.logical(id).is_none() {
                continue;
            }
            if block.invalid_counter() > max_invalid {
                victim = Some(id);
                max_invalid = block.invalid_counter();
            }
        }

        victim
    }

    /// Runs one reclamation pass, returning the erased block if any.
    pub fn reclaim(&mut self) -> Option<PhysicalBlock> {
        self.reclaim_except(None)
    }

    pub(crate) fn reclaim_except(&mut self, keep: Option<PhysicalBlock>) -> Option<PhysicalBlock> {
        self.stats.reclaims += 1;

        let Some(victim) = self.select_victim(keep) else {
            warn!("GC found no victim block");
            return None;
        };

        debug!("GC victim P{} with {} invalid pages", victim, self.flash.block(victim).invalid_counter());
        if !self.erase_physical(victim) {
            return None;
        }

        self.stats.victims += 1;
        Some(victim)
    }

    /// Erase through the reverse map. A block with no logical partner is
    /// already free, so this is a no-op for it.
    fn erase_physical(&mut self, physical: PhysicalBlock) -> bool {
        match self.map.logical(physical) {
            Some(logical) => self.erase_logical(logical),
            None => {
                debug!("P{} is not bound, nothing to erase", physical);
                false
            }
        }
    }
}
