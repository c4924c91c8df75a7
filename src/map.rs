use crate::config::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)] // for Vec resize
pub enum MapEntry {
    Unmapped,
    Mapped(BlockId),
}

impl MapEntry {
    pub fn mapped(self) -> Option<BlockId> {
        match self {
            MapEntry::Unmapped => None,
            MapEntry::Mapped(id) => Some(id),
        }
    }
}

/// Logical <-> physical block table. Both directions are kept as mutual
/// inverses; callers unbind before erasing and bind after allocating.
#[derive(Clone, Debug)]
pub struct AddressMap {
    l2p: Vec<MapEntry>,
    p2l: Vec<MapEntry>,
}

impl AddressMap {
    pub fn new(logical_blocks: BaseType, physical_blocks: BaseType) -> Self {
        AddressMap {
            l2p: vec![MapEntry::Unmapped; logical_blocks],
            p2l: vec![MapEntry::Unmapped; physical_blocks],
        }
    }

    pub fn logical_blocks(&self) -> BaseType {
        self.l2p.len()
    }

    pub fn physical_blocks(&self) -> BaseType {
        self.p2l.len()
    }

    pub fn physical(&self, logical: LogicalBlock) -> Option<PhysicalBlock> {
        self.l2p[logical].mapped()
    }

    pub fn logical(&self, physical: PhysicalBlock) -> Option<LogicalBlock> {
        self.p2l[physical].mapped()
    }

    /// Free iff nothing points at `physical` from either side.
    pub fn is_free(&self, physical: PhysicalBlock) -> bool {
        self.p2l[physical] == MapEntry::Unmapped
            && self.l2p.iter().all(|e| e.mapped() != Some(physical))
    }

    /// Binds `logical` to `physical`, dropping whatever either side was bound
    /// to before.
    pub fn bind(&mut self, logical: LogicalBlock, physical: PhysicalBlock) {
        if let Some(old) = self.physical(logical) {
            self.p2l[old] = MapEntry::Unmapped;
        }
        if let Some(old) = self.logical(physical) {
            self.l2p[old] = MapEntry::Unmapped;
        }

        debug!("Bind L{} -> P{}", logical, physical);
        self.l2p[logical] = MapEntry::Mapped(physical);
        self.p2l[physical] = MapEntry::Mapped(logical);
    }

    /// Clears both directions for `logical`, returning its former partner.
    pub fn unbind(&mut self, logical: LogicalBlock) -> Option<PhysicalBlock> {
        let physical = self.physical(logical)?;

        debug!("Unbind L{} -/> P{}", logical, physical);
        self.l2p[logical] = MapEntry::Unmapped;
        self.p2l[physical] = MapEntry::Unmapped;

        Some(physical)
    }

    pub fn mapped(&self) -> impl Iterator<Item = (LogicalBlock, PhysicalBlock)> + '_ {
        self.l2p
            .iter()
            .enumerate()
            .filter_map(|(l, e)| e.mapped().map(|p| (l, p)))
    }

    pub fn mapped_count(&self) -> Counter {
        self.mapped().count()
    }

    pub fn clear(&mut self) {
        self.l2p.fill(MapEntry::Unmapped);
        self.p2l.fill(MapEntry::Unmapped);
    }

    /// First broken pairing, if any.
    pub fn check_bijection(&self) -> Option<String> {
        for (l, e) in self.l2p.iter().enumerate() {
            if let Some(p) = e.mapped() {
                if self.logical(p) != Some(l) {
                    return Some(format!("L{} -> P{} but P{} -> {:?}", l, p, p, self.p2l[p]));
                }
            }
        }
        for (p, e) in self.p2l.iter().enumerate() {
            if let Some(l) = e.mapped() {
                if self.physical(l) != Some(p) {
                    return Some(format!("P{} -> L{} but L{} -> {:?}", p, l, l, self.l2p[l]));
                }
            }
        }
        None
    }
}
