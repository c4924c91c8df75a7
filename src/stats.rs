use crate::config::Counter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Successful `write` calls.
    pub host_writes: Counter,
    /// Pages programmed on the medium, copy-forward included.
    pub page_programs: Counter,
    pub relocations: Counter,
    pub copied_pages: Counter,
    /// Reclamation passes, including ones that found no victim.
    pub reclaims: Counter,
    pub victims: Counter,
    pub erases: Counter,
}

impl Stats {
    pub fn write_amplification(&self) -> f64 {
        if self.host_writes == 0 {
            return 0.;
        }
        self.page_programs as f64 / self.host_writes as f64
    }
}
