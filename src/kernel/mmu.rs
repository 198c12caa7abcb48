/// Base/limit address translation for user-mode processes.
pub struct Mmu {
    base: usize,
    limit: usize,
}

impl Mmu {
    pub fn new() -> Mmu {
        Mmu { base: 0, limit: 0 }
    }

    pub fn set_base(&mut self, base: usize) {
        self.base = base;
    }

    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
    }

    pub fn get_base(&self) -> usize {
        self.base
    }

    pub fn get_limit(&self) -> usize {
        self.limit
    }

    /// Translates a logical address, or `None` if it falls outside the limit.
    pub fn translate(&self, logical_address: usize) -> Option<usize> {
        if logical_address < self.limit {
            Some(self.base + logical_address)
        } else {
            None
        }
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Mmu::new()
    }
}
