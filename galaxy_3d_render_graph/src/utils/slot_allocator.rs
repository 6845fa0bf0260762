/// Allocates and recycles `u32` slot indices, each carrying a generation.
///
/// A slot index is only meaningful together with the generation it was
/// handed out with: freeing or expiring a slot bumps its generation so any
/// `(index, generation)` pair captured earlier stops validating.
/// Freed indices are recycled LIFO.
///
/// # Example
///
/// ```ignore
/// let mut alloc = SlotAllocator::new();
/// let (a, gen_a) = alloc.alloc();  // (0, 0)
/// alloc.free(a);                   // generation of slot 0 becomes 1
/// let (b, gen_b) = alloc.alloc();  // (0, 1), recycled
/// assert!(!alloc.is_live(a, gen_a));
/// ```
pub struct SlotAllocator {
    free_list: Vec<u32>,
    /// Current generation of every index ever handed out
    generations: Vec<u32>,
    /// Whether the index is currently allocated
    live: Vec<bool>,
    len: u32,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self {
            free_list: Vec::new(),
            generations: Vec::new(),
            live: Vec::new(),
            len: 0,
        }
    }

    /// Allocate a slot, returning `(index, generation)`
    pub fn alloc(&mut self) -> (u32, u32) {
        self.len += 1;
        match self.free_list.pop() {
            Some(index) => {
                self.live[index as usize] = true;
                (index, self.generations[index as usize])
            }
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                self.live.push(true);
                (index, 0)
            }
        }
    }

    /// Return a slot to the pool. Its generation is bumped.
    pub fn free(&mut self, index: u32) {
        assert!(self.is_allocated(index), "freeing an unallocated slot: {}", index);
        self.bump(index);
        self.live[index as usize] = false;
        self.len -= 1;
        self.free_list.push(index);
    }

    /// Invalidate every handle to a slot while keeping it allocated.
    /// Returns the new generation.
    pub fn expire(&mut self, index: u32) -> u32 {
        assert!(self.is_allocated(index), "expiring an unallocated slot: {}", index);
        self.bump(index)
    }

    fn bump(&mut self, index: u32) -> u32 {
        let generation = &mut self.generations[index as usize];
        *generation = if *generation == u32::MAX { 0 } else { *generation + 1 };
        *generation
    }

    /// Current generation of an allocated slot
    pub fn generation(&self, index: u32) -> Option<u32> {
        if self.is_allocated(index) {
            Some(self.generations[index as usize])
        } else {
            None
        }
    }

    pub fn is_allocated(&self, index: u32) -> bool {
        self.live.get(index as usize).copied().unwrap_or(false)
    }

    /// True if `index` is allocated and still at `generation`
    pub fn is_live(&self, index: u32, generation: u32) -> bool {
        self.generation(index) == Some(generation)
    }

    /// Highest index ever allocated + 1.
    pub fn high_water_mark(&self) -> u32 {
        self.generations.len() as u32
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for SlotAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
