/// Read/write buffer pair.
///
/// `current()` is the read side, `next()` the write side. A stage writes
/// `next()` and the caller swaps once the stage is done, so no stage ever
/// reads and writes the same slot.
#[derive(Debug, Clone)]
pub struct PingPong<T> {
    slots: [T; 2],
    read: usize,
}

impl<T> PingPong<T> {
    pub fn new(first: T, second: T) -> Self {
        Self {
            slots: [first, second],
            read: 0,
        }
    }

    pub fn current(&self) -> &T {
        &self.slots[self.read]
    }

    pub fn next(&self) -> &T {
        &self.slots[1 - self.read]
    }

    pub fn swap(&mut self) {
        self.read = 1 - self.read;
    }

    pub fn read_index(&self) -> usize {
        self.read
    }

    pub fn write_index(&self) -> usize {
        1 - self.read
    }

    pub fn slots(&self) -> &[T; 2] {
        &self.slots
    }
}

/// Three-slot ring used for density.
///
/// Stages write `next()`; `advance()` moves the read index forward by one
/// modulo 3. The third slot gives diffusion room to iterate without
/// clobbering the pre-diffusion value.
#[derive(Debug, Clone)]
pub struct DensityRing<T> {
    slots: [T; 3],
    index: usize,
}

impl<T> DensityRing<T> {
    pub fn new(slots: [T; 3]) -> Self {
        Self { slots, index: 0 }
    }

    pub fn current(&self) -> &T {
        &self.slots[self.index]
    }

    pub fn next(&self) -> &T {
        self.slot(1)
    }

    /// Slot `offset` steps ahead of the read index
    pub fn slot(&self, offset: usize) -> &T {
        &self.slots[(self.index + offset) % 3]
    }

    pub fn advance(&mut self) {
        self.advance_by(1);
    }

    pub fn advance_by(&mut self, steps: usize) {
        self.index = (self.index + steps) % 3;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slots(&self) -> &[T; 3] {
        &self.slots
    }
}
