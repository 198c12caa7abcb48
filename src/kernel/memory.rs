use crate::error::{KernelError, KernelResult};

use super::Pid;

/// Main memory, split into one equally sized chunk per process table slot.
/// A process always owns the chunk whose position equals its PID.
pub struct MainMemory {
    data: Vec<u32>,
    chunk_size: usize,
}

impl MainMemory {
    pub fn new(number_of_chunks: usize, chunk_size: usize) -> MainMemory {
        MainMemory {
            data: vec![0; number_of_chunks * chunk_size],
            chunk_size,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the physical base of `pid`'s chunk.
    pub fn obtain_main_memory(&self, process_size: usize, pid: Pid) -> KernelResult<usize> {
        if process_size > self.chunk_size {
            return Err(KernelError::TooBigProcess);
        }

        Ok(pid * self.chunk_size)
    }

    /// Reads one word. Panics if `address` is outside main memory.
    pub fn read_from(&self, address: usize) -> u32 {
        match self.data.get(address) {
            Some(&word) => word,
            None => panic!("memory read at {} past end of main memory ({} words)", address, self.data.len()),
        }
    }

    pub fn read_block_from(&self, start_address: usize, end_address: usize) -> Vec<u32> {
        if start_address > end_address {
            panic!("invalid memory range {}..{}", start_address, end_address);
        }
        match self.data.get(start_address..end_address) {
            Some(block) => block.to_vec(),
            None => panic!("memory read {}..{} past end of main memory", start_address, end_address),
        }
    }

    pub fn write_to(&mut self, address: usize, value: u32) {
        let size = self.data.len();
        match self.data.get_mut(address) {
            Some(word) => *word = value,
            None => panic!("memory write at {} past end of main memory ({} words)", address, size),
        }
    }

    /// Copies `block` into memory starting at `address`.
    pub fn write_block_to(&mut self, address: usize, block: &[u32]) {
        let end_address = address + block.len();
        match self.data.get_mut(address..end_address) {
            Some(target) => target.copy_from_slice(block),
            None => panic!("memory write {}..{} past end of main memory", address, end_address),
        }
    }
}
