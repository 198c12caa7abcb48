use super::cpu::Psw;
use super::process_control_block::{ProcessControlBlock, ProcessState, QueueClass};
use super::Pid;

use crate::error::{KernelError, KernelResult};

/// Fixed-capacity table of process control blocks indexed by PID.
/// Slots are never freed once busy, so a PID is never reused.
pub struct ProcessTable {
    pcbs: Vec<ProcessControlBlock>,
}

impl ProcessTable {
    pub fn new(capacity: usize) -> ProcessTable {
        ProcessTable { pcbs: vec![ProcessControlBlock::new(); capacity] }
    }

    /// Lowest free slot. The slot stays free until `initialize` is called.
    pub fn allocate_slot(&self) -> KernelResult<Pid> {
        self.pcbs.iter().position(|pcb| !pcb.busy).ok_or(KernelError::NoFreeEntry)
    }

    pub fn initialize(
        &mut self,
        pid: Pid,
        physical_base: usize,
        size: usize,
        priority: i32,
        descriptor_index: usize,
        queue_class: QueueClass,
    ) {
        let pcb = &mut self.pcbs[pid];

        pcb.busy = true;
        pcb.state = ProcessState::New;
        pcb.priority = priority;
        pcb.queue_class = queue_class;
        pcb.physical_base = physical_base;
        pcb.size = size;
        pcb.descriptor_index = descriptor_index;
        pcb.saved_accumulator = 0;
        pcb.wake_tick = 0;

        // Daemons run in protected mode on physical addresses; user
        // processes start at logical address 0 of their chunk.
        match queue_class {
            QueueClass::Daemon => {
                pcb.saved_pc = physical_base as u32;
                pcb.saved_psw = Psw::EXECUTION_MODE;
            }
            QueueClass::User => {
                pcb.saved_pc = 0;
                pcb.saved_psw = Psw::empty();
            }
        }
    }

    pub fn get(&self, pid: Pid) -> &ProcessControlBlock {
        &self.pcbs[pid]
    }

    pub fn get_mut(&mut self, pid: Pid) -> &mut ProcessControlBlock {
        &mut self.pcbs[pid]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pid, &ProcessControlBlock)> {
        self.pcbs.iter().enumerate()
    }

    pub fn number_of_free_entries(&self) -> usize {
        self.pcbs.iter().filter(|pcb| !pcb.busy).count()
    }
}
