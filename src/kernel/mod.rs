mod context;
pub mod cpu;
pub(crate) mod diagnostics;
pub mod driver;
mod interrupts;
mod long_term_scheduler;
pub mod memory;
pub mod mmu;
pub mod priority_queue;
pub mod process_control_block;
pub mod process_table;
mod queues;
mod short_term_scheduler;
mod termination;

use cpu::Cpu;
use memory::MainMemory;
use mmu::Mmu;
use priority_queue::{PriorityQueue, QueueOrder};
use process_control_block::{ProcessControlBlock, ProcessState, QueueClass};
use process_table::ProcessTable;

use crate::config::SimulatorConfig;
use crate::io::ProgramDescriptor;

pub use driver::{Driver, ProcessSummary, RunSummary};
pub use interrupts::SystemCall;
pub use long_term_scheduler::prepare_program_list;

/// Process identifier: index into the process table.
pub type Pid = usize;

/// The simulated hardware the kernel controls.
pub struct Machine {
    pub cpu: Cpu,
    pub mmu: Mmu,
    pub memory: MainMemory,
}

impl Machine {
    pub fn new(number_of_chunks: usize, chunk_size: usize) -> Machine {
        Machine {
            cpu: Cpu::new(),
            mmu: Mmu::new(),
            memory: MainMemory::new(number_of_chunks, chunk_size),
        }
    }

    pub fn execute_instruction_cycle(&mut self) {
        self.cpu.execute_instruction_cycle(&self.memory, &self.mmu);
    }
}

/// Owner of every piece of kernel state. All scheduling, queue and
/// interrupt operations go through one `Kernel` value.
pub struct Kernel {
    process_table: ProcessTable,
    ready_queues: [PriorityQueue; 2],
    sleeping_queue: PriorityQueue,
    programs: Vec<ProgramDescriptor>,
    machine: Machine,
    executing: Option<Pid>,
    idle_pid: Option<Pid>,
    idle_program_name: String,
    live_user_processes: usize,
    clock_ticks: u64,
    shutdown_requested: bool,
    halted: bool,
}

impl Kernel {
    pub fn new(config: &SimulatorConfig) -> Kernel {
        let table_size = config.process_table_size;

        Kernel {
            process_table: ProcessTable::new(table_size),
            ready_queues: [
                PriorityQueue::new(QueueOrder::MaxFirst, table_size),
                PriorityQueue::new(QueueOrder::MaxFirst, table_size),
            ],
            sleeping_queue: PriorityQueue::new(QueueOrder::MinFirst, table_size),
            programs: Vec::new(),
            machine: Machine::new(table_size, config.chunk_size),
            executing: None,
            idle_pid: None,
            idle_program_name: config.idle_program_name.clone(),
            live_user_processes: 0,
            clock_ticks: 0,
            shutdown_requested: false,
            halted: false,
        }
    }

    pub fn get_pcb(&self, pid: Pid) -> &ProcessControlBlock {
        self.process_table.get(pid)
    }

    pub fn get_process_table(&self) -> &ProcessTable {
        &self.process_table
    }

    pub fn get_executing(&self) -> Option<Pid> {
        self.executing
    }

    pub fn get_idle_pid(&self) -> Option<Pid> {
        self.idle_pid
    }

    pub fn get_clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    pub fn get_live_user_processes(&self) -> usize {
        self.live_user_processes
    }

    pub fn get_programs(&self) -> &[ProgramDescriptor] {
        &self.programs
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    pub fn ready_queue(&self, queue_class: QueueClass) -> &PriorityQueue {
        &self.ready_queues[queue_class.index()]
    }

    pub fn sleeping_queue(&self) -> &PriorityQueue {
        &self.sleeping_queue
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// Name of the program `pid` was created from.
    pub fn program_name(&self, pid: Pid) -> &str {
        let descriptor_index = self.process_table.get(pid).descriptor_index;
        self.programs
            .get(descriptor_index)
            .map(|descriptor| descriptor.name.as_str())
            .unwrap_or("?")
    }

    /// Checks the table/queue consistency rules and returns the first
    /// violation found.
    pub fn verify_invariants(&self) -> Result<(), String> {
        let chunk_size = self.machine.memory.get_chunk_size();
        let mut executing_count = 0;

        for (pid, pcb) in self.process_table.iter().filter(|(_, pcb)| pcb.busy) {
            if pcb.physical_base != pid * chunk_size {
                return Err(format!("process {} owns chunk at {}", pid, pcb.physical_base));
            }

            let in_own_ready = self.ready_queues[pcb.queue_class.index()].contains(pid);
            let ready_count = self.ready_queues.iter().filter(|queue| queue.contains(pid)).count();
            let in_any_ready = ready_count > 0;
            let in_sleeping = self.sleeping_queue.contains(pid);

            match pcb.state {
                ProcessState::Ready => {
                    if !in_own_ready || ready_count > 1 || in_sleeping {
                        return Err(format!("READY process {} is not queued only in its ready queue", pid));
                    }
                }
                ProcessState::Blocked => {
                    if !in_sleeping || in_any_ready {
                        return Err(format!("BLOCKED process {} is not queued only in the sleeping queue", pid));
                    }
                }
                state => {
                    if in_any_ready || in_sleeping {
                        return Err(format!("{} process {} is queued", state, pid));
                    }
                    if state == ProcessState::Executing {
                        executing_count += 1;
                        if self.executing != Some(pid) {
                            return Err(format!("process {} is EXECUTING but not marked as executing", pid));
                        }
                    }
                }
            }
        }

        if let Some(pid) = self.executing {
            if self.process_table.get(pid).state != ProcessState::Executing {
                return Err(format!("executing process {} is not in EXECUTING state", pid));
            }
        }

        if executing_count > 1 {
            return Err(format!("{} processes are EXECUTING", executing_count));
        }

        Ok(())
    }
}
