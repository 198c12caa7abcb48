use tracing::{info, warn};

use super::cpu::InterruptVector;
use super::process_control_block::{ProcessState, QueueClass};
use super::{prepare_program_list, Kernel, Pid};

use crate::config::SimulatorConfig;
use crate::error::KernelResult;
use crate::io::{Disk, ProgramDescriptor};

/// Final state of one process after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSummary {
    pub pid: Pid,
    pub name: String,
    pub queue_class: QueueClass,
    pub priority: i32,
    pub state: ProcessState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub instructions: u64,
    pub clock_ticks: u64,
    pub halted: bool,
    pub processes: Vec<ProcessSummary>,
}

/// Holds the virtual system and drives the fetch/execute loop, delivering
/// a clock interrupt every `clock_interval` instructions.
pub struct Driver {
    config: SimulatorConfig,
    disk: Disk,
    kernel: Kernel,
}

impl Driver {
    pub fn new(config: SimulatorConfig, disk: Disk) -> Driver {
        let kernel = Kernel::new(&config);
        Driver { config, disk, kernel }
    }

    pub fn get_kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn start(&mut self, user_programs: Vec<ProgramDescriptor>, daemons: &[String]) -> KernelResult<RunSummary> {
        self.config.validate()?;
        info!(main_memory_size = self.config.main_memory_size(), "Starting the driver.");
        let programs = prepare_program_list(&self.config.idle_program_name, user_programs, daemons);

        info!(programs = programs.len(), "Admitting programs.");
        self.kernel.initialize(programs, &self.disk)?;

        let mut instructions = 0;
        while !self.kernel.is_halted() {
            if let Some(max_instructions) = self.config.max_instructions {
                if instructions >= max_instructions {
                    warn!(instructions, "Instruction limit reached before shutdown.");
                    break;
                }
            }

            self.kernel.execute_instruction_cycle();
            instructions += 1;

            if instructions % self.config.clock_interval == 0 {
                self.kernel.machine_mut().cpu.raise_interrupt(InterruptVector::Clock);
            }

            self.kernel.deliver_pending_interrupts()?;
        }

        info!(instructions, clock_ticks = self.kernel.get_clock_ticks(), "Driver finished.");
        Ok(self.summary(instructions))
    }

    fn summary(&self, instructions: u64) -> RunSummary {
        let processes = self
            .kernel
            .get_process_table()
            .iter()
            .filter(|(_, pcb)| pcb.busy)
            .map(|(pid, pcb)| ProcessSummary {
                pid,
                name: self.kernel.program_name(pid).to_string(),
                queue_class: pcb.queue_class,
                priority: pcb.priority,
                state: pcb.state,
            })
            .collect();

        RunSummary {
            instructions,
            clock_ticks: self.kernel.get_clock_ticks(),
            halted: self.kernel.is_halted(),
            processes,
        }
    }
}
