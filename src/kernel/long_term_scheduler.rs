use super::diagnostics::kernel_event;
use super::process_control_block::QueueClass;
use super::{Kernel, Pid};

use crate::error::{KernelError, KernelResult};
use crate::io::{ProgramClass, ProgramDescriptor, ProgramLoader};

/// Builds the program list consumed by the long-term scheduler: the idle
/// daemon at index 0, then the user programs, then any extra daemons.
pub fn prepare_program_list(
    idle_program_name: &str,
    user_programs: Vec<ProgramDescriptor>,
    daemons: &[String],
) -> Vec<ProgramDescriptor> {
    let mut programs = Vec::with_capacity(1 + user_programs.len() + daemons.len());
    programs.push(ProgramDescriptor::daemon(idle_program_name));
    programs.extend(user_programs);
    programs.extend(daemons.iter().map(|name| ProgramDescriptor::daemon(name)));
    programs
}

impl Kernel {
    /// Boots the kernel: admits every program, checks the idle daemon is
    /// there, and dispatches the first process.
    pub fn initialize(&mut self, programs: Vec<ProgramDescriptor>, loader: &impl ProgramLoader) -> KernelResult<()> {
        let memory_size = self.machine.memory.size();
        self.machine.cpu.initialize_interrupt_vector_table(memory_size);

        let created_processes = self.admit(programs, loader);
        if created_processes == 0 {
            kernel_event!(WARN, self.clock_ticks, Shutdown, 99, "No process could be created");
            self.halt();
            return Ok(());
        }

        self.idle_pid = self.find_idle_process();
        if self.idle_pid.is_none() {
            kernel_event!(
                ERROR,
                self.clock_ticks,
                Shutdown,
                99,
                "FATAL ERROR: Missing {} program!",
                self.idle_program_name
            );
            self.halted = true;
            return Err(KernelError::MissingIdleProcess(self.idle_program_name.clone()));
        }

        let selected_process = self.short_term_scheduler()?;
        self.dispatch(selected_process)?;
        if !self.halted {
            self.machine.cpu.return_from_interrupt();
        }
        Ok(())
    }

    /// Installs the program list and runs the long-term scheduler over it.
    pub fn admit(&mut self, programs: Vec<ProgramDescriptor>, loader: &impl ProgramLoader) -> usize {
        self.programs = programs;
        self.long_term_scheduler(loader)
    }

    /// Creates one process per program descriptor. Failures are reported and
    /// skipped. Returns the number of processes created.
    pub fn long_term_scheduler(&mut self, loader: &impl ProgramLoader) -> usize {
        let mut number_of_created_processes = 0;

        for descriptor_index in 0..self.programs.len() {
            let program_class = self.programs[descriptor_index].class;

            match self.create_process(descriptor_index, QueueClass::from(program_class), loader) {
                Ok(pid) => {
                    number_of_created_processes += 1;
                    if program_class == ProgramClass::User {
                        self.live_user_processes += 1;
                    }
                    if let Err(err) = self.move_to_ready(pid) {
                        kernel_event!(ERROR, self.clock_ticks, Error, 99, "Process [{}] is not ready: {}", pid, err);
                    }
                    self.print_ready_to_run_queue();
                }
                Err(err) => self.report_admission_failure(descriptor_index, &err),
            }
        }

        number_of_created_processes
    }

    /// Allocates a slot, checks and loads the program image, and initializes
    /// the PCB. Nothing needs undoing on failure: the slot only becomes busy
    /// in the last step.
    pub fn create_process(
        &mut self,
        descriptor_index: usize,
        queue_class: QueueClass,
        loader: &impl ProgramLoader,
    ) -> KernelResult<Pid> {
        let name = self.programs[descriptor_index].name.clone();

        let pid = self.process_table.allocate_slot()?;
        let process_size = loader.program_size(&name)?;
        let priority = loader.program_priority(&name)?;
        let physical_base = self.machine.memory.obtain_main_memory(process_size, pid)?;
        loader.load_program(&name, &mut self.machine.memory, physical_base, process_size)?;

        self.process_table
            .initialize(pid, physical_base, process_size, priority, descriptor_index, queue_class);

        kernel_event!(
            INFO,
            self.clock_ticks,
            SysProc,
            111,
            "New process [{} - {}] moving to the [NEW] state",
            pid,
            name
        );
        kernel_event!(INFO, self.clock_ticks, Init, 70, "Process [{}] created from program [{}]", pid, name);

        Ok(pid)
    }

    fn report_admission_failure(&self, descriptor_index: usize, err: &KernelError) {
        let name = &self.programs[descriptor_index].name;

        match err {
            KernelError::NoFreeEntry => kernel_event!(
                ERROR,
                self.clock_ticks,
                Error,
                err.code(),
                "ERROR: There are not free entries in the process table for the program [{}]",
                name
            ),
            KernelError::ProgramDoesNotExist => kernel_event!(
                ERROR,
                self.clock_ticks,
                Error,
                err.code(),
                "ERROR: Program [{}] is not valid [--- it does not exist ---]",
                name
            ),
            KernelError::ProgramNotValid => kernel_event!(
                ERROR,
                self.clock_ticks,
                Error,
                err.code(),
                "ERROR: Program [{}] is not valid [--- invalid priority or size ---]",
                name
            ),
            KernelError::TooBigProcess => kernel_event!(
                ERROR,
                self.clock_ticks,
                Error,
                err.code(),
                "ERROR: Program [{}] is too big",
                name
            ),
            other => kernel_event!(
                ERROR,
                self.clock_ticks,
                Error,
                other.code(),
                "ERROR: Program [{}] could not be admitted: {}",
                name,
                other
            ),
        }
    }

    fn find_idle_process(&self) -> Option<Pid> {
        let idle_descriptor = self.programs.first()?;
        if idle_descriptor.name != self.idle_program_name || idle_descriptor.class != ProgramClass::Daemon {
            return None;
        }

        self.process_table
            .iter()
            .find(|(_, pcb)| pcb.busy && pcb.descriptor_index == 0)
            .map(|(pid, _)| pid)
    }
}
