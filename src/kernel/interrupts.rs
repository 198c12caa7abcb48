use super::cpu::InterruptVector;
use super::diagnostics::kernel_event;
use super::process_control_block::QueueClass;
use super::{Kernel, Pid};

use crate::error::KernelResult;

/// System call codes, read from register A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemCall {
    End = 3,
    Yield = 4,
    PrintExecutingPid = 5,
    Sleep = 7,
}

impl SystemCall {
    pub fn from_code(code: i32) -> Option<SystemCall> {
        match code {
            3 => Some(SystemCall::End),
            4 => Some(SystemCall::Yield),
            5 => Some(SystemCall::PrintExecutingPid),
            7 => Some(SystemCall::Sleep),
            _ => None,
        }
    }
}

impl Kernel {
    /// Runs one instruction of whatever process holds the processor.
    pub fn execute_instruction_cycle(&mut self) {
        self.machine.execute_instruction_cycle();
    }

    /// Delivers every interrupt the processor has pending, lowest line first.
    pub fn deliver_pending_interrupts(&mut self) -> KernelResult<()> {
        while !self.halted {
            let Some(line) = self.machine.cpu.take_pending_interrupt() else {
                break;
            };
            self.interrupt_entry(line)?;
        }
        Ok(())
    }

    /// Full interrupt path: the processor saves the interrupted context in
    /// the system stack, the kernel handles the interrupt, and the processor
    /// resumes from the system stack unless the simulation halted.
    pub fn interrupt_entry(&mut self, line: u32) -> KernelResult<()> {
        self.machine.cpu.enter_interrupt();
        self.handle_interrupt(line)?;
        if !self.halted {
            self.machine.cpu.return_from_interrupt();
        }
        Ok(())
    }

    /// Routes an interrupt line to its handler. Unknown lines are ignored.
    pub fn handle_interrupt(&mut self, line: u32) -> KernelResult<()> {
        match InterruptVector::from_line(line) {
            Some(InterruptVector::SystemCall) => self.handle_system_call(),
            Some(InterruptVector::Exception) => self.handle_exception(),
            Some(InterruptVector::Clock) => self.handle_clock_interrupt(),
            None => {
                kernel_event!(DEBUG, self.clock_ticks, Interrupt, 0, "Ignoring interrupt line {}", line);
                Ok(())
            }
        }
    }

    fn handle_system_call(&mut self) -> KernelResult<()> {
        let Some(pid) = self.executing else {
            kernel_event!(WARN, self.clock_ticks, Error, 99, "System call with no executing process");
            return Ok(());
        };
        let system_call_id = self.machine.cpu.get_register_a();

        match SystemCall::from_code(system_call_id) {
            Some(SystemCall::PrintExecutingPid) => {
                kernel_event!(
                    INFO,
                    self.clock_ticks,
                    SysProc,
                    72,
                    "Process [{} - {}] has the processor assigned",
                    pid,
                    self.program_name(pid)
                );
                Ok(())
            }
            Some(SystemCall::End) => {
                kernel_event!(
                    INFO,
                    self.clock_ticks,
                    SysProc,
                    73,
                    "Process [{} - {}] has requested to terminate",
                    pid,
                    self.program_name(pid)
                );
                self.terminate_process()?;
                self.print_ready_to_run_queue();
                Ok(())
            }
            Some(SystemCall::Yield) => self.yield_processor(pid),
            Some(SystemCall::Sleep) => self.sleep(pid),
            None => {
                kernel_event!(
                    WARN,
                    self.clock_ticks,
                    Error,
                    99,
                    "Process [{} - {}] invoked unknown system call {}",
                    pid,
                    self.program_name(pid),
                    system_call_id
                );
                Ok(())
            }
        }
    }

    // Only an equal priority process gets the processor here. A higher
    // priority one is already handled by clock preemption.
    fn yield_processor(&mut self, pid: Pid) -> KernelResult<()> {
        let pcb = self.process_table.get(pid);
        let queue_class = pcb.queue_class;
        let priority = pcb.priority as i64;

        let Some((candidate, candidate_priority)) = self.ready_queues[queue_class.index()].peek() else {
            return Ok(());
        };
        if candidate_priority != priority {
            return Ok(());
        }

        kernel_event!(
            INFO,
            self.clock_ticks,
            ShortTermSchedule,
            115,
            "Process [{} - {}] will transfer the control of the processor to process [{} - {}]",
            pid,
            self.program_name(pid),
            candidate,
            self.program_name(candidate)
        );

        self.extract_ready(queue_class);
        self.preempt_running();
        self.dispatch(candidate)?;
        self.print_ready_to_run_queue();
        Ok(())
    }

    fn sleep(&mut self, pid: Pid) -> KernelResult<()> {
        let duration = self.machine.cpu.get_accumulator();
        self.process_table.get_mut(pid).wake_tick =
            u64::from(duration.unsigned_abs()) + self.clock_ticks + 1;
        self.save_context(pid);

        if let Err(err) = self.move_to_blocked(pid) {
            kernel_event!(ERROR, self.clock_ticks, Error, 99, "Process [{}] could not sleep: {}", pid, err);
            return Ok(());
        }
        self.executing = None;
        self.print_ready_to_run_queue();

        let selected_process = self.short_term_scheduler()?;
        self.dispatch(selected_process)
    }

    fn handle_exception(&mut self) -> KernelResult<()> {
        let Some(pid) = self.executing else {
            kernel_event!(WARN, self.clock_ticks, Error, 99, "Exception with no executing process");
            return Ok(());
        };

        kernel_event!(
            WARN,
            self.clock_ticks,
            SysProc,
            71,
            "Process [{} - {}] has caused an exception and is being terminated",
            pid,
            self.program_name(pid)
        );
        self.terminate_process()?;
        self.print_ready_to_run_queue();
        Ok(())
    }

    fn handle_clock_interrupt(&mut self) -> KernelResult<()> {
        self.clock_ticks += 1;
        kernel_event!(DEBUG, self.clock_ticks, Interrupt, 120, "Clock interrupt number [{}] has occurred", self.clock_ticks);

        let tick = self.clock_ticks as i64;
        let awakened = self.sleeping_queue.pop_while(|wake_tick| wake_tick <= tick);
        for &pid in &awakened {
            if let Err(err) = self.move_to_ready(pid) {
                kernel_event!(ERROR, self.clock_ticks, Error, 99, "Process [{}] could not wake up: {}", pid, err);
                // Back into the sleeping queue so it stays BLOCKED.
                let wake_tick = self.process_table.get(pid).wake_tick as i64;
                if self.sleeping_queue.push(pid, wake_tick).is_err() {
                    kernel_event!(
                        ERROR,
                        self.clock_ticks,
                        Error,
                        99,
                        "Process [{}] lost from the sleeping queue",
                        pid
                    );
                }
            }
        }

        if !awakened.is_empty() {
            self.print_ready_to_run_queue();
            self.check_if_necessary_to_change_process()?;
        }
        Ok(())
    }

    fn check_if_necessary_to_change_process(&mut self) -> KernelResult<()> {
        let Some(executing) = self.executing else {
            return Ok(());
        };
        let Some((candidate, candidate_priority)) = self.ready_queues[QueueClass::User.index()].peek() else {
            return Ok(());
        };
        if candidate_priority <= self.process_table.get(executing).priority as i64 {
            return Ok(());
        }

        kernel_event!(
            INFO,
            self.clock_ticks,
            ShortTermSchedule,
            121,
            "Process [{} - {}] will be thrown out of the processor by process [{} - {}]",
            executing,
            self.program_name(executing),
            candidate,
            self.program_name(candidate)
        );

        self.extract_ready(QueueClass::User);
        self.preempt_running();
        self.dispatch(candidate)?;
        self.print_ready_to_run_queue();
        Ok(())
    }
}
