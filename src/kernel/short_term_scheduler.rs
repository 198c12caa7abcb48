use super::diagnostics::kernel_event;
use super::process_control_block::{ProcessState, QueueClass};
use super::{Kernel, Pid};

use crate::error::{KernelError, KernelResult};

impl Kernel {
    /// Picks the next process to run: the head of the USER queue, or the
    /// head of the DAEMONS queue when no user process is ready.
    pub fn short_term_scheduler(&mut self) -> KernelResult<Pid> {
        for queue_class in QueueClass::ALL {
            if let Some(pid) = self.extract_ready(queue_class) {
                debug_assert_eq!(self.process_table.get(pid).state, ProcessState::Ready);
                return Ok(pid);
            }
        }

        kernel_event!(ERROR, self.clock_ticks, Error, 99, "FATAL ERROR: no process is ready to run");
        Err(KernelError::NoReadyProcess)
    }

    /// Gives the processor to `pid`.
    ///
    /// Once shutdown has been requested, dispatching the idle daemon makes it
    /// terminate straight away, which halts the simulation.
    pub fn dispatch(&mut self, pid: Pid) -> KernelResult<()> {
        self.executing = Some(pid);
        self.set_state(pid, ProcessState::Executing);
        self.restore_context(pid);

        if self.shutdown_requested && self.idle_pid == Some(pid) {
            kernel_event!(INFO, self.clock_ticks, Shutdown, 99, "Process [{}] finishing on shutdown request", pid);
            return self.terminate_process();
        }

        Ok(())
    }
}
