use super::diagnostics::kernel_event;
use super::process_control_block::ProcessState;
use super::Kernel;

use crate::error::KernelResult;

impl Kernel {
    /// Moves the executing process to EXIT and hands the processor to the
    /// next process. The slot stays busy for the rest of the run.
    pub fn terminate_process(&mut self) -> KernelResult<()> {
        let Some(pid) = self.executing.take() else {
            return Ok(());
        };

        self.set_state(pid, ProcessState::Exit);

        if !self.process_table.get(pid).is_daemon() {
            self.live_user_processes = self.live_user_processes.saturating_sub(1);
        }

        if self.live_user_processes == 0 {
            if self.idle_pid == Some(pid) {
                self.halt();
                return Ok(());
            }
            self.ready_to_shutdown();
        }

        let selected_process = self.short_term_scheduler()?;
        self.dispatch(selected_process)
    }

    /// Tells the idle daemon to finish the next time it gets the processor.
    pub fn ready_to_shutdown(&mut self) {
        if !self.shutdown_requested {
            kernel_event!(INFO, self.clock_ticks, Shutdown, 99, "No user processes left, requesting idle process shutdown");
        }
        self.shutdown_requested = true;
    }

    /// Stops the simulation without dispatching anything else.
    pub(super) fn halt(&mut self) {
        kernel_event!(INFO, self.clock_ticks, Shutdown, 99, "The system will shut down now...");
        self.halted = true;
    }
}
