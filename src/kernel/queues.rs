use super::diagnostics::kernel_event;
use super::process_control_block::{ProcessState, QueueClass};
use super::{Kernel, Pid};

use crate::error::{KernelError, KernelResult};

impl Kernel {
    /// Queues `pid` in the ready queue of its class. When the queue is full
    /// the process keeps its current state.
    pub fn move_to_ready(&mut self, pid: Pid) -> KernelResult<()> {
        let pcb = self.process_table.get(pid);
        let queue_class = pcb.queue_class;

        self.ready_queues[queue_class.index()]
            .push(pid, pcb.priority as i64)
            .map_err(|_| KernelError::QueueFull(queue_class.name()))?;

        self.set_state(pid, ProcessState::Ready);
        Ok(())
    }

    /// Queues `pid` in the sleeping queue keyed by its wake tick.
    pub fn move_to_blocked(&mut self, pid: Pid) -> KernelResult<()> {
        let wake_tick = self.process_table.get(pid).wake_tick;

        self.sleeping_queue
            .push(pid, wake_tick as i64)
            .map_err(|_| KernelError::QueueFull("SLEEPING"))?;

        self.set_state(pid, ProcessState::Blocked);
        Ok(())
    }

    /// Pops the highest priority process of `queue_class`.
    pub fn extract_ready(&mut self, queue_class: QueueClass) -> Option<Pid> {
        self.ready_queues[queue_class.index()].pop()
    }

    /// Pops the process with the earliest wake tick.
    pub fn extract_blocked(&mut self) -> Option<Pid> {
        self.sleeping_queue.pop()
    }

    pub(super) fn set_state(&mut self, pid: Pid, state: ProcessState) {
        let previous_state = self.process_table.get(pid).state;
        self.process_table.get_mut(pid).state = state;

        kernel_event!(
            INFO,
            self.clock_ticks,
            SysProc,
            110,
            "Process [{} - {}] moving from the [{}] state to the [{}] state",
            pid,
            self.program_name(pid),
            previous_state,
            state
        );
    }
}
