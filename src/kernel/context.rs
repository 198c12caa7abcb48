use super::cpu::{Psw, SYSTEM_STACK_ACCUMULATOR, SYSTEM_STACK_PC, SYSTEM_STACK_PSW};
use super::diagnostics::kernel_event;
use super::{Kernel, Pid};

impl Kernel {
    /// Loads `pid`'s saved registers into the system stack and binds the MMU
    /// to its chunk.
    pub fn restore_context(&mut self, pid: Pid) {
        let pcb = self.process_table.get(pid);
        let cpu = &mut self.machine.cpu;

        cpu.copy_in_system_stack(SYSTEM_STACK_PC, pcb.saved_pc);
        cpu.copy_in_system_stack(SYSTEM_STACK_PSW, pcb.saved_psw.bits());
        cpu.copy_in_system_stack(SYSTEM_STACK_ACCUMULATOR, pcb.saved_accumulator as u32);
        cpu.set_accumulator(pcb.saved_accumulator);

        self.machine.mmu.set_base(pcb.physical_base);
        self.machine.mmu.set_limit(pcb.size);
    }

    /// Copies the registers written by the interrupt entry back into the PCB.
    pub fn save_context(&mut self, pid: Pid) {
        let cpu = &self.machine.cpu;
        let saved_pc = cpu.copy_from_system_stack(SYSTEM_STACK_PC);
        let saved_psw = Psw::from_bits_truncate(cpu.copy_from_system_stack(SYSTEM_STACK_PSW));
        let saved_accumulator = cpu.copy_from_system_stack(SYSTEM_STACK_ACCUMULATOR) as i32;

        let pcb = self.process_table.get_mut(pid);
        pcb.saved_pc = saved_pc;
        pcb.saved_psw = saved_psw;
        pcb.saved_accumulator = saved_accumulator;
    }

    /// Takes the processor away from the executing process and queues it as
    /// READY again.
    pub fn preempt_running(&mut self) {
        let Some(pid) = self.executing.take() else {
            return;
        };

        self.save_context(pid);
        if let Err(err) = self.move_to_ready(pid) {
            kernel_event!(ERROR, self.clock_ticks, Error, 99, "Process [{}] could not be preempted: {}", pid, err);
        }
    }
}
