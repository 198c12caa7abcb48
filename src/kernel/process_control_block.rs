use std::fmt;

use super::cpu::Psw;

use crate::io::ProgramClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    New,
    Ready,
    Executing,
    Blocked,
    Exit,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessState::New => "NEW",
            ProcessState::Ready => "READY",
            ProcessState::Executing => "EXECUTING",
            ProcessState::Blocked => "BLOCKED",
            ProcessState::Exit => "EXIT",
        };
        f.write_str(name)
    }
}

/// Ready queue a process competes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueClass {
    User,
    Daemon,
}

impl QueueClass {
    /// Scan order of the short-term scheduler.
    pub const ALL: [QueueClass; 2] = [QueueClass::User, QueueClass::Daemon];

    pub fn index(self) -> usize {
        match self {
            QueueClass::User => 0,
            QueueClass::Daemon => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            QueueClass::User => "USER",
            QueueClass::Daemon => "DAEMONS",
        }
    }
}

impl From<ProgramClass> for QueueClass {
    fn from(class: ProgramClass) -> Self {
        match class {
            ProgramClass::User => QueueClass::User,
            ProgramClass::Daemon => QueueClass::Daemon,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessControlBlock {
    pub busy: bool,
    pub state: ProcessState,
    pub priority: i32,
    pub queue_class: QueueClass,
    pub physical_base: usize,
    pub size: usize,
    pub descriptor_index: usize,
    pub saved_pc: u32,
    pub saved_psw: Psw,
    pub saved_accumulator: i32,
    pub wake_tick: u64,
}

impl ProcessControlBlock {
    pub fn new() -> ProcessControlBlock {
        ProcessControlBlock {
            busy: false,
            state: ProcessState::New,
            priority: 0,
            queue_class: QueueClass::User,
            physical_base: 0,
            size: 0,
            descriptor_index: 0,
            saved_pc: 0,
            saved_psw: Psw::empty(),
            saved_accumulator: 0,
            wake_tick: 0,
        }
    }

    pub fn is_daemon(&self) -> bool {
        self.queue_class == QueueClass::Daemon
    }
}

impl Default for ProcessControlBlock {
    fn default() -> Self {
        ProcessControlBlock::new()
    }
}
