use super::process_control_block::QueueClass;
use super::Kernel;

/// Part of the kernel a diagnostics event comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Init,
    SysProc,
    ShortTermSchedule,
    Interrupt,
    Error,
    Shutdown,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Init => "init",
            Section::SysProc => "sysproc",
            Section::ShortTermSchedule => "short_term_schedule",
            Section::Interrupt => "interrupt",
            Section::Error => "error",
            Section::Shutdown => "shutdown",
        }
    }
}

/// Emits a kernel event stamped with the simulated tick, its section and a
/// numeric message code.
macro_rules! kernel_event {
    ($level:ident, $tick:expr, $section:ident, $code:expr, $($arg:tt)+) => {
        ::tracing::event!(
            ::tracing::Level::$level,
            tick = $tick,
            section = $crate::kernel::diagnostics::Section::$section.as_str(),
            code = $code,
            $($arg)+
        )
    };
}

pub(crate) use kernel_event;

impl Kernel {
    /// Logs both ready queues in the order they will be served.
    pub fn print_ready_to_run_queue(&self) {
        kernel_event!(DEBUG, self.clock_ticks, ShortTermSchedule, 106, "Ready-to-run processes queues:");

        for queue_class in QueueClass::ALL {
            let entries = self.ready_queues[queue_class.index()].entries();
            let listing = if entries.is_empty() {
                "(empty)".to_string()
            } else {
                entries
                    .iter()
                    .map(|(pid, priority)| format!("[{},{}]", pid, priority))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let code = if entries.is_empty() { 114 } else { 107 };

            kernel_event!(DEBUG, self.clock_ticks, ShortTermSchedule, code, "\t{}: {}", queue_class.name(), listing);
        }
    }
}
