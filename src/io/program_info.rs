/// Whether a program runs as a user process or as a system daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramClass {
    User,
    Daemon,
}

/// One entry of the list consumed by the long-term scheduler.
/// Index 0 of that list is always the idle daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDescriptor {
    pub name: String,
    pub arrival_time: u64,
    pub class: ProgramClass,
}

impl ProgramDescriptor {
    pub fn user(name: &str, arrival_time: u64) -> ProgramDescriptor {
        ProgramDescriptor { name: name.to_string(), arrival_time, class: ProgramClass::User }
    }

    pub fn daemon(name: &str) -> ProgramDescriptor {
        ProgramDescriptor { name: name.to_string(), arrival_time: 0, class: ProgramClass::Daemon }
    }

    /// Parses a command line program argument of the form `name[,arrival]`.
    pub fn parse_user(argument: &str) -> Result<ProgramDescriptor, String> {
        let mut parts = argument.splitn(2, ',');
        let name = parts.next().unwrap_or("").trim();
        if name.is_empty() {
            return Err(format!("missing program name in '{}'", argument));
        }

        let arrival_time = match parts.next() {
            Some(arrival) => arrival
                .trim()
                .parse::<u64>()
                .map_err(|err| format!("invalid arrival time in '{}': {}", argument, err))?,
            None => 0,
        };

        Ok(ProgramDescriptor::user(name, arrival_time))
    }
}
