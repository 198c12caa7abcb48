pub mod disk;
pub mod loader;
pub mod program_info;

pub use disk::{Disk, ProgramImage};
pub use loader::{load_programs_into_disk, parse_program_file, ProgramLoader};
pub use program_info::{ProgramClass, ProgramDescriptor};
