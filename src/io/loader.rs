use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::Disk;

use crate::error::{KernelError, KernelResult};
use crate::kernel::cpu;
use crate::kernel::memory::MainMemory;

/// What the kernel needs from the program loader during process creation.
pub trait ProgramLoader {
    /// Declared size of the program image.
    fn program_size(&self, name: &str) -> KernelResult<usize>;

    /// Declared priority of the program.
    fn program_priority(&self, name: &str) -> KernelResult<i32>;

    /// Copies the image to `physical_address`. Fails with `TooBigProcess` if
    /// the image has more instructions than `process_size`.
    fn load_program(
        &self,
        name: &str,
        memory: &mut MainMemory,
        physical_address: usize,
        process_size: usize,
    ) -> KernelResult<()>;
}

impl ProgramLoader for Disk {
    fn program_size(&self, name: &str) -> KernelResult<usize> {
        let image = self.get_image_for(name).ok_or(KernelError::ProgramDoesNotExist)?;

        match image.size_field.trim().parse::<usize>() {
            Ok(size) if size > 0 => Ok(size),
            _ => Err(KernelError::ProgramNotValid),
        }
    }

    fn program_priority(&self, name: &str) -> KernelResult<i32> {
        let image = self.get_image_for(name).ok_or(KernelError::ProgramDoesNotExist)?;

        match image.priority_field.trim().parse::<i32>() {
            Ok(priority) if priority >= 0 => Ok(priority),
            _ => Err(KernelError::ProgramNotValid),
        }
    }

    fn load_program(
        &self,
        name: &str,
        memory: &mut MainMemory,
        physical_address: usize,
        process_size: usize,
    ) -> KernelResult<()> {
        let image = self.get_image_for(name).ok_or(KernelError::ProgramDoesNotExist)?;

        if image.data.len() > process_size {
            return Err(KernelError::TooBigProcess);
        }

        memory.write_block_to(physical_address, &image.data);
        Ok(())
    }
}

pub fn load_programs_into_disk(path: &Path, disk: &mut Disk) -> KernelResult<usize> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut content = String::new();
    for line in reader.lines() {
        content.push_str(&line?);
        content.push('\n');
    }

    parse_program_file(&content, disk)
}

/// Reads job images from program file text into the disk. Returns how many
/// images were written.
///
/// ```text
/// // JOB <name> <size> <priority>
/// <instruction>
/// // END
/// ```
pub fn parse_program_file(content: &str, disk: &mut Disk) -> KernelResult<usize> {
    let mut current_job: Option<(String, String, String)> = None;
    let mut data = Vec::new();
    let mut number_of_programs = 0;

    for (index, line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(job_info) = line.strip_prefix("// JOB") {
            if current_job.is_some() {
                return Err(file_error(line_number, "JOB card before END of previous job"));
            }

            let mut job_info = job_info.split_whitespace();
            let name = job_info
                .next()
                .ok_or_else(|| file_error(line_number, "JOB control card is missing the program name"))?;
            let size_field = job_info.next().unwrap_or_default();
            let priority_field = job_info.next().unwrap_or_default();

            current_job = Some((name.to_string(), size_field.to_string(), priority_field.to_string()));
        } else if line.starts_with("// END") {
            let (name, size_field, priority_field) = current_job
                .take()
                .ok_or_else(|| file_error(line_number, "END card without JOB"))?;

            disk.write_program(&name, &size_field, &priority_field, data.as_slice());
            data.clear();
            number_of_programs += 1;
        } else {
            if current_job.is_none() {
                return Err(file_error(line_number, "instruction outside of a JOB"));
            }

            let value = cpu::assemble(line).map_err(|reason| file_error(line_number, &reason))?;
            data.push(value);
        }
    }

    if current_job.is_some() {
        return Err(file_error(content.lines().count(), "missing END card"));
    }

    Ok(number_of_programs)
}

fn file_error(line: usize, reason: &str) -> KernelError {
    KernelError::ProgramFile { line, reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM_FILE: &str = "\
// JOB SystemIdleProcess 2 0
NOP
JUMP -1
// END

# user program
// JOB prog-a 3 5
SET 2
0x06000007
TRAP 3
// END
";

    #[test]
    fn test_parse_program_file() {
        let mut disk = Disk::new();
        let number_of_programs = parse_program_file(PROGRAM_FILE, &mut disk).unwrap();

        assert_eq!(number_of_programs, 2);
        let image = disk.get_image_for("prog-a").unwrap();
        assert_eq!(image.data, vec![0x0200_0002, 0x0600_0007, 0x0600_0003]);
        assert_eq!(disk.program_size("prog-a").unwrap(), 3);
        assert_eq!(disk.program_priority("prog-a").unwrap(), 5);
    }

    #[test]
    fn test_parse_program_file_missing_end() {
        let mut disk = Disk::new();
        let result = parse_program_file("// JOB prog 1 1\nNOP\n", &mut disk);
        assert!(matches!(result, Err(KernelError::ProgramFile { line: 2, .. })));
    }

    #[test]
    fn test_parse_program_file_bad_instruction() {
        let mut disk = Disk::new();
        let result = parse_program_file("// JOB prog 1 1\nFLY\n// END\n", &mut disk);
        assert!(matches!(result, Err(KernelError::ProgramFile { line: 2, .. })));
    }

    #[test]
    fn test_parse_program_file_instruction_outside_job() {
        let mut disk = Disk::new();
        let result = parse_program_file("NOP\n", &mut disk);
        assert!(matches!(result, Err(KernelError::ProgramFile { line: 1, .. })));
    }

    #[test]
    fn test_loader_missing_program() {
        let disk = Disk::new();
        assert!(matches!(disk.program_size("ghost"), Err(KernelError::ProgramDoesNotExist)));
    }

    #[test]
    fn test_loader_invalid_size_and_priority() {
        let mut disk = Disk::new();
        disk.write_program("bad-size", "many", "1", &[0]);
        disk.write_program("bad-priority", "1", "-4", &[0]);
        disk.write_program("no-fields", "", "", &[0]);

        assert!(matches!(disk.program_size("bad-size"), Err(KernelError::ProgramNotValid)));
        assert!(matches!(disk.program_priority("bad-priority"), Err(KernelError::ProgramNotValid)));
        assert!(matches!(disk.program_size("no-fields"), Err(KernelError::ProgramNotValid)));
    }

    #[test]
    fn test_loader_load_program_into_memory() {
        let mut disk = Disk::new();
        disk.write_program("prog", "4", "1", &[7, 8, 9]);
        let mut memory = MainMemory::new(2, 10);

        disk.load_program("prog", &mut memory, 10, 4).unwrap();
        assert_eq!(memory.read_block_from(10, 13), vec![7, 8, 9]);
    }

    #[test]
    fn test_loader_more_instructions_than_declared_size() {
        let mut disk = Disk::new();
        disk.write_program("prog", "2", "1", &[7, 8, 9]);
        let mut memory = MainMemory::new(2, 10);

        let result = disk.load_program("prog", &mut memory, 10, 2);
        assert!(matches!(result, Err(KernelError::TooBigProcess)));
        assert_eq!(memory.read_from(10), 0);
    }
}
