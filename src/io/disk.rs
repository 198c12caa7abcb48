use std::collections::HashMap;

/// A program image as it was read from the program file. Size and priority
/// are kept as written; the loader validates them when a process is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    pub name: String,
    pub size_field: String,
    pub priority_field: String,
    pub data: Vec<u32>,
}

pub struct Disk {
    program_map: HashMap<String, ProgramImage>,
}

impl Disk {
    pub fn new() -> Disk {
        Disk { program_map: HashMap::new() }
    }

    pub fn get_image_for(&self, name: &str) -> Option<&ProgramImage> {
        self.program_map.get(name)
    }

    pub fn write_program(&mut self, name: &str, size_field: &str, priority_field: &str, data: &[u32]) {
        let program_image = ProgramImage {
            name: name.to_string(),
            size_field: size_field.to_string(),
            priority_field: priority_field.to_string(),
            data: data.to_vec(),
        };

        self.program_map.insert(program_image.name.clone(), program_image);
    }

    pub fn get_program_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.program_map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.program_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.program_map.is_empty()
    }
}

impl Default for Disk {
    fn default() -> Self {
        Disk::new()
    }
}
