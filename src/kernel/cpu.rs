use bitflags::bitflags;

use super::memory::MainMemory;
use super::mmu::Mmu;

bitflags! {
    /// Processor status word.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Psw: u32 {
        /// Set when the last arithmetic result was zero.
        const ZERO = 1 << 0;
        /// Protected execution mode. Addresses are physical and privileged
        /// work is allowed.
        const EXECUTION_MODE = 1 << 7;
    }
}

// Fixed system stack slots written on interrupt entry.
pub const SYSTEM_STACK_SIZE: usize = 3;
pub const SYSTEM_STACK_PC: usize = 0;
pub const SYSTEM_STACK_PSW: usize = 1;
pub const SYSTEM_STACK_ACCUMULATOR: usize = 2;

const OPERAND_BITS: u32 = 24;
const OPERAND_MIN: i32 = -(1 << (OPERAND_BITS - 1));
const OPERAND_MAX: i32 = (1 << (OPERAND_BITS - 1)) - 1;

/// Interrupt vector classes, numbered by their interrupt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptVector {
    SystemCall = 2,
    Exception = 6,
    Clock = 9,
}

impl InterruptVector {
    pub fn from_line(line: u32) -> Option<InterruptVector> {
        match line {
            2 => Some(InterruptVector::SystemCall),
            6 => Some(InterruptVector::Exception),
            9 => Some(InterruptVector::Clock),
            _ => None,
        }
    }

    pub fn line(self) -> u32 {
        self as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Nop = 0x00,
    Add = 0x01,
    Set = 0x02,
    Div = 0x03,
    Jump = 0x04,
    ZJump = 0x05,
    Trap = 0x06,
}

impl Operation {
    fn from_opcode(opcode: u32) -> Option<Operation> {
        match opcode {
            0x00 => Some(Operation::Nop),
            0x01 => Some(Operation::Add),
            0x02 => Some(Operation::Set),
            0x03 => Some(Operation::Div),
            0x04 => Some(Operation::Jump),
            0x05 => Some(Operation::ZJump),
            0x06 => Some(Operation::Trap),
            _ => None,
        }
    }

    fn from_mnemonic(mnemonic: &str) -> Option<Operation> {
        match mnemonic.to_ascii_uppercase().as_str() {
            "NOP" => Some(Operation::Nop),
            "ADD" => Some(Operation::Add),
            "SET" => Some(Operation::Set),
            "DIV" => Some(Operation::Div),
            "JUMP" => Some(Operation::Jump),
            "ZJUMP" => Some(Operation::ZJump),
            "TRAP" => Some(Operation::Trap),
            _ => None,
        }
    }
}

/// Builds an instruction word: opcode in the top byte, signed operand below.
pub fn encode(operation: Operation, operand: i32) -> u32 {
    ((operation as u32) << OPERAND_BITS) | (operand as u32 & 0x00FF_FFFF)
}

/// Turns one program line into an instruction word. Accepts raw hex words
/// (`0x06000003`) or mnemonics (`TRAP 3`).
pub fn assemble(line: &str) -> Result<u32, String> {
    let line = line.trim();

    if let Some(hex) = line.strip_prefix("0x").or_else(|| line.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).map_err(|err| format!("not a hex value: {err}"));
    }

    let mut tokens = line.split_ascii_whitespace();
    let mnemonic = tokens.next().ok_or("empty instruction")?;
    let operation =
        Operation::from_mnemonic(mnemonic).ok_or_else(|| format!("unknown instruction {mnemonic}"))?;

    let operand = match tokens.next() {
        Some(token) => token
            .parse::<i32>()
            .map_err(|err| format!("invalid operand {token}: {err}"))?,
        None => 0,
    };
    if tokens.next().is_some() {
        return Err(format!("too many operands in '{line}'"));
    }
    if !(OPERAND_MIN..=OPERAND_MAX).contains(&operand) {
        return Err(format!("operand {operand} does not fit in {OPERAND_BITS} bits"));
    }

    Ok(encode(operation, operand))
}

pub struct Cpu {
    program_counter: u32,
    accumulator: i32,
    register_a: i32,
    psw: Psw,
    system_stack: [u32; SYSTEM_STACK_SIZE],
    interrupt_lines: u32,
    interrupt_vector_table_base: Option<usize>,
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            program_counter: 0,
            accumulator: 0,
            register_a: 0,
            psw: Psw::empty(),
            system_stack: [0; SYSTEM_STACK_SIZE],
            interrupt_lines: 0,
            interrupt_vector_table_base: None,
        }
    }

    pub fn initialize_interrupt_vector_table(&mut self, base: usize) {
        self.interrupt_vector_table_base = Some(base);
    }

    pub fn get_interrupt_vector_table_base(&self) -> Option<usize> {
        self.interrupt_vector_table_base
    }

    pub fn get_pc(&self) -> u32 {
        self.program_counter
    }

    pub fn set_pc(&mut self, value: u32) {
        self.program_counter = value;
    }

    pub fn get_accumulator(&self) -> i32 {
        self.accumulator
    }

    pub fn set_accumulator(&mut self, value: i32) {
        self.accumulator = value;
    }

    pub fn get_register_a(&self) -> i32 {
        self.register_a
    }

    pub fn set_register_a(&mut self, value: i32) {
        self.register_a = value;
    }

    pub fn get_psw(&self) -> Psw {
        self.psw
    }

    pub fn set_psw(&mut self, psw: Psw) {
        self.psw = psw;
    }

    pub fn copy_in_system_stack(&mut self, slot: usize, value: u32) {
        self.system_stack[slot] = value;
    }

    pub fn copy_from_system_stack(&self, slot: usize) -> u32 {
        self.system_stack[slot]
    }

    pub fn raise_interrupt(&mut self, vector: InterruptVector) {
        self.interrupt_lines |= 1 << vector.line();
    }

    /// Clears and returns the lowest pending interrupt line.
    pub fn take_pending_interrupt(&mut self) -> Option<u32> {
        if self.interrupt_lines == 0 {
            return None;
        }
        let line = self.interrupt_lines.trailing_zeros();
        self.interrupt_lines &= !(1 << line);
        Some(line)
    }

    /// Saves the interrupted context in the system stack and switches to
    /// protected mode.
    pub fn enter_interrupt(&mut self) {
        self.system_stack[SYSTEM_STACK_PC] = self.program_counter;
        self.system_stack[SYSTEM_STACK_PSW] = self.psw.bits();
        self.system_stack[SYSTEM_STACK_ACCUMULATOR] = self.accumulator as u32;
        self.psw.insert(Psw::EXECUTION_MODE);
    }

    /// Resumes from whatever context the system stack holds now, which is a
    /// different process if the kernel switched.
    pub fn return_from_interrupt(&mut self) {
        self.program_counter = self.system_stack[SYSTEM_STACK_PC];
        self.psw = Psw::from_bits_truncate(self.system_stack[SYSTEM_STACK_PSW]);
        self.accumulator = self.system_stack[SYSTEM_STACK_ACCUMULATOR] as i32;
    }

    /// Fetches, decodes and executes one instruction. Faults raise the
    /// exception line instead of executing.
    pub fn execute_instruction_cycle(&mut self, memory: &MainMemory, mmu: &Mmu) {
        let physical_address = if self.psw.contains(Psw::EXECUTION_MODE) {
            let address = self.program_counter as usize;
            (address < memory.size()).then_some(address)
        } else {
            mmu.translate(self.program_counter as usize)
        };

        let Some(physical_address) = physical_address else {
            self.raise_interrupt(InterruptVector::Exception);
            return;
        };

        let current_instruction = memory.read_from(physical_address);
        self.program_counter = self.program_counter.wrapping_add(1);

        match Cpu::decode(current_instruction) {
            Some(decoded_instruction) => self.execute(&decoded_instruction),
            None => self.raise_interrupt(InterruptVector::Exception),
        }
    }

    fn decode(instruction: u32) -> Option<DecodedInstruction> {
        let operation = Operation::from_opcode(Cpu::extract_bits(instruction, 0, 8))?;
        // Sign-extend the low 24 bits.
        let operand = ((instruction << 8) as i32) >> 8;

        Some(DecodedInstruction { operation, operand })
    }

    fn extract_bits(instruction: u32, start_index: u32, length: u32) -> u32 {
        (instruction << start_index) >> (32 - length)
    }

    fn execute(&mut self, instruction: &DecodedInstruction) {
        match instruction.operation {
            Operation::Nop => {}
            Operation::Add => {
                self.accumulator = self.accumulator.wrapping_add(instruction.operand);
                self.update_zero_flag();
            }
            Operation::Set => {
                self.accumulator = instruction.operand;
                self.update_zero_flag();
            }
            Operation::Div => match self.accumulator.checked_div(instruction.operand) {
                Some(result) => {
                    self.accumulator = result;
                    self.update_zero_flag();
                }
                None => self.raise_interrupt(InterruptVector::Exception),
            },
            Operation::Jump => self.branch(instruction.operand),
            Operation::ZJump => {
                if self.accumulator == 0 {
                    self.branch(instruction.operand);
                }
            }
            Operation::Trap => {
                self.register_a = instruction.operand;
                self.raise_interrupt(InterruptVector::SystemCall);
            }
        }
    }

    // Jumps are relative to the address of the jump itself.
    fn branch(&mut self, offset: i32) {
        let destination = self.program_counter as i64 - 1 + offset as i64;
        match u32::try_from(destination) {
            Ok(destination) => self.program_counter = destination,
            Err(_) => self.raise_interrupt(InterruptVector::Exception),
        }
    }

    fn update_zero_flag(&mut self) {
        self.psw.set(Psw::ZERO, self.accumulator == 0);
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}

struct DecodedInstruction {
    operation: Operation,
    operand: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine_with(program: &[u32]) -> (Cpu, MainMemory, Mmu) {
        let mut memory = MainMemory::new(2, 10);
        memory.write_block_to(10, program);
        let mut mmu = Mmu::new();
        mmu.set_base(10);
        mmu.set_limit(program.len());
        (Cpu::new(), memory, mmu)
    }

    #[test]
    fn test_cpu_assemble_mnemonics_and_hex() {
        assert_eq!(assemble("TRAP 3").unwrap(), 0x0600_0003);
        assert_eq!(assemble("nop").unwrap(), 0);
        assert_eq!(assemble("JUMP -1").unwrap(), 0x04FF_FFFF);
        assert_eq!(assemble("0x01000005").unwrap(), 0x0100_0005);
    }

    #[test]
    fn test_cpu_assemble_rejects_bad_lines() {
        assert!(assemble("FLY 3").is_err());
        assert!(assemble("ADD x").is_err());
        assert!(assemble("ADD 1 2").is_err());
        assert!(assemble("SET 8388608").is_err());
        assert!(assemble("0xZZ").is_err());
    }

    #[test]
    fn test_cpu_add_and_set() {
        let (mut cpu, memory, mmu) =
            machine_with(&[encode(Operation::Set, 4), encode(Operation::Add, -4)]);
        cpu.execute_instruction_cycle(&memory, &mmu);
        assert_eq!(cpu.get_accumulator(), 4);
        cpu.execute_instruction_cycle(&memory, &mmu);
        assert_eq!(cpu.get_accumulator(), 0);
        assert!(cpu.get_psw().contains(Psw::ZERO));
        assert_eq!(cpu.get_pc(), 2);
    }

    #[test]
    fn test_cpu_trap_raises_system_call() {
        let (mut cpu, memory, mmu) = machine_with(&[encode(Operation::Trap, 7)]);
        cpu.execute_instruction_cycle(&memory, &mmu);
        assert_eq!(cpu.get_register_a(), 7);
        assert_eq!(cpu.take_pending_interrupt(), Some(InterruptVector::SystemCall.line()));
        assert_eq!(cpu.take_pending_interrupt(), None);
    }

    #[test]
    fn test_cpu_divide_by_zero_raises_exception() {
        let (mut cpu, memory, mmu) = machine_with(&[encode(Operation::Div, 0)]);
        cpu.execute_instruction_cycle(&memory, &mmu);
        assert_eq!(cpu.take_pending_interrupt(), Some(InterruptVector::Exception.line()));
    }

    #[test]
    fn test_cpu_fetch_outside_limit_raises_exception() {
        let (mut cpu, memory, mmu) = machine_with(&[encode(Operation::Nop, 0)]);
        cpu.set_pc(1);
        cpu.execute_instruction_cycle(&memory, &mmu);
        assert_eq!(cpu.take_pending_interrupt(), Some(InterruptVector::Exception.line()));
        assert_eq!(cpu.get_pc(), 1);
    }

    #[test]
    fn test_cpu_jump_is_relative() {
        let (mut cpu, memory, mmu) =
            machine_with(&[encode(Operation::Nop, 0), encode(Operation::Jump, -1)]);
        cpu.execute_instruction_cycle(&memory, &mmu);
        cpu.execute_instruction_cycle(&memory, &mmu);
        assert_eq!(cpu.get_pc(), 0);
    }

    #[test]
    fn test_cpu_protected_mode_uses_physical_addresses() {
        let (mut cpu, memory, mmu) = machine_with(&[encode(Operation::Set, 9)]);
        cpu.set_psw(Psw::EXECUTION_MODE);
        cpu.set_pc(10);
        cpu.execute_instruction_cycle(&memory, &mmu);
        assert_eq!(cpu.get_accumulator(), 9);
        assert_eq!(cpu.get_pc(), 11);
    }

    #[test]
    fn test_cpu_interrupt_entry_and_return() {
        let mut cpu = Cpu::new();
        cpu.set_pc(5);
        cpu.set_accumulator(-3);
        cpu.enter_interrupt();
        assert!(cpu.get_psw().contains(Psw::EXECUTION_MODE));
        assert_eq!(cpu.copy_from_system_stack(SYSTEM_STACK_PC), 5);

        cpu.copy_in_system_stack(SYSTEM_STACK_PC, 8);
        cpu.return_from_interrupt();
        assert_eq!(cpu.get_pc(), 8);
        assert_eq!(cpu.get_accumulator(), -3);
        assert!(!cpu.get_psw().contains(Psw::EXECUTION_MODE));
    }

    #[test]
    fn test_cpu_pending_interrupts_lowest_line_first() {
        let mut cpu = Cpu::new();
        cpu.raise_interrupt(InterruptVector::Clock);
        cpu.raise_interrupt(InterruptVector::SystemCall);
        assert_eq!(cpu.take_pending_interrupt(), Some(2));
        assert_eq!(cpu.take_pending_interrupt(), Some(9));
    }
}
