//! Programmatic construction of [`Module`]s, bypassing the `.dsb` wire
//! format. Used by host tooling that emits bytecode directly and by this
//! crate's own tests.

use crate::module::{FunctionEntry, Module, ModuleMetadata, FLAG_DEBUG_INFO};
use crate::op_code::{OpCode, OperandSize};

/// Builds a [`Module`] instruction-by-instruction and constant-by-constant.
///
/// Mirrors the shape of a compiler's final emission pass: constants and
/// globals are interned as they're referenced, functions are declared with
/// their entry PC resolved once their body has been emitted, and the code
/// buffer grows monotonically.
pub struct ModuleBuilder {
    metadata: ModuleMetadata,
    constants: Vec<String>,
    globals: Vec<String>,
    functions: Vec<FunctionEntry>,
    main_entry_pc: u32,
    code: Vec<u8>,
    debug_lines: Vec<u32>,
    track_debug_info: bool,
}

impl ModuleBuilder {
    pub fn new(app_name: &str, app_version: &str, author: &str, heap_size: u32) -> Self {
        Self {
            metadata: ModuleMetadata {
                heap_size,
                app_name: app_name.to_string(),
                app_version: app_version.to_string(),
                author: author.to_string(),
                timestamp: 0,
                metadata_hash: 0,
                code_checksum: 0,
            },
            constants: Vec::new(),
            globals: Vec::new(),
            functions: Vec::new(),
            main_entry_pc: 0,
            code: Vec::new(),
            debug_lines: Vec::new(),
            track_debug_info: false,
        }
    }

    /// Enables recording a PC->line table for every emitted byte. Call
    /// before emitting any instructions.
    pub fn with_debug_info(mut self) -> Self {
        self.track_debug_info = true;
        self
    }

    /// Interns a constant string, returning its index. Repeated content is
    /// not deduplicated here — constant folding is a compiler concern.
    pub fn add_constant(&mut self, value: &str) -> u16 {
        self.constants.push(value.to_string());
        (self.constants.len() - 1) as u16
    }

    pub fn add_global(&mut self, name: &str) -> u16 {
        self.globals.push(name.to_string());
        (self.globals.len() - 1) as u16
    }

    /// The PC the next emitted byte will occupy.
    pub fn current_pc(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn set_main_entry_pc(&mut self, pc: u32) {
        self.main_entry_pc = pc;
    }

    /// Declares a function table entry at the current PC. Call this
    /// immediately before emitting the function's body.
    pub fn begin_function(&mut self, name: &str, param_count: u8) -> u16 {
        self.functions.push(FunctionEntry {
            name: name.to_string(),
            entry_pc: self.current_pc(),
            param_count,
        });
        (self.functions.len() - 1) as u16
    }

    fn emit_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        if self.track_debug_info {
            self.debug_lines.push(line);
        }
    }

    fn emit_bytes(&mut self, bytes: &[u8], line: u32) {
        for &b in bytes {
            self.emit_byte(b, line);
        }
    }

    /// Emits a no-operand opcode. Panics (a builder-time programmer error,
    /// not a runtime fault) if the opcode takes an operand.
    pub fn push_op(&mut self, op: OpCode) -> &mut Self {
        self.push_op_at_line(op, 0)
    }

    pub fn push_op_at_line(&mut self, op: OpCode, line: u32) -> &mut Self {
        assert_eq!(op.operand_size(), OperandSize::None, "{:?} requires an operand", op);
        self.emit_byte(op.to_u8(), line);
        self
    }

    pub fn push_i8(&mut self, value: i8) -> &mut Self {
        self.emit_byte(OpCode::PushI8.to_u8(), 0);
        self.emit_byte(value as u8, 0);
        self
    }

    pub fn push_i16(&mut self, value: i16) -> &mut Self {
        self.emit_byte(OpCode::PushI16.to_u8(), 0);
        self.emit_bytes(&value.to_le_bytes(), 0);
        self
    }

    pub fn push_i32(&mut self, value: i32) -> &mut Self {
        self.emit_byte(OpCode::PushI32.to_u8(), 0);
        self.emit_bytes(&value.to_le_bytes(), 0);
        self
    }

    pub fn push_f32(&mut self, value: f32) -> &mut Self {
        self.emit_byte(OpCode::PushF32.to_u8(), 0);
        self.emit_bytes(&value.to_le_bytes(), 0);
        self
    }

    /// Emits `PUSH_STR const_idx`.
    pub fn push_str(&mut self, const_idx: u16) -> &mut Self {
        self.emit_byte(OpCode::PushStr.to_u8(), 0);
        self.emit_bytes(&const_idx.to_le_bytes(), 0);
        self
    }

    pub fn push_u8_operand(&mut self, op: OpCode, value: u8) -> &mut Self {
        assert_eq!(op.operand_size(), OperandSize::U8);
        self.emit_byte(op.to_u8(), 0);
        self.emit_byte(value, 0);
        self
    }

    pub fn push_u16_operand(&mut self, op: OpCode, value: u16) -> &mut Self {
        assert_eq!(op.operand_size(), OperandSize::U16);
        self.emit_byte(op.to_u8(), 0);
        self.emit_bytes(&value.to_le_bytes(), 0);
        self
    }

    pub fn push_i32_operand(&mut self, op: OpCode, value: i32) -> &mut Self {
        assert_eq!(op.operand_size(), OperandSize::I32);
        self.emit_byte(op.to_u8(), 0);
        self.emit_bytes(&value.to_le_bytes(), 0);
        self
    }

    /// Emits `CALL`/`CALL_NATIVE`/`CALL_METHOD`-shaped `u16 + u8` operands.
    pub fn push_index_and_count(&mut self, op: OpCode, index: u16, count: u8) -> &mut Self {
        assert_eq!(op.operand_size(), OperandSize::U16AndU8);
        self.emit_byte(op.to_u8(), 0);
        self.emit_bytes(&index.to_le_bytes(), 0);
        self.emit_byte(count, 0);
        self
    }

    /// Reserves space for a forward jump, returning the PC of its operand
    /// so it can be patched with [`Self::patch_i32_operand`] once the jump
    /// target is known.
    pub fn push_jump_placeholder(&mut self, op: OpCode) -> u32 {
        self.emit_byte(op.to_u8(), 0);
        let operand_pc = self.current_pc();
        self.emit_bytes(&0i32.to_le_bytes(), 0);
        operand_pc
    }

    /// Patches a previously reserved `i32` operand (see
    /// [`Self::push_jump_placeholder`]) with a value relative to the PC
    /// immediately following that operand.
    pub fn patch_jump_to_current_pc(&mut self, operand_pc: u32) {
        let relative = self.current_pc() as i64 - (operand_pc as i64 + 4);
        let bytes = (relative as i32).to_le_bytes();
        let start = operand_pc as usize;
        self.code[start..start + 4].copy_from_slice(&bytes);
    }

    /// Assembles the final, integrity-verifiable [`Module`]. The loader
    /// recomputes `metadata_hash`/`code_checksum` on the way out, so the
    /// values set here are placeholders.
    pub fn build(self) -> Module {
        let flags = if self.track_debug_info { FLAG_DEBUG_INFO } else { 0 };
        Module {
            version: 1,
            flags,
            metadata: self.metadata,
            constants: self.constants,
            globals: self.globals,
            functions: self.functions,
            main_entry_pc: self.main_entry_pc,
            code: self.code,
            debug_lines: self.debug_lines,
        }
    }
}
