//! The `.dsb` bytecode container: decode, encode, and disassemble.
//!
//! All integers little-endian: magic `DSBC`, version (u16), flags (u16), a
//! fixed metadata block, length-prefixed constant/global name tables, a
//! function table, the main entry PC, the code section, and an optional
//! PC-indexed debug line array.

use dial_io::{BinaryReader, BinaryWriter};
use xxhash_rust::xxh3::xxh3_64;

use crate::error::{DialError, DialResult};
use crate::op_code::OpCode;

const MAGIC: &[u8; 4] = b"DSBC";
const VERSION: u16 = 1;

/// Bit 0: debug PC-to-line table is present.
pub const FLAG_DEBUG_INFO: u16 = 1 << 0;
/// Bit 1: `CALL_NATIVE` operands are direct numeric IDs rather than
/// indices into the legacy function-name table.
pub const FLAG_NATIVE_IDS_DIRECT: u16 = 1 << 1;

/// Fixed metadata carried by every Module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleMetadata {
    pub heap_size: u32,
    pub app_name: String,
    pub app_version: String,
    pub author: String,
    pub timestamp: u32,
    pub metadata_hash: u32,
    pub code_checksum: u16,
}

/// One entry in the function table: a callable's name, code entry point,
/// and declared arity.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionEntry {
    pub name: String,
    pub entry_pc: u32,
    pub param_count: u8,
}

/// An immutable, integrity-checked bytecode program.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub version: u16,
    pub flags: u16,
    pub metadata: ModuleMetadata,
    pub constants: Vec<String>,
    pub globals: Vec<String>,
    pub functions: Vec<FunctionEntry>,
    pub main_entry_pc: u32,
    pub code: Vec<u8>,
    /// `debug_lines[pc]` is the source line for that PC, or `0` for "no
    /// line". Empty when the debug-info flag is unset.
    pub debug_lines: Vec<u32>,
}

impl Module {
    pub fn has_debug_info(&self) -> bool {
        self.flags & FLAG_DEBUG_INFO != 0
    }

    pub fn uses_direct_native_ids(&self) -> bool {
        self.flags & FLAG_NATIVE_IDS_DIRECT != 0
    }

    /// The source line for a PC, if a debug line table is present and the
    /// recorded value is non-zero.
    pub fn line_for_pc(&self, pc: usize) -> Option<u32> {
        self.debug_lines.get(pc).copied().filter(|&line| line != 0)
    }

    /// Finds a function-table entry by name, e.g. `"Counter::constructor"`.
    pub fn find_function(&self, name: &str) -> Option<(u16, &FunctionEntry)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
            .map(|(i, f)| (i as u16, f))
    }

    pub fn function(&self, index: u16) -> DialResult<&FunctionEntry> {
        self.functions
            .get(index as usize)
            .ok_or_else(|| DialError::invalid_index("function", index as u32))
    }

    pub fn constant(&self, index: u16) -> DialResult<&str> {
        self.constants
            .get(index as usize)
            .map(String::as_str)
            .ok_or_else(|| DialError::invalid_index("constant", index as u32))
    }

    pub fn global_name(&self, index: u16) -> DialResult<&str> {
        self.globals
            .get(index as usize)
            .map(String::as_str)
            .ok_or_else(|| DialError::invalid_index("global", index as u32))
    }

    /// Every function entry named `{class_name}::{method}` other than
    /// `constructor`, used by `NEW_OBJECT` to attach method fields.
    pub fn methods_of(&self, class_name: &str) -> impl Iterator<Item = (u16, &FunctionEntry)> {
        let prefix = format!("{class_name}::");
        self.functions.iter().enumerate().filter_map(move |(i, f)| {
            let rest = f.name.strip_prefix(prefix.as_str())?;
            (rest != "constructor").then_some((i as u16, f))
        })
    }

    pub fn constructor_of(&self, class_name: &str) -> Option<(u16, &FunctionEntry)> {
        self.find_function(&format!("{class_name}::constructor"))
    }

    /// Decodes a `.dsb` blob into a Module, verifying its integrity hashes.
    pub fn load(bytes: impl Into<bytes::Bytes>) -> DialResult<Module> {
        let mut r = BinaryReader::new(bytes.into());

        let magic = r.read_bytes(4).map_err(io_to_dial)?;
        if magic != MAGIC {
            return Err(DialError::BadMagic);
        }

        let version = r.read_u16().map_err(io_to_dial)?;
        let flags = r.read_u16().map_err(io_to_dial)?;

        let heap_size = r.read_u32().map_err(io_to_dial)?;
        let app_name = r.read_string_u16().map_err(io_to_dial)?;
        let app_version = r.read_string_u16().map_err(io_to_dial)?;
        let author = r.read_string_u16().map_err(io_to_dial)?;
        let timestamp = r.read_u32().map_err(io_to_dial)?;
        let metadata_hash = r.read_u32().map_err(io_to_dial)?;
        let code_checksum = r.read_u16().map_err(io_to_dial)?;

        let constants = read_string_table(&mut r)?;
        let globals = read_string_table(&mut r)?;

        let function_count = r.read_u32().map_err(io_to_dial)?;
        let mut functions = Vec::with_capacity(function_count as usize);
        for _ in 0..function_count {
            let name = r.read_string_u16().map_err(io_to_dial)?;
            let entry_pc = r.read_u32().map_err(io_to_dial)?;
            let param_count = r.read_u8().map_err(io_to_dial)?;
            functions.push(FunctionEntry {
                name,
                entry_pc,
                param_count,
            });
        }

        let main_entry_pc = r.read_u32().map_err(io_to_dial)?;

        let code_len = r.read_u32().map_err(io_to_dial)? as usize;
        let code = r.read_bytes(code_len).map_err(io_to_dial)?;

        let debug_lines = if flags & FLAG_DEBUG_INFO != 0 {
            let count = r.read_u32().map_err(io_to_dial)?;
            let mut lines = Vec::with_capacity(count as usize);
            for _ in 0..count {
                lines.push(r.read_u32().map_err(io_to_dial)?);
            }
            lines
        } else {
            Vec::new()
        };

        let metadata = ModuleMetadata {
            heap_size,
            app_name,
            app_version,
            author,
            timestamp,
            metadata_hash,
            code_checksum,
        };

        let expected_hash = compute_metadata_hash(&metadata);
        if metadata_hash != expected_hash {
            return Err(DialError::integrity_mismatch(format!(
                "metadata_hash: expected {expected_hash:#010x}, found {metadata_hash:#010x}"
            )));
        }

        let expected_checksum = compute_code_checksum(&code);
        if code_checksum != expected_checksum {
            return Err(DialError::integrity_mismatch(format!(
                "code_checksum: expected {expected_checksum:#06x}, found {code_checksum:#06x}"
            )));
        }

        validate_code(&code)?;

        Ok(Module {
            version,
            flags,
            metadata,
            constants,
            globals,
            functions,
            main_entry_pc,
            code,
            debug_lines,
        })
    }

    /// Re-encodes this Module to bytes, recomputing the integrity fields so
    /// `Module::load(module.serialize())` always succeeds.
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = BinaryWriter::new();

        w.write_bytes(MAGIC).unwrap();
        w.write_u16(self.version).unwrap();
        w.write_u16(self.flags).unwrap();

        w.write_u32(self.metadata.heap_size).unwrap();
        w.write_string_u16(&self.metadata.app_name).unwrap();
        w.write_string_u16(&self.metadata.app_version).unwrap();
        w.write_string_u16(&self.metadata.author).unwrap();
        w.write_u32(self.metadata.timestamp).unwrap();
        w.write_u32(compute_metadata_hash(&self.metadata)).unwrap();
        w.write_u16(compute_code_checksum(&self.code)).unwrap();

        write_string_table(&mut w, &self.constants);
        write_string_table(&mut w, &self.globals);

        w.write_u32(self.functions.len() as u32).unwrap();
        for f in &self.functions {
            w.write_string_u16(&f.name).unwrap();
            w.write_u32(f.entry_pc).unwrap();
            w.write_u8(f.param_count).unwrap();
        }

        w.write_u32(self.main_entry_pc).unwrap();

        w.write_u32(self.code.len() as u32).unwrap();
        w.write_bytes(&self.code).unwrap();

        if self.flags & FLAG_DEBUG_INFO != 0 {
            w.write_u32(self.debug_lines.len() as u32).unwrap();
            for &line in &self.debug_lines {
                w.write_u32(line).unwrap();
            }
        }

        w.to_bytes()
    }

    /// A human-readable listing of constants, globals, functions, and the
    /// decoded instruction stream, for tooling and diagnostics.
    pub fn disassemble(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();

        let _ = writeln!(out, "; {} v{}", self.metadata.app_name, self.metadata.app_version);
        let _ = writeln!(out, "; heap_size={} main_entry_pc={}", self.metadata.heap_size, self.main_entry_pc);

        let _ = writeln!(out, "\n.constants");
        for (i, c) in self.constants.iter().enumerate() {
            let _ = writeln!(out, "  [{i}] {c:?}");
        }

        let _ = writeln!(out, "\n.globals");
        for (i, g) in self.globals.iter().enumerate() {
            let _ = writeln!(out, "  [{i}] {g}");
        }

        let _ = writeln!(out, "\n.functions");
        for (i, f) in self.functions.iter().enumerate() {
            let _ = writeln!(out, "  [{i}] {} entry={} argc={}", f.name, f.entry_pc, f.param_count);
        }

        let _ = writeln!(out, "\n.code");
        let mut pc = 0usize;
        while pc < self.code.len() {
            match crate::instruction::Instruction::decode(&self.code, pc) {
                Ok(ins) => {
                    let line = self
                        .line_for_pc(pc)
                        .map(|l| format!(" ; line {l}"))
                        .unwrap_or_default();
                    let _ = writeln!(out, "  {:>6}: {}{:?}{}", pc, ins.opcode.mnemonic(), ins.operand, line);
                    pc = ins.next_pc;
                }
                Err(_) => {
                    let _ = writeln!(out, "  {:>6}: <bad opcode {:#04x}>", pc, self.code[pc]);
                    pc += 1;
                }
            }
        }

        out
    }
}

/// Maps a short read to `Truncated` (matching the `.dsb` loader's contract
/// of failing that way on any short read) and anything else through
/// unchanged.
fn io_to_dial(err: dial_io::IoError) -> DialError {
    match err {
        dial_io::IoError::EndOfStream { expected, context } => {
            DialError::truncated(format!("expected {expected} more byte(s) while reading {context}"))
        }
        other => DialError::Io(other),
    }
}

fn read_string_table(r: &mut BinaryReader) -> DialResult<Vec<String>> {
    let count = r.read_u32().map_err(io_to_dial)?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(r.read_string_u16().map_err(io_to_dial)?);
    }
    Ok(out)
}

fn write_string_table(w: &mut BinaryWriter, entries: &[String]) {
    w.write_u32(entries.len() as u32).unwrap();
    for e in entries {
        w.write_string_u16(e).unwrap();
    }
}

/// A stable hash over metadata fields other than `metadata_hash`/
/// `code_checksum` themselves, truncated to 32 bits for the wire field.
fn compute_metadata_hash(metadata: &ModuleMetadata) -> u32 {
    let mut buf = Vec::new();
    buf.extend_from_slice(&metadata.heap_size.to_le_bytes());
    buf.extend_from_slice(metadata.app_name.as_bytes());
    buf.extend_from_slice(metadata.app_version.as_bytes());
    buf.extend_from_slice(metadata.author.as_bytes());
    buf.extend_from_slice(&metadata.timestamp.to_le_bytes());
    (xxh3_64(&buf) & 0xFFFF_FFFF) as u32
}

/// A checksum over the code section, truncated to 16 bits for the wire
/// field.
fn compute_code_checksum(code: &[u8]) -> u16 {
    (xxh3_64(code) & 0xFFFF) as u16
}

/// Confirms an opcode byte stream is at least structurally decodable,
/// without executing it. Used by the loader's optional strict mode and by
/// `disassemble`.
pub fn validate_code(code: &[u8]) -> DialResult<()> {
    let mut pc = 0usize;
    while pc < code.len() {
        let opcode = OpCode::from_u8(code[pc]).ok_or(DialError::UnknownOpcode { opcode: code[pc] })?;
        let next = pc + 1 + opcode.operand_size().byte_len();
        if next > code.len() {
            return Err(DialError::truncated(format!(
                "opcode {} missing operand bytes",
                opcode.mnemonic()
            )));
        }
        pc = next;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_builder::ModuleBuilder;

    fn sample() -> Module {
        let mut b = ModuleBuilder::new("demo", "0.1.0", "tester", 1 << 16);
        let hello = b.add_constant("hello");
        b.push_str(hello);
        b.push_op(OpCode::Print);
        b.push_op(OpCode::Halt);
        b.build()
    }

    #[test]
    fn round_trip_is_idempotent() {
        let module = sample();
        let bytes = module.serialize();
        let reloaded = Module::load(bytes.clone()).unwrap();
        assert_eq!(reloaded.serialize(), bytes);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut bytes = sample().serialize();
        bytes[0] = b'X';
        assert!(matches!(Module::load(bytes), Err(DialError::BadMagic)));
    }

    #[test]
    fn flipped_code_byte_fails_integrity_check() {
        let mut bytes = sample().serialize();
        // Corrupt a byte inside the code section without recomputing the
        // checksum, simulating an adversarial or corrupted blob.
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            Module::load(bytes),
            Err(DialError::IntegrityMismatch { .. })
        ));
    }

    #[test]
    fn disassembly_lists_every_instruction() {
        let text = sample().disassemble();
        assert!(text.contains("PUSH_STR"));
        assert!(text.contains("HALT"));
    }

    #[test]
    fn truncated_blob_fails_with_truncated_not_io() {
        let bytes = sample().serialize();
        // Cut the blob off mid-field, inside the heap_size field that
        // follows magic/version/flags.
        let truncated = &bytes[..10];
        assert!(matches!(
            Module::load(truncated.to_vec()),
            Err(DialError::Truncated { .. })
        ));
    }
}
