//! Opcode dispatch: a fixed 256-entry jump table keyed by opcode byte.
//!
//! Mirrors the jump-table pattern of mature bytecode VMs: each opcode
//! group registers its handlers into one flat array indexed by the raw
//! opcode byte, so dispatch is an array lookup plus an indirect call
//! rather than one large match. Each handler receives the already-decoded
//! [`Operand`] and mutates [`ExecutionEngine`] directly.

mod arithmetic;
mod compare;
mod constants;
mod control;
mod exceptions;
mod functions;
mod logical;
mod objects;
mod special;
mod stack;
mod strings;
mod variables;

use crate::error::DialResult;
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;

/// What a single `step()` call accomplished.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// Keep running; nothing special happened.
    Continue,
    /// `HALT` (or `app.exit`) was executed.
    Halt,
    /// `system.sleep` requested `ms` milliseconds of cooperative suspension.
    Sleep(i64),
}

pub(crate) type Handler = fn(&mut ExecutionEngine, Operand) -> DialResult<StepOutcome>;

/// A fixed array of per-opcode handlers, indexed by the raw opcode byte.
pub struct JumpTable {
    handlers: [Option<Handler>; 256],
}

impl JumpTable {
    pub fn new() -> Self {
        let mut table = Self { handlers: [None; 256] };
        stack::register(&mut table);
        constants::register(&mut table);
        variables::register(&mut table);
        arithmetic::register(&mut table);
        strings::register(&mut table);
        compare::register(&mut table);
        logical::register(&mut table);
        control::register(&mut table);
        functions::register(&mut table);
        objects::register(&mut table);
        exceptions::register(&mut table);
        special::register(&mut table);
        table
    }

    pub(crate) fn register(&mut self, opcode: OpCode, handler: Handler) {
        self.handlers[opcode.to_u8() as usize] = Some(handler);
    }

    pub(crate) fn get(&self, opcode: OpCode) -> Option<Handler> {
        self.handlers[opcode.to_u8() as usize]
    }
}

impl Default for JumpTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_assigned_opcode_has_a_handler() {
        let table = JumpTable::new();
        for byte in 0u8..=0xFF {
            if let Some(op) = OpCode::from_u8(byte) {
                assert!(table.get(op).is_some(), "missing handler for {op:?}");
            }
        }
    }
}
