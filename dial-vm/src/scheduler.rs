//! The scheduler adapter contract.
//!
//! Not part of the VM proper — the Interpreter exposes `execute(budget)`
//! and the embedding host supplies the poll loop. This module documents
//! the contract and provides a synchronous reference adapter used by this
//! crate's own tests and by hosts that don't need a real async scheduler
//! (e.g. a desktop emulator driving a fixed tick rate).
//!
//! Contract: call `execute(budget)` with a positive budget (~1,000
//! instructions is a reasonable default for a cooperative batch), treat
//! [`ExecutionResult::Yield`] as "re-poll after a tick", treat
//! [`ExecutionResult::Finished`], [`ExecutionResult::Error`], and
//! [`ExecutionResult::OutOfMemory`] as terminal, and call `reset()` to
//! re-run the program.

use crate::execution_engine::{ExecutionEngine, ExecutionResult};

/// The typical per-batch instruction budget for a cooperative host loop.
pub const DEFAULT_BUDGET: u32 = 1_000;

/// Drives `engine` to a terminal [`ExecutionResult`], treating `Yield` as
/// an immediate re-poll rather than waiting for real time to pass.
///
/// This is a reference host for synchronous tests and simple embeddings —
/// it does not model real sleep latency. A scheduler backed by a real
/// clock or an async runtime should instead poll `execute` on its own
/// cadence and actually wait out `Yield`s caused by `system.sleep`.
pub fn run_to_completion(engine: &mut ExecutionEngine, budget: u32) -> ExecutionResult {
    loop {
        match engine.execute(budget) {
            ExecutionResult::Ok => continue,
            ExecutionResult::Yield => continue,
            terminal => return terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module_builder::ModuleBuilder;
    use crate::op_code::OpCode;
    use crate::platform::NullPlatform;
    use crate::pool::Pool;

    #[test]
    fn runs_a_trivial_program_to_finished() {
        let mut b = ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        b.push_op(OpCode::Halt);
        let module = b.build();

        let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(NullPlatform));
        let result = run_to_completion(&mut engine, DEFAULT_BUDGET);
        assert_eq!(result, ExecutionResult::Finished);
    }
}
