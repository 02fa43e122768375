//! The exception-handler stack pushed by `TRY` and popped by `END_TRY`/
//! `THROW`.

/// An entry on the exception-handler stack, captured at `TRY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExceptionHandler {
    /// PC to jump to when a `THROW` reaches this handler.
    pub catch_pc: usize,
    /// Operand stack height at `TRY` time; `THROW` truncates back to this
    /// before pushing the thrown value.
    pub stack_size_on_entry: usize,
}

impl ExceptionHandler {
    pub fn new(catch_pc: usize, stack_size_on_entry: usize) -> Self {
        Self {
            catch_pc,
            stack_size_on_entry,
        }
    }
}
