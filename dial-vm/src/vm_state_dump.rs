//! A structured, read-only snapshot of VM state for host diagnostics.
//!
//! A fatal fault (stack underflow, a bad native call, running out of heap)
//! should hand the host something it can actually act on — globals, call
//! stack, locals — rather than a bare error string. This is a read-only
//! dump, not an interactive debugger: no stepping, no breakpoints, just a
//! snapshot taken at the moment execution stops.

/// One active call frame, rendered for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub function_name: String,
    pub return_pc: usize,
    pub locals: Vec<String>,
}

/// A point-in-time snapshot of interpreter state.
#[derive(Debug, Clone, PartialEq)]
pub struct VmStateDump {
    pub pc: usize,
    pub operand_stack_depth: usize,
    pub globals: Vec<(String, String)>,
    pub frames: Vec<FrameSnapshot>,
    pub reason: String,
}

impl VmStateDump {
    /// Renders the dump as the plain-text diagnostic the Platform's
    /// `console_error` hook receives.
    pub fn render(&self) -> String {
        use std::fmt::Write as _;
        let mut out = String::new();
        let _ = writeln!(out, "VM state dump: {}", self.reason);
        let _ = writeln!(out, "  pc={} stack_depth={}", self.pc, self.operand_stack_depth);
        let _ = writeln!(out, "  globals:");
        for (name, value) in &self.globals {
            let _ = writeln!(out, "    {name} = {value}");
        }
        let _ = writeln!(out, "  call stack ({} frame(s)):", self.frames.len());
        for (depth, frame) in self.frames.iter().enumerate() {
            let _ = writeln!(
                out,
                "    [{depth}] {} return_pc={} locals={:?}",
                frame.function_name, frame.return_pc, frame.locals
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_section() {
        let dump = VmStateDump {
            pc: 42,
            operand_stack_depth: 0,
            globals: vec![("count".to_string(), "3".to_string())],
            frames: vec![FrameSnapshot {
                function_name: "main".to_string(),
                return_pc: usize::MAX,
                locals: vec!["7".to_string()],
            }],
            reason: "stack underflow".to_string(),
        };
        let text = dump.render();
        assert!(text.contains("stack underflow"));
        assert!(text.contains("count = 3"));
        assert!(text.contains("main"));
    }
}
