use std::cell::RefCell;
use std::rc::Rc;

use dial_vm::platform::Platform;

/// Everything a [`RecordingPlatform`] captures, shared via `Rc<RefCell<_>>`
/// so a test can still inspect it after the platform itself has been
/// moved into an `ExecutionEngine` as a `Box<dyn Platform>`.
#[derive(Default)]
pub struct Recorded {
    pub printed: Vec<String>,
    pub logged: Vec<String>,
    pub errors: Vec<String>,
    pub time_ms: i64,
}

/// A Platform double that records every console call instead of routing it
/// anywhere real.
#[derive(Clone, Default)]
pub struct RecordingPlatform {
    pub recorded: Rc<RefCell<Recorded>>,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, ms: i64) {
        self.recorded.borrow_mut().time_ms = ms;
    }

    pub fn printed(&self) -> Vec<String> {
        self.recorded.borrow().printed.clone()
    }

    pub fn logged(&self) -> Vec<String> {
        self.recorded.borrow().logged.clone()
    }
}

impl Platform for RecordingPlatform {
    fn console_print(&mut self, message: &str) {
        self.recorded.borrow_mut().printed.push(message.to_string());
    }

    fn console_log(&mut self, message: &str) {
        self.recorded.borrow_mut().logged.push(message.to_string());
    }

    fn console_error(&mut self, message: &str) {
        self.recorded.borrow_mut().errors.push(message.to_string());
    }

    fn system_get_time(&mut self) -> i64 {
        self.recorded.borrow().time_ms
    }
}
