//! The interpreter: VM state plus the fetch-decode-execute loop.
//!
//! Owns the interpreter's full mutable state directly (stack, call
//! frames, exception handlers, globals, PC, sleep latch, error slot) and
//! the collaborators it needs each step (Module, Pool, Platform,
//! callback registry). Dispatch is a fixed [`JumpTable`] keyed by opcode
//! byte, mirroring the jump-table pattern used by mature bytecode VMs.

use hashbrown::HashMap;

use crate::error::{DialError, DialResult};
use crate::execution_context::CallFrame;
use crate::exception_handling::ExceptionHandler;
use crate::instruction::Instruction;
use crate::jump_table::{JumpTable, StepOutcome};
use crate::limits::InterpreterLimits;
use crate::metrics::Metrics;
use crate::module::Module;
use crate::platform::{CallbackRegistry, Platform};
use crate::pool::Pool;
use crate::value::{FunctionRef, StringHandle, Value};
use crate::vm_state_dump::{FrameSnapshot, VmStateDump};

/// Return-PC sentinel used by the implicit root frame and by synthetic
/// `invoke_function` frames: "no caller to resume", since returning from
/// either halts the program rather than resuming real bytecode.
const ROOT_RETURN_PC: usize = usize::MAX;
const ROOT_FRAME_NAME: &str = "<main>";

/// The outcome of one `execute` batch.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Budget exhausted; more instructions remain.
    Ok,
    /// Cooperatively paused (sleeping).
    Yield,
    /// The program halted or ran off the end of the code section.
    Finished,
    /// An uncaught error was recorded in the error slot.
    Error(String),
    /// The Pool's `heap_size` ceiling was exceeded even after reclamation.
    OutOfMemory,
}

/// The execution core: VM state bound to one Module, Pool, and Platform.
pub struct ExecutionEngine {
    module: Module,
    pool: Pool,
    platform: Box<dyn Platform>,
    callbacks: CallbackRegistry,
    jump_table: JumpTable,

    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    handlers: Vec<ExceptionHandler>,
    globals: Vec<Value>,
    global_index: HashMap<String, u16>,

    pc: usize,
    running: bool,
    sleeping: bool,
    sleep_until: i64,
    error: Option<String>,

    limits: InterpreterLimits,
    metrics: Metrics,
    invocation_depth: usize,
}

impl ExecutionEngine {
    pub fn new(module: Module, pool: Pool, platform: Box<dyn Platform>) -> Self {
        let main_entry_pc = module.main_entry_pc as usize;
        let global_index = module
            .globals
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i as u16))
            .collect();
        let globals = vec![Value::Null; module.globals.len()];
        let root_frame = CallFrame::new(ROOT_RETURN_PC, 0, ROOT_FRAME_NAME.to_string(), Vec::new());

        Self {
            module,
            pool,
            platform,
            callbacks: CallbackRegistry::new(),
            jump_table: JumpTable::new(),
            stack: Vec::new(),
            frames: vec![root_frame],
            handlers: Vec::new(),
            globals,
            global_index,
            pc: main_entry_pc,
            running: true,
            sleeping: false,
            sleep_until: 0,
            error: None,
            limits: InterpreterLimits::default(),
            metrics: Metrics::new(),
            invocation_depth: 0,
        }
    }

    /// Replaces the default resource ceilings (the instruction budget and
    /// Pool heap ceiling are set elsewhere; these bound the interpreter's
    /// own operand and call stacks).
    pub fn with_limits(mut self, limits: InterpreterLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> InterpreterLimits {
        self.limits
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut Pool {
        &mut self.pool
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Restores the VM to its initial state: clears the operand stack,
    /// call frames, exception handlers, and error slot, and resets PC to
    /// the Module's main entry point. Every global except `os` is reset to
    /// Null; `os`, if the host populated it, survives.
    pub fn reset(&mut self) {
        let os_index = self.global_index.get("os").copied();
        let os_value = os_index.and_then(|i| self.globals.get(i as usize).copied());

        self.stack.clear();
        self.frames.clear();
        self.frames
            .push(CallFrame::new(ROOT_RETURN_PC, 0, ROOT_FRAME_NAME.to_string(), Vec::new()));
        self.handlers.clear();
        self.globals = vec![Value::Null; self.module.globals.len()];
        if let (Some(i), Some(v)) = (os_index, os_value) {
            self.globals[i as usize] = v;
        }

        self.pc = self.module.main_entry_pc as usize;
        self.running = true;
        self.sleeping = false;
        self.sleep_until = 0;
        self.error = None;
        self.invocation_depth = 0;
        self.metrics.reset();
        log::debug!("execution engine reset to main entry pc={}", self.pc);
    }

    /// Every GC root currently reachable: the operand stack, every
    /// call-frame's locals, every global, and nothing from the exception
    /// stack (handlers carry no Values directly, only stack offsets).
    pub fn string_roots(&self) -> Vec<StringHandle> {
        let mut roots = Vec::new();
        for value in &self.stack {
            if let Value::String(h) = value {
                roots.push(*h);
            }
        }
        for frame in &self.frames {
            for local in &frame.locals {
                if let Value::String(h) = local {
                    roots.push(*h);
                }
            }
        }
        for global in &self.globals {
            if let Value::String(h) = global {
                roots.push(*h);
            }
        }
        roots
    }

    fn roots_fn(&self) -> impl Fn() -> Vec<StringHandle> + '_ {
        move || self.string_roots()
    }

    // --- Operand stack helpers ---

    pub(crate) fn push(&mut self, value: Value) -> DialResult<()> {
        if self.stack.len() >= self.limits.max_stack_size {
            return Err(DialError::stack_overflow(self.limits.max_stack_size));
        }
        self.stack.push(value);
        Ok(())
    }

    pub(crate) fn pop(&mut self) -> DialResult<Value> {
        self.stack
            .pop()
            .ok_or_else(|| DialError::stack_underflow(1, 0))
    }

    pub(crate) fn peek(&self) -> DialResult<Value> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| DialError::stack_underflow(1, 0))
    }

    pub(crate) fn pop_n(&mut self, n: usize) -> DialResult<Vec<Value>> {
        if self.stack.len() < n {
            return Err(DialError::stack_underflow(n, self.stack.len()));
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    pub(crate) fn stack_len(&self) -> usize {
        self.stack.len()
    }

    pub(crate) fn truncate_stack(&mut self, base: usize) {
        self.stack.truncate(base);
    }

    pub(crate) fn current_frame(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    pub(crate) fn current_frame_mut(&mut self) -> Option<&mut CallFrame> {
        self.frames.last_mut()
    }

    pub(crate) fn push_frame(&mut self, frame: CallFrame) -> DialResult<()> {
        if self.frames.len() >= self.limits.max_call_depth {
            return Err(DialError::stack_overflow(self.limits.max_call_depth));
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Reads local slot `index` in the current frame (Null if there is no
    /// active frame or the slot hasn't been written, per
    /// [`CallFrame::local`]). Top-level code runs inside the implicit root
    /// frame pushed at construction/reset, so this is always valid.
    pub(crate) fn local(&self, index: u8) -> Value {
        self.current_frame().map(|f| f.local(index)).unwrap_or(Value::Null)
    }

    pub(crate) fn set_local(&mut self, index: u8, value: Value) -> DialResult<()> {
        self.current_frame_mut()
            .ok_or_else(|| DialError::invalid_index("call frame", 0))?
            .set_local(index, value);
        Ok(())
    }

    /// Routes the `PRINT` instruction to the Platform's console, distinct
    /// from the `console.log` native (PRINT has no subsystem dispatch
    /// overhead and no arity beyond the one operand value).
    pub(crate) fn platform_print(&mut self, message: &str) {
        self.platform.console_print(message);
    }

    pub(crate) fn pop_frame(&mut self) -> DialResult<CallFrame> {
        self.frames
            .pop()
            .ok_or_else(|| DialError::invalid_index("call frame", 0))
    }

    pub(crate) fn push_handler(&mut self, handler: ExceptionHandler) {
        self.handlers.push(handler);
    }

    pub(crate) fn pop_handler(&mut self) -> Option<ExceptionHandler> {
        self.handlers.pop()
    }

    pub(crate) fn set_pc(&mut self, pc: usize) {
        self.pc = pc;
    }

    pub(crate) fn set_global(&mut self, index: u16, value: Value) -> DialResult<()> {
        let slot = self
            .globals
            .get_mut(index as usize)
            .ok_or_else(|| DialError::invalid_index("global", index as u32))?;
        *slot = value;
        Ok(())
    }

    pub(crate) fn get_global(&self, index: u16) -> DialResult<Value> {
        self.globals
            .get(index as usize)
            .copied()
            .ok_or_else(|| DialError::invalid_index("global", index as u32))
    }

    pub(crate) fn begin_sleep(&mut self, duration_ms: i64) {
        let now = self.platform.system_get_time();
        self.sleeping = true;
        self.sleep_until = now + duration_ms;
    }

    pub(crate) fn intern_string(&mut self, content: &str) -> DialResult<Value> {
        let roots = self.roots_fn();
        let handle = self.pool.intern_string(content, &roots)?;
        Ok(Value::String(handle))
    }

    pub(crate) fn is_truthy(&self, value: Value) -> bool {
        match value.is_truthy_inline() {
            Some(b) => b,
            None => match value {
                Value::String(h) => self.pool.is_string_truthy(h),
                _ => false,
            },
        }
    }

    pub(crate) fn allocate_object(&mut self, class_name: &str) -> DialResult<Value> {
        let roots = self.roots_fn();
        let handle = self.pool.allocate_object(class_name, &roots)?;
        Ok(Value::Object(handle))
    }

    pub(crate) fn allocate_array(&mut self, items: Vec<Value>) -> DialResult<Value> {
        let roots = self.roots_fn();
        let handle = self.pool.allocate_array(items, &roots)?;
        Ok(Value::Array(handle))
    }

    pub(crate) fn allocate_function(&mut self, function_index: u16, param_count: u8) -> DialResult<Value> {
        let roots = self.roots_fn();
        let handle = self.pool.allocate_function(function_index, param_count, &roots)?;
        Ok(Value::Function(handle))
    }

    pub(crate) fn function_ref(&self, handle_index: u16) -> DialResult<FunctionRef> {
        let entry = self.module.function(handle_index)?;
        Ok(FunctionRef::new(handle_index, entry.param_count))
    }

    pub(crate) fn dispatch_native(&mut self, id: u16, args: &[Value]) -> DialResult<Value> {
        let roots = self.roots_fn();
        let mut ctx = crate::native::DispatchContext {
            platform: self.platform.as_mut(),
            pool: &mut self.pool,
            callbacks: &mut self.callbacks,
            roots: &roots,
        };
        let result = crate::native::dispatch(id, args, &mut ctx);
        self.metrics.record_native();
        if let Err(err) = &result {
            log::warn!("native dispatch {id:#06x} failed: {err}");
        }
        result
    }

    /// Renders a read-only snapshot of VM state for host diagnostics —
    /// useful on a stack-underflow fault, and for any other fatal
    /// condition a host wants to log.
    pub fn dump_state(&self, reason: impl Into<String>) -> VmStateDump {
        VmStateDump {
            pc: self.pc,
            operand_stack_depth: self.stack.len(),
            globals: self
                .module
                .globals
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = self.globals.get(i).copied().unwrap_or(Value::Null);
                    (name.clone(), self.pool.to_display_string(value))
                })
                .collect(),
            frames: self
                .frames
                .iter()
                .map(|f| FrameSnapshot {
                    function_name: f.function_name.clone(),
                    return_pc: f.return_pc,
                    locals: f
                        .locals
                        .iter()
                        .map(|v| self.pool.to_display_string(*v))
                        .collect(),
                })
                .collect(),
            reason: reason.into(),
        }
    }

    /// The Platform-facing entry point for hardware-driven re-entry: looks
    /// up `event` in the callback registry, and if one is registered,
    /// resolves it to a function and invokes it.
    /// Returns `false` immediately — without touching VM state — if the
    /// program isn't running or no callback is registered for `event`.
    pub fn invoke_callback(&mut self, event: &str, args: Vec<Value>) -> bool {
        if !self.running {
            return false;
        }
        let Some(callback) = self.callbacks.get(event) else {
            return false;
        };
        let function = match callback {
            Value::Function(handle) => self.pool.get_function(handle),
            _ => None,
        };
        let Some(function) = function else {
            return false;
        };

        if self.invocation_depth >= self.limits.max_invocation_stack_size {
            log::error!("re-entrant callback depth exceeded for event {event:?}");
            return false;
        }
        self.invocation_depth += 1;
        let outcome = self.invoke_function(function, args);
        self.invocation_depth -= 1;

        match outcome {
            Ok(()) => true,
            Err(err) => {
                log::error!("callback {event:?} failed: {err}");
                false
            }
        }
    }

    fn fatal(&mut self, err: DialError) -> ExecutionResult {
        self.running = false;
        let message = err.to_string();
        log::error!("execution engine halted: {message}");
        if matches!(err, DialError::StackUnderflow { .. }) {
            let dump = self.dump_state(message.clone());
            self.platform.console_error(&dump.render());
        }
        self.error = Some(message.clone());
        if matches!(err, DialError::OutOfMemory { .. }) {
            ExecutionResult::OutOfMemory
        } else {
            ExecutionResult::Error(message)
        }
    }

    /// Executes up to `budget` instructions and returns the batch outcome.
    pub fn execute(&mut self, budget: u32) -> ExecutionResult {
        if !self.running {
            return match &self.error {
                Some(message) => ExecutionResult::Error(message.clone()),
                None => ExecutionResult::Finished,
            };
        }

        for _ in 0..budget {
            if self.sleeping {
                let now = self.platform.system_get_time();
                if now < self.sleep_until {
                    return ExecutionResult::Yield;
                }
                self.sleeping = false;
            }

            if self.pc >= self.module.code.len() {
                self.running = false;
                return ExecutionResult::Finished;
            }

            let instruction = match Instruction::decode(&self.module.code, self.pc) {
                Ok(ins) => ins,
                Err(err) => return self.fatal(err),
            };
            self.pc = instruction.next_pc;
            self.metrics.record_instruction();
            #[cfg(debug_assertions)]
            log::trace!("pc={} op={:?} operand={:?}", instruction.pc, instruction.opcode, instruction.operand);

            match self.step(&instruction) {
                Ok(StepOutcome::Continue) => continue,
                Ok(StepOutcome::Halt) => {
                    self.running = false;
                    log::debug!("program halted at pc={}", instruction.pc);
                    return ExecutionResult::Finished;
                }
                Ok(StepOutcome::Sleep(ms)) => {
                    self.begin_sleep(ms);
                    return ExecutionResult::Yield;
                }
                Err(err) if err.is_catchable() => {
                    if let Err(unwind_err) = self.unwind_to_handler(err) {
                        return self.fatal(unwind_err);
                    }
                }
                Err(err) => return self.fatal(err),
            }
        }

        self.metrics.record_batch();
        ExecutionResult::Ok
    }

    fn step(&mut self, instruction: &Instruction) -> DialResult<StepOutcome> {
        let handler = self
            .jump_table
            .get(instruction.opcode)
            .ok_or(DialError::UnknownOpcode {
                opcode: instruction.opcode.to_u8(),
            })?;
        handler(self, instruction.operand)
    }

    /// `THROW` with no handler becomes `UnhandledException`; with a
    /// handler, truncates the stack and jumps to `catch_pc`.
    fn unwind_to_handler(&mut self, err: DialError) -> DialResult<()> {
        let DialError::UnhandledException { message } = &err else {
            return Err(err);
        };
        match self.pop_handler() {
            Some(handler) => {
                self.truncate_stack(handler.stack_size_on_entry);
                let value = self.intern_string(message)?;
                self.push(value)?;
                self.set_pc(handler.catch_pc);
                Ok(())
            }
            None => Err(err),
        }
    }

    /// The only path external code (the Platform, from a hardware event)
    /// uses to enter the VM mid-program. Runs a nested fetch loop until
    /// the call-stack depth returns to its pre-call depth or an error
    /// occurs; on error, the VM is halted and left in place for host
    /// diagnostics.
    pub fn invoke_function(&mut self, function: FunctionRef, args: Vec<Value>) -> DialResult<()> {
        if !self.running {
            return Err(DialError::unhandled_exception("VM is not running"));
        }

        if args.len() != function.param_count as usize {
            return Err(DialError::arity_mismatch(function.param_count, args.len() as u8));
        }

        let entry = self.module.function(function.function_index)?.clone();
        let pre_invocation_depth = self.frames.len();
        let pre_invocation_stack_height = self.stack.len();
        let saved_pc = self.pc;

        let stack_base = self.stack.len();
        self.push_frame(CallFrame::new(ROOT_RETURN_PC, stack_base, entry.name.clone(), args))?;
        self.pc = entry.entry_pc as usize;

        loop {
            if self.pc >= self.module.code.len() {
                break;
            }
            let instruction = match Instruction::decode(&self.module.code, self.pc) {
                Ok(ins) => ins,
                Err(err) => {
                    self.running = false;
                    self.error = Some(err.to_string());
                    return Err(err);
                }
            };
            self.pc = instruction.next_pc;

            match self.step(&instruction) {
                Ok(StepOutcome::Continue) => {
                    if self.frames.len() <= pre_invocation_depth {
                        break;
                    }
                }
                Ok(StepOutcome::Halt) => {
                    self.running = false;
                    break;
                }
                Ok(StepOutcome::Sleep(ms)) => {
                    // A callback may not itself suspend the program;
                    // treat `system.sleep` during a callback as a no-op
                    // wait of zero duration rather than breaking the
                    // nested-loop invariant.
                    let _ = ms;
                }
                Err(err) if err.is_catchable() => {
                    if self.unwind_to_handler(err).is_err() {
                        self.running = false;
                        self.error = Some("unhandled exception during callback".to_string());
                        return Err(DialError::unhandled_exception("during callback"));
                    }
                }
                Err(err) => {
                    self.running = false;
                    self.error = Some(err.to_string());
                    return Err(err);
                }
            }
        }

        self.frames.truncate(pre_invocation_depth);
        self.stack.truncate(pre_invocation_stack_height);
        self.pc = saved_pc;

        let roots = self.roots_fn();
        let reclaimed = self.pool.reclaim_strings(&roots);
        self.metrics.record_reclaimed(reclaimed);

        Ok(())
    }
}
