//! dialVM: the execution core of the dialScript embedded runtime.
//!
//! A stack-based bytecode interpreter for the `.dsb` module format: value
//! model and accounted heap ([`pool`]), bytecode container ([`module`]),
//! native dispatch table ([`native`]), host Platform facade ([`platform`]),
//! and the interpreter itself ([`execution_engine`]). Source compilation,
//! garbage collection beyond string reclamation, closures, multi-threading,
//! dynamic code loading, and any device-specific behavior are explicitly
//! out of scope — this crate only runs bytecode a host already has.
//!
//! A minimal embedding looks like:
//!
//! ```
//! use dial_vm::{ExecutionEngine, ExecutionResult, ModuleBuilder, NullPlatform, Pool};
//! use dial_vm::op_code::OpCode;
//!
//! let mut builder = ModuleBuilder::new("demo", "0.1.0", "example", 1 << 16);
//! builder.push_op(OpCode::Halt);
//! let module = builder.build();
//!
//! let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(NullPlatform));
//! assert_eq!(engine.execute(dial_vm::scheduler::DEFAULT_BUDGET), ExecutionResult::Finished);
//! ```

pub mod error;
pub mod exception_handling;
pub mod execution_context;
pub mod execution_engine;
pub mod instruction;
mod jump_table;
pub mod limits;
pub mod metrics;
pub mod module;
pub mod module_builder;
pub mod native;
pub mod op_code;
pub mod platform;
pub mod pool;
pub mod scheduler;
pub mod value;
pub mod vm_state_dump;

pub use error::{DialError, DialResult};
pub use execution_engine::{ExecutionEngine, ExecutionResult};
pub use limits::InterpreterLimits;
pub use module::Module;
pub use module_builder::ModuleBuilder;
pub use platform::{CallbackRegistry, NullPlatform, Platform};
pub use pool::Pool;
pub use value::Value;
