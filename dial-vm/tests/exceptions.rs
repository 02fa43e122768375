mod support;

use dial_vm::module_builder::ModuleBuilder;
use dial_vm::op_code::OpCode;
use dial_vm::pool::Pool;
use dial_vm::scheduler::{run_to_completion, DEFAULT_BUDGET};
use dial_vm::{ExecutionEngine, ExecutionResult};

use support::RecordingPlatform;

/// A `THROW` inside an active `TRY` jumps to the catch target with the
/// original Value still on the stack, rather than flattening it through
/// the unhandled-exception error path.
#[test]
fn thrown_value_is_caught_and_printed() {
    let mut b = ModuleBuilder::new("exc", "0.1.0", "test", 1 << 16);
    let message = b.add_constant("boom");

    let catch_placeholder = b.push_jump_placeholder(OpCode::Try);
    b.push_str(message);
    b.push_op(OpCode::Throw);
    b.patch_jump_to_current_pc(catch_placeholder);
    b.push_op(OpCode::Print);
    b.push_op(OpCode::Halt);

    let module = b.build();
    let platform = RecordingPlatform::new();
    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(platform.clone()));

    assert_eq!(run_to_completion(&mut engine, DEFAULT_BUDGET), ExecutionResult::Finished);
    assert_eq!(platform.printed(), vec!["boom".to_string()]);
}

/// A `THROW` with no enclosing `TRY` halts the program with an error.
#[test]
fn throw_without_a_handler_is_a_fatal_error() {
    let mut b = ModuleBuilder::new("exc", "0.1.0", "test", 1 << 16);
    let message = b.add_constant("uncaught");

    b.push_str(message);
    b.push_op(OpCode::Throw);
    b.push_op(OpCode::Halt);

    let module = b.build();
    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(RecordingPlatform::new()));

    let result = run_to_completion(&mut engine, DEFAULT_BUDGET);
    assert!(matches!(result, ExecutionResult::Error(_)));
}

/// `END_TRY` discards the handler before the body finishes normally, so a
/// later throw in the same function is no longer caught by it.
#[test]
fn end_try_retires_the_handler_before_a_later_throw() {
    let mut b = ModuleBuilder::new("exc", "0.1.0", "test", 1 << 16);
    let message = b.add_constant("late");

    let catch_placeholder = b.push_jump_placeholder(OpCode::Try);
    b.push_op(OpCode::EndTry);
    let skip_catch = b.push_jump_placeholder(OpCode::Jump);
    b.patch_jump_to_current_pc(catch_placeholder);
    b.push_op(OpCode::Print); // would run if the handler were still active
    b.push_op(OpCode::Halt);
    b.patch_jump_to_current_pc(skip_catch);

    b.push_str(message);
    b.push_op(OpCode::Throw);
    b.push_op(OpCode::Halt);

    let module = b.build();
    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(RecordingPlatform::new()));

    let result = run_to_completion(&mut engine, DEFAULT_BUDGET);
    assert!(matches!(result, ExecutionResult::Error(_)));
}
