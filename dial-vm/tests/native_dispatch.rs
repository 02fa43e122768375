mod support;

use dial_vm::module_builder::ModuleBuilder;
use dial_vm::op_code::OpCode;
use dial_vm::pool::Pool;
use dial_vm::scheduler::{run_to_completion, DEFAULT_BUDGET};
use dial_vm::{ExecutionEngine, ExecutionResult};

use support::RecordingPlatform;

/// `CALL_NATIVE` against the legacy name-indexed encoding (no
/// `NATIVE_IDS_DIRECT` flag) resolves `console.log` by its constant-pool
/// name and reaches the Platform double.
#[test]
fn call_native_reaches_the_platform_through_name_lookup() {
    let mut b = ModuleBuilder::new("native", "0.1.0", "test", 1 << 16);
    let name_idx = b.add_constant("console.log");
    let message = b.add_constant("hello from bytecode");

    b.push_str(message);
    b.push_index_and_count(OpCode::CallNative, name_idx, 1);
    b.push_op(OpCode::Pop); // CALL_NATIVE always pushes a result (Null here)
    b.push_op(OpCode::Halt);

    let module = b.build();
    let platform = RecordingPlatform::new();
    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(platform.clone()));

    assert_eq!(run_to_completion(&mut engine, DEFAULT_BUDGET), ExecutionResult::Finished);
    assert_eq!(platform.logged(), vec!["hello from bytecode".to_string()]);
}

/// A native ID with no matching table entry dispatches to `Null` rather
/// than raising, regardless of how it was reached.
#[test]
fn unresolved_native_name_is_a_soft_no_op() {
    let mut b = ModuleBuilder::new("native", "0.1.0", "test", 1 << 16);
    let name_idx = b.add_constant("not.a.real.native");

    b.push_op(OpCode::PushNull);
    b.push_index_and_count(OpCode::CallNative, name_idx, 1);
    b.push_op(OpCode::Print);
    b.push_op(OpCode::Halt);

    let module = b.build();
    let platform = RecordingPlatform::new();
    let mut engine = ExecutionEngine::new(module, Pool::new(1 << 16), Box::new(platform.clone()));

    assert_eq!(run_to_completion(&mut engine, DEFAULT_BUDGET), ExecutionResult::Finished);
    assert_eq!(platform.printed(), vec!["null".to_string()]);
}
