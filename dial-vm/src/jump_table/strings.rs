//! String opcodes: `STR_CONCAT`, `TEMPLATE_FORMAT`.

use crate::error::{DialError, DialResult};
use crate::execution_engine::ExecutionEngine;
use crate::instruction::Operand;
use crate::op_code::OpCode;
use crate::value::Value;

use super::{JumpTable, StepOutcome};

pub(super) fn register(table: &mut JumpTable) {
    table.register(OpCode::StrConcat, str_concat);
    table.register(OpCode::TemplateFormat, template_format);
}

fn missing_operand() -> DialError {
    DialError::type_mismatch("instruction operand", "none")
}

fn str_concat(engine: &mut ExecutionEngine, _operand: Operand) -> DialResult<StepOutcome> {
    let b = engine.pop()?;
    let a = engine.pop()?;
    let sa = engine.pool().to_display_string(a);
    let sb = engine.pool().to_display_string(b);
    let value = engine.intern_string(&format!("{sa}{sb}"))?;
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

/// Pops `argc` argument values, then the template String beneath them, and
/// expands each `${N}` placeholder with `to_string(args[N])`. A malformed
/// placeholder (non-numeric or out-of-range index) is left verbatim.
fn template_format(engine: &mut ExecutionEngine, operand: Operand) -> DialResult<StepOutcome> {
    let argc = operand.as_u8().ok_or_else(missing_operand)?;
    let args = engine.pop_n(argc as usize)?;
    let template_value = engine.pop()?;
    let template = engine.pool().to_display_string(template_value);

    let bytes = template.as_bytes();
    let mut rendered = String::with_capacity(template.len());
    let mut i = 0usize;
    while i < bytes.len() {
        if bytes[i] == b'$' && bytes.get(i + 1) == Some(&b'{') {
            if let Some(end) = template[i + 2..].find('}') {
                let digits = &template[i + 2..i + 2 + end];
                let placeholder_end = i + 2 + end + 1;
                match digits.parse::<usize>().ok().and_then(|n| args.get(n)) {
                    Some(value) => {
                        rendered.push_str(&engine.pool().to_display_string(*value));
                        i = placeholder_end;
                        continue;
                    }
                    None => {
                        rendered.push_str(&template[i..placeholder_end]);
                        i = placeholder_end;
                        continue;
                    }
                }
            }
        }
        let ch = template[i..].chars().next().expect("i within bounds");
        rendered.push(ch);
        i += ch.len_utf8();
    }
    let value = engine.intern_string(&rendered)?;
    engine.push(value)?;
    Ok(StepOutcome::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NullPlatform;
    use crate::pool::Pool;

    fn engine() -> ExecutionEngine {
        let b = crate::module_builder::ModuleBuilder::new("t", "0.1.0", "t", 1 << 16);
        ExecutionEngine::new(b.build(), Pool::new(1 << 16), Box::new(NullPlatform))
    }

    #[test]
    fn str_concat_joins_display_forms() {
        let mut e = engine();
        let a = e.intern_string("a=").unwrap();
        e.push(a).unwrap();
        e.push(Value::Int32(5)).unwrap();
        str_concat(&mut e, Operand::None).unwrap();
        let Value::String(handle) = e.pop().unwrap() else { panic!("expected String") };
        assert_eq!(e.pool().get_string(handle), Some("a=5"));
    }

    #[test]
    fn template_format_substitutes_positional_placeholders() {
        let mut e = engine();
        let template = e.intern_string("Hello, ${0}! You are ${1}.").unwrap();
        e.push(template).unwrap();
        let name = e.intern_string("nix").unwrap();
        e.push(name).unwrap();
        e.push(Value::Int32(30)).unwrap();
        template_format(&mut e, Operand::U8(2)).unwrap();
        let Value::String(handle) = e.pop().unwrap() else { panic!("expected String") };
        assert_eq!(e.pool().get_string(handle), Some("Hello, nix! You are 30."));
    }

    #[test]
    fn malformed_placeholder_is_preserved_verbatim() {
        let mut e = engine();
        let template = e.intern_string("value: ${9}").unwrap();
        e.push(template).unwrap();
        template_format(&mut e, Operand::U8(0)).unwrap();
        let Value::String(handle) = e.pop().unwrap() else { panic!("expected String") };
        assert_eq!(e.pool().get_string(handle), Some("value: ${9}"));
    }
}
