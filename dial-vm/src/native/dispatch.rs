//! Numeric dispatch: routes a resolved native ID and its already-ordered
//! arguments to the matching [`Platform`] method.
//!
//! The interpreter is responsible for popping `argc` values off the
//! operand stack in reverse order and handing them to [`dispatch`] already
//! reordered as `[arg0, arg1, ...]` matching each native's declared
//! signature (see [`super::table::NATIVE_TABLE`]).

use crate::error::DialResult;
use crate::platform::{CallbackRegistry, Platform};
use crate::pool::Pool;
use crate::value::{StringHandle, Value};

use super::{subsystem::Subsystem, table, UNKNOWN};

/// The mutable collaborators a dispatched native call may need: the host
/// implementation, the accounted heap (for string args/results), and the
/// callback registry for callback-registering natives.
pub struct DispatchContext<'a> {
    pub platform: &'a mut dyn Platform,
    pub pool: &'a mut Pool,
    pub callbacks: &'a mut CallbackRegistry,
    /// Current GC roots, used when a dispatched native needs to intern a
    /// result string under memory pressure.
    pub roots: &'a [StringHandle],
}

fn int_arg(arg: Option<&Value>) -> i32 {
    match arg {
        Some(Value::Int32(i)) => *i,
        Some(Value::Float32(f)) => *f as i32,
        _ => 0,
    }
}

fn bool_arg(pool: &Pool, arg: Option<&Value>) -> bool {
    match arg {
        Some(Value::String(h)) => pool.is_string_truthy(*h),
        Some(v) => v.is_truthy_inline().unwrap_or(false),
        None => false,
    }
}

fn str_arg(pool: &Pool, arg: Option<&Value>) -> String {
    arg.map(|v| pool.to_display_string(*v)).unwrap_or_default()
}

fn string_result(ctx: &mut DispatchContext, s: &str) -> DialResult<Value> {
    ctx.pool.intern_string(s, ctx.roots).map(Value::String)
}

fn opt_string_result(ctx: &mut DispatchContext, s: Option<String>) -> DialResult<Value> {
    match s {
        Some(s) => string_result(ctx, &s),
        None => Ok(Value::Null),
    }
}

/// Registers the first argument (which must be a Function Value) under
/// `event`. `call_native` already rejects a non-Function argument for any
/// native whose signature sets `requires_callback`, so reaching here with
/// something else would mean that gate was bypassed; it is simply not
/// registered and the call answers Null.
fn register_callback(ctx: &mut DispatchContext, event: &str, callback: Option<&Value>) -> Value {
    if let Some(f @ Value::Function(_)) = callback {
        ctx.callbacks.register(event, *f);
    }
    Value::Null
}

/// Dispatches a resolved native ID. Returns `Null` for [`UNKNOWN`] or any
/// ID with no registered handler, without raising — native calls never
/// fail the VM.
pub fn dispatch(id: u16, args: &[Value], ctx: &mut DispatchContext) -> DialResult<Value> {
    if id == UNKNOWN {
        return Ok(Value::Null);
    }

    let a = |i: usize| args.get(i);

    let (subsystem_byte, _) = super::split(id);
    let Some(subsystem) = Subsystem::from_u8(subsystem_byte) else {
        return Ok(Value::Null);
    };
    let Some(sig) = table::lookup_by_id(id) else {
        return Ok(Value::Null);
    };

    use Subsystem::*;
    let result = match (subsystem, sig.name) {
        (Console, "console.print") => {
            ctx.platform.console_print(&str_arg(ctx.pool, a(0)));
            Value::Null
        }
        (Console, "console.log") => {
            ctx.platform.console_log(&str_arg(ctx.pool, a(0)));
            Value::Null
        }
        (Console, "console.error") => {
            ctx.platform.console_error(&str_arg(ctx.pool, a(0)));
            Value::Null
        }
        (Console, "console.warn") => {
            ctx.platform.console_warn(&str_arg(ctx.pool, a(0)));
            Value::Null
        }

        (Display, "display.clear") => {
            ctx.platform.display_clear(int_arg(a(0)));
            Value::Null
        }
        (Display, "display.drawText") => {
            let text = str_arg(ctx.pool, a(2));
            ctx.platform
                .display_draw_text(int_arg(a(0)), int_arg(a(1)), &text, int_arg(a(3)), int_arg(a(4)));
            Value::Null
        }
        (Display, "display.drawLine") => {
            ctx.platform
                .display_draw_line(int_arg(a(0)), int_arg(a(1)), int_arg(a(2)), int_arg(a(3)), int_arg(a(4)));
            Value::Null
        }
        (Display, "display.drawCircle") => {
            ctx.platform.display_draw_circle(
                int_arg(a(0)),
                int_arg(a(1)),
                int_arg(a(2)),
                int_arg(a(3)),
                bool_arg(ctx.pool, a(4)),
            );
            Value::Null
        }
        (Display, "display.drawRect") => {
            ctx.platform
                .display_draw_rect(int_arg(a(0)), int_arg(a(1)), int_arg(a(2)), int_arg(a(3)), int_arg(a(4)));
            Value::Null
        }
        (Display, "display.flush") => {
            ctx.platform.display_flush();
            Value::Null
        }

        (Encoder, "encoder.getButton") => Value::Bool(ctx.platform.encoder_get_button()),
        (Encoder, "encoder.getDelta") => Value::Int32(ctx.platform.encoder_get_delta()),
        (Encoder, "encoder.onTurn") => register_callback(ctx, "encoder.onTurn", a(0)),
        (Encoder, "encoder.onButton") => register_callback(ctx, "encoder.onButton", a(0)),

        (System, "system.getTime") => Value::Int32(ctx.platform.system_get_time() as i32),
        (System, "system.sleep") => {
            // Suspension itself is handled by the interpreter before
            // dispatch runs; this native exists only so CALL_NATIVE
            // resolves a signature for it.
            Value::Null
        }
        (System, "system.random") => Value::Int32(ctx.platform.system_random()),

        (Touch, "touch.getX") => Value::Int32(ctx.platform.touch_get_x()),
        (Touch, "touch.getY") => Value::Int32(ctx.platform.touch_get_y()),
        (Touch, "touch.onPress") => register_callback(ctx, "touch.onPress", a(0)),
        (Touch, "touch.onRelease") => register_callback(ctx, "touch.onRelease", a(0)),
        (Touch, "touch.onDrag") => register_callback(ctx, "touch.onDrag", a(0)),

        (Rfid, "rfid.readUid") => {
            let uid = ctx.platform.rfid_read_uid();
            return opt_string_result(ctx, uid);
        }

        (File, "file.read") => {
            let path = str_arg(ctx.pool, a(0));
            let contents = ctx.platform.file_read(&path);
            return opt_string_result(ctx, contents);
        }
        (File, "file.write") => {
            let path = str_arg(ctx.pool, a(0));
            let contents = str_arg(ctx.pool, a(1));
            Value::Bool(ctx.platform.file_write(&path, &contents))
        }
        (File, "file.exists") => {
            let path = str_arg(ctx.pool, a(0));
            Value::Bool(ctx.platform.file_exists(&path))
        }
        (File, "file.remove") => {
            let path = str_arg(ctx.pool, a(0));
            Value::Bool(ctx.platform.file_remove(&path))
        }

        (Directory, "directory.list") => {
            let path = str_arg(ctx.pool, a(0));
            let entries = ctx.platform.directory_list(&path);
            let joined = entries.join("\n");
            return string_result(ctx, &joined);
        }
        (Directory, "directory.create") => {
            let path = str_arg(ctx.pool, a(0));
            Value::Bool(ctx.platform.directory_create(&path))
        }

        (Gpio, "gpio.read") => Value::Bool(ctx.platform.gpio_read(int_arg(a(0)))),
        (Gpio, "gpio.write") => {
            ctx.platform.gpio_write(int_arg(a(0)), bool_arg(ctx.pool, a(1)));
            Value::Null
        }
        (Gpio, "gpio.setMode") => {
            ctx.platform.gpio_set_mode(int_arg(a(0)), int_arg(a(1)));
            Value::Null
        }

        (I2c, "i2c.read") => {
            let bytes = ctx.platform.i2c_read(int_arg(a(0)), int_arg(a(1)));
            Value::Int32(bytes.first().copied().unwrap_or(0) as i32)
        }
        (I2c, "i2c.write") => {
            // Only a single byte is expressible without an Array-of-Int
            // argument convention; script-level APIs pass a Buffer object
            // that the loader expands at a higher layer.
            let byte = int_arg(a(1)) as u8;
            Value::Bool(ctx.platform.i2c_write(int_arg(a(0)), &[byte]))
        }

        (Buzzer, "buzzer.tone") => {
            ctx.platform.buzzer_tone(int_arg(a(0)), int_arg(a(1)));
            Value::Null
        }
        (Buzzer, "buzzer.stop") => {
            ctx.platform.buzzer_stop();
            Value::Null
        }

        (Timer, "timer.setTimeout") => {
            let id = ctx.platform.timer_set_timeout(int_arg(a(1)));
            register_callback(ctx, &format!("timer.timeout.{id}"), a(0));
            Value::Int32(id)
        }
        (Timer, "timer.setInterval") => {
            let id = ctx.platform.timer_set_interval(int_arg(a(1)));
            register_callback(ctx, &format!("timer.interval.{id}"), a(0));
            Value::Int32(id)
        }
        (Timer, "timer.clear") => {
            ctx.platform.timer_clear(int_arg(a(0)));
            Value::Null
        }

        (Memory, "memory.free") => Value::Int32(ctx.platform.memory_free()),
        (Memory, "memory.used") => Value::Int32(ctx.platform.memory_used()),

        (Power, "power.getBattery") => Value::Int32(ctx.platform.power_get_battery()),
        (Power, "power.sleep") => {
            ctx.platform.power_sleep();
            Value::Null
        }

        (App, "app.exit") => {
            ctx.platform.app_exit();
            Value::Null
        }
        (App, "app.getName") => return string_result(ctx, &ctx.platform.app_get_name()),
        (App, "app.onLoad") => register_callback(ctx, "app.onLoad", a(0)),
        (App, "app.onSuspend") => register_callback(ctx, "app.onSuspend", a(0)),
        (App, "app.onResume") => register_callback(ctx, "app.onResume", a(0)),
        (App, "app.onUnload") => register_callback(ctx, "app.onUnload", a(0)),

        (Storage, "storage.get") => {
            let key = str_arg(ctx.pool, a(0));
            let value = ctx.platform.storage_get(&key);
            return opt_string_result(ctx, value);
        }
        (Storage, "storage.set") => {
            let key = str_arg(ctx.pool, a(0));
            let value = str_arg(ctx.pool, a(1));
            ctx.platform.storage_set(&key, &value);
            Value::Null
        }

        (Sensor, "sensor.read") => Value::Float32(ctx.platform.sensor_read(int_arg(a(0)))),

        (Wifi, "wifi.isConnected") => Value::Bool(ctx.platform.wifi_is_connected()),
        (Wifi, "wifi.connect") => {
            let ssid = str_arg(ctx.pool, a(0));
            let password = str_arg(ctx.pool, a(1));
            Value::Bool(ctx.platform.wifi_connect(&ssid, &password))
        }

        (Ipc, "ipc.send") => {
            let channel = str_arg(ctx.pool, a(0));
            let message = str_arg(ctx.pool, a(1));
            Value::Bool(ctx.platform.ipc_send(&channel, &message))
        }
        (Ipc, "ipc.receive") => {
            let message = ctx.platform.ipc_receive();
            return opt_string_result(ctx, message);
        }

        _ => Value::Null,
    };

    Ok(result)
}

/// Whether `system.sleep` was the dispatched native — the interpreter
/// checks this separately to drive the sleep latch, since the numeric
/// dispatch above never blocks.
pub fn is_sleep(id: u16) -> bool {
    id == table::lookup_by_name("system.sleep").map(|s| s.id).unwrap_or(UNKNOWN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NullPlatform;

    struct RecordingPlatform {
        logged: Vec<String>,
    }

    impl Platform for RecordingPlatform {
        fn console_log(&mut self, message: &str) {
            self.logged.push(message.to_string());
        }
    }

    #[test]
    fn console_log_reaches_the_platform() {
        let mut platform = RecordingPlatform { logged: Vec::new() };
        let mut pool = Pool::new(1 << 20);
        let mut callbacks = CallbackRegistry::new();
        let msg = pool.intern_string("hi", &[]).unwrap();

        let id = table::lookup_by_name("console.log").unwrap().id;
        let mut ctx = DispatchContext {
            platform: &mut platform,
            pool: &mut pool,
            callbacks: &mut callbacks,
            roots: &[],
        };
        dispatch(id, &[Value::String(msg)], &mut ctx).unwrap();

        assert_eq!(platform.logged, vec!["hi".to_string()]);
    }

    #[test]
    fn unknown_id_returns_null_without_error() {
        let mut platform = NullPlatform;
        let mut pool = Pool::new(1 << 20);
        let mut callbacks = CallbackRegistry::new();
        let mut ctx = DispatchContext {
            platform: &mut platform,
            pool: &mut pool,
            callbacks: &mut callbacks,
            roots: &[],
        };
        assert_eq!(dispatch(UNKNOWN, &[], &mut ctx).unwrap(), Value::Null);
    }

    #[test]
    fn encoder_on_turn_registers_the_callback() {
        let mut platform = NullPlatform;
        let mut pool = Pool::new(1 << 20);
        let mut callbacks = CallbackRegistry::new();
        let function = Value::Function(crate::value::FunctionHandle::new(0));

        let id = table::lookup_by_name("encoder.onTurn").unwrap().id;
        let mut ctx = DispatchContext {
            platform: &mut platform,
            pool: &mut pool,
            callbacks: &mut callbacks,
            roots: &[],
        };
        dispatch(id, &[function], &mut ctx).unwrap();

        assert!(callbacks.is_registered("encoder.onTurn"));
    }
}
