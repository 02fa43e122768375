//! The static name -> ID table, used to resolve the legacy name-indexed
//! `CALL_NATIVE` encoding and to validate call arity before dispatch.
//!
//! This table is illustrative of the subsystems a host platform typically
//! exposes; it is not claimed to be a complete device API. Arities shown
//! here are the dispatch contract's expected argument counts, not the
//! platform's return shape.

use super::{join, Subsystem};

/// One native function's calling contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSignature {
    pub id: u16,
    pub name: &'static str,
    /// Declared argument count. `CALL_NATIVE` pops this many values
    /// regardless of the operand's `argc`; extras are popped and
    /// discarded, shortfalls raise `ArityMismatch`.
    pub arity: u8,
    /// Whether the last argument must be a `Function` Value (a
    /// callback-registering native).
    pub requires_callback: bool,
}

const fn sig(subsystem: Subsystem, function: u8, name: &'static str, arity: u8, requires_callback: bool) -> NativeSignature {
    NativeSignature {
        id: join_const(subsystem, function),
        name,
        arity,
        requires_callback,
    }
}

// `join` isn't `const fn` because `Subsystem as u16` requires a cast; a
// thin const wrapper keeps the table below declarative.
const fn join_const(subsystem: Subsystem, function: u8) -> u16 {
    ((subsystem as u16) << 8) | function as u16
}

pub static NATIVE_TABLE: &[NativeSignature] = &[
    sig(Subsystem::Console, 0x00, "console.print", 1, false),
    sig(Subsystem::Console, 0x02, "console.log", 1, false),
    sig(Subsystem::Console, 0x03, "console.error", 1, false),
    sig(Subsystem::Console, 0x04, "console.warn", 1, false),
    sig(Subsystem::Display, 0x00, "display.clear", 1, false),
    sig(Subsystem::Display, 0x01, "display.drawText", 5, false),
    sig(Subsystem::Display, 0x02, "display.drawLine", 5, false),
    sig(Subsystem::Display, 0x03, "display.drawCircle", 5, false),
    sig(Subsystem::Display, 0x04, "display.drawRect", 5, false),
    sig(Subsystem::Display, 0x05, "display.flush", 0, false),
    sig(Subsystem::Encoder, 0x00, "encoder.getButton", 0, false),
    sig(Subsystem::Encoder, 0x01, "encoder.getDelta", 0, false),
    sig(Subsystem::Encoder, 0x04, "encoder.onTurn", 1, true),
    sig(Subsystem::Encoder, 0x05, "encoder.onButton", 1, true),
    sig(Subsystem::System, 0x00, "system.getTime", 0, false),
    sig(Subsystem::System, 0x01, "system.sleep", 1, false),
    sig(Subsystem::System, 0x02, "system.random", 0, false),
    sig(Subsystem::Touch, 0x00, "touch.getX", 0, false),
    sig(Subsystem::Touch, 0x01, "touch.getY", 0, false),
    sig(Subsystem::Touch, 0x04, "touch.onPress", 1, true),
    sig(Subsystem::Touch, 0x05, "touch.onRelease", 1, true),
    sig(Subsystem::Touch, 0x06, "touch.onDrag", 1, true),
    sig(Subsystem::Rfid, 0x00, "rfid.readUid", 0, false),
    sig(Subsystem::File, 0x00, "file.read", 1, false),
    sig(Subsystem::File, 0x01, "file.write", 2, false),
    sig(Subsystem::File, 0x02, "file.exists", 1, false),
    sig(Subsystem::File, 0x03, "file.remove", 1, false),
    sig(Subsystem::Directory, 0x00, "directory.list", 1, false),
    sig(Subsystem::Directory, 0x01, "directory.create", 1, false),
    sig(Subsystem::Gpio, 0x00, "gpio.read", 1, false),
    sig(Subsystem::Gpio, 0x01, "gpio.write", 2, false),
    sig(Subsystem::Gpio, 0x02, "gpio.setMode", 2, false),
    sig(Subsystem::I2c, 0x00, "i2c.read", 2, false),
    sig(Subsystem::I2c, 0x01, "i2c.write", 2, false),
    sig(Subsystem::Buzzer, 0x00, "buzzer.tone", 2, false),
    sig(Subsystem::Buzzer, 0x01, "buzzer.stop", 0, false),
    sig(Subsystem::Timer, 0x00, "timer.setTimeout", 2, true),
    sig(Subsystem::Timer, 0x01, "timer.setInterval", 2, true),
    sig(Subsystem::Timer, 0x02, "timer.clear", 1, false),
    sig(Subsystem::Memory, 0x00, "memory.free", 0, false),
    sig(Subsystem::Memory, 0x01, "memory.used", 0, false),
    sig(Subsystem::Power, 0x00, "power.getBattery", 0, false),
    sig(Subsystem::Power, 0x01, "power.sleep", 0, false),
    sig(Subsystem::App, 0x00, "app.exit", 0, false),
    sig(Subsystem::App, 0x01, "app.getName", 0, false),
    sig(Subsystem::App, 0x02, "app.onLoad", 1, true),
    sig(Subsystem::App, 0x03, "app.onSuspend", 1, true),
    sig(Subsystem::App, 0x04, "app.onResume", 1, true),
    sig(Subsystem::App, 0x05, "app.onUnload", 1, true),
    sig(Subsystem::Storage, 0x00, "storage.get", 1, false),
    sig(Subsystem::Storage, 0x01, "storage.set", 2, false),
    sig(Subsystem::Sensor, 0x00, "sensor.read", 1, false),
    sig(Subsystem::Wifi, 0x00, "wifi.isConnected", 0, false),
    sig(Subsystem::Wifi, 0x01, "wifi.connect", 2, false),
    sig(Subsystem::Ipc, 0x00, "ipc.send", 2, false),
    sig(Subsystem::Ipc, 0x01, "ipc.receive", 0, false),
];

/// Resolves a native by its legacy function-name-table index target, i.e.
/// the name string itself (the caller has already read the name out of
/// the Module's constant/function-name table).
pub fn lookup_by_name(name: &str) -> Option<NativeSignature> {
    NATIVE_TABLE.iter().find(|sig| sig.name == name).copied()
}

pub fn lookup_by_id(id: u16) -> Option<NativeSignature> {
    NATIVE_TABLE.iter().find(|sig| sig.id == id).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_subsystem_high_byte() {
        let sleep = lookup_by_name("system.sleep").unwrap();
        assert_eq!(sleep.id, join(Subsystem::System as u8, 0x01));
    }

    #[test]
    fn callback_registering_natives_are_flagged() {
        assert!(lookup_by_name("encoder.onTurn").unwrap().requires_callback);
        assert!(!lookup_by_name("console.log").unwrap().requires_callback);
    }

    #[test]
    fn every_entry_is_addressable_by_id_and_name() {
        for entry in NATIVE_TABLE {
            assert_eq!(lookup_by_id(entry.id), Some(*entry));
        }
    }
}
