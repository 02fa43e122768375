//! The Platform facade: the VM's only window onto the host.
//!
//! The facade is a pure interface held by reference — it owns no VM state.
//! The one piece of mutable state it does carry, the
//! callback registry, is modeled as a companion struct so that `Platform`
//! implementors stay free of VM plumbing; `CallbackRegistry` only stores the
//! registered functions, and `ExecutionEngine::invoke_callback` is the
//! re-entry point, looking a callback up in its own registry and calling its
//! own `invoke_function` rather than the facade holding a back-pointer into
//! the engine.

use hashbrown::HashMap;

use crate::value::Value;

/// One synchronous method per native-function subsystem operation.
///
/// Every method has a no-op default so a test double only needs to
/// override what it actually exercises.
#[allow(unused_variables)]
pub trait Platform {
    // --- Console ---
    fn console_print(&mut self, message: &str) {}
    fn console_log(&mut self, message: &str) {}
    fn console_error(&mut self, message: &str) {}
    fn console_warn(&mut self, message: &str) {}

    // --- Display ---
    fn display_clear(&mut self, color: i32) {}
    fn display_draw_text(&mut self, x: i32, y: i32, text: &str, color: i32, size: i32) {}
    fn display_draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: i32) {}
    fn display_draw_circle(&mut self, x: i32, y: i32, r: i32, color: i32, filled: bool) {}
    fn display_draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: i32) {}
    fn display_flush(&mut self) {}

    // --- Encoder ---
    fn encoder_get_button(&mut self) -> bool {
        false
    }
    fn encoder_get_delta(&mut self) -> i32 {
        0
    }

    // --- System ---
    /// Monotonically non-decreasing milliseconds since an implementation-
    /// defined epoch.
    fn system_get_time(&mut self) -> i64 {
        0
    }
    fn system_random(&mut self) -> i32 {
        0
    }

    // --- Touch ---
    fn touch_get_x(&mut self) -> i32 {
        0
    }
    fn touch_get_y(&mut self) -> i32 {
        0
    }

    // --- RFID ---
    fn rfid_read_uid(&mut self) -> Option<String> {
        None
    }

    // --- File ---
    fn file_read(&mut self, path: &str) -> Option<String> {
        None
    }
    fn file_write(&mut self, path: &str, contents: &str) -> bool {
        false
    }
    fn file_exists(&mut self, path: &str) -> bool {
        false
    }
    fn file_remove(&mut self, path: &str) -> bool {
        false
    }

    // --- Directory ---
    fn directory_list(&mut self, path: &str) -> Vec<String> {
        Vec::new()
    }
    fn directory_create(&mut self, path: &str) -> bool {
        false
    }

    // --- GPIO ---
    fn gpio_read(&mut self, pin: i32) -> bool {
        false
    }
    fn gpio_write(&mut self, pin: i32, value: bool) {}
    fn gpio_set_mode(&mut self, pin: i32, mode: i32) {}

    // --- I2C ---
    fn i2c_read(&mut self, address: i32, length: i32) -> Vec<u8> {
        Vec::new()
    }
    fn i2c_write(&mut self, address: i32, data: &[u8]) -> bool {
        false
    }

    // --- Buzzer ---
    fn buzzer_tone(&mut self, frequency: i32, duration_ms: i32) {}
    fn buzzer_stop(&mut self) {}

    // --- Timer ---
    /// Returns an opaque timer ID the script can later pass to
    /// `timer.clear`.
    fn timer_set_timeout(&mut self, delay_ms: i32) -> i32 {
        0
    }
    fn timer_set_interval(&mut self, interval_ms: i32) -> i32 {
        0
    }
    fn timer_clear(&mut self, timer_id: i32) {}

    // --- Memory ---
    fn memory_free(&mut self) -> i32 {
        0
    }
    fn memory_used(&mut self) -> i32 {
        0
    }

    // --- Power ---
    fn power_get_battery(&mut self) -> i32 {
        100
    }
    fn power_sleep(&mut self) {}

    // --- App ---
    fn app_exit(&mut self) {}
    fn app_get_name(&mut self) -> String {
        String::new()
    }

    // --- Storage ---
    fn storage_get(&mut self, key: &str) -> Option<String> {
        None
    }
    fn storage_set(&mut self, key: &str, value: &str) {}

    // --- Sensor ---
    fn sensor_read(&mut self, channel: i32) -> f32 {
        0.0
    }

    // --- WiFi ---
    fn wifi_is_connected(&mut self) -> bool {
        false
    }
    fn wifi_connect(&mut self, ssid: &str, password: &str) -> bool {
        false
    }

    // --- IPC ---
    fn ipc_send(&mut self, channel: &str, message: &str) -> bool {
        false
    }
    fn ipc_receive(&mut self) -> Option<String> {
        None
    }
}

/// A Platform that answers every call with its documented default,
/// suitable as a base for tests that only need to override a handful of
/// methods.
#[derive(Debug, Default)]
pub struct NullPlatform;

impl Platform for NullPlatform {}

/// The event-name -> Function registry owned by the facade.
///
/// Stored separately from any particular [`Platform`] implementation so
/// that callback bookkeeping is uniform across host backends.
#[derive(Debug, Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<String, Value>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            callbacks: HashMap::new(),
        }
    }

    /// Records `callback` under `event`, overwriting any prior
    /// registration (e.g. `encoder.onTurn` called twice keeps only the
    /// most recent handler).
    pub fn register(&mut self, event: &str, callback: Value) {
        self.callbacks.insert(event.to_string(), callback);
    }

    pub fn get(&self, event: &str) -> Option<Value> {
        self.callbacks.get(event).copied()
    }

    pub fn is_registered(&self, event: &str) -> bool {
        self.callbacks.contains_key(event)
    }
}
