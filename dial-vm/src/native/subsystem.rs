//! The high byte of a native ID: which host subsystem a call targets.

/// High-byte subsystem tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Subsystem {
    Console = 0x00,
    Display = 0x01,
    Encoder = 0x02,
    System = 0x03,
    Touch = 0x04,
    Rfid = 0x05,
    File = 0x06,
    Directory = 0x07,
    Gpio = 0x08,
    I2c = 0x09,
    Buzzer = 0x0A,
    Timer = 0x0B,
    Memory = 0x0C,
    Power = 0x0D,
    App = 0x0E,
    Storage = 0x0F,
    Sensor = 0x10,
    Wifi = 0x11,
    Ipc = 0x12,
}

impl Subsystem {
    pub fn from_u8(byte: u8) -> Option<Self> {
        use Subsystem::*;
        Some(match byte {
            0x00 => Console,
            0x01 => Display,
            0x02 => Encoder,
            0x03 => System,
            0x04 => Touch,
            0x05 => Rfid,
            0x06 => File,
            0x07 => Directory,
            0x08 => Gpio,
            0x09 => I2c,
            0x0A => Buzzer,
            0x0B => Timer,
            0x0C => Memory,
            0x0D => Power,
            0x0E => App,
            0x0F => Storage,
            0x10 => Sensor,
            0x11 => Wifi,
            0x12 => Ipc,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        use Subsystem::*;
        match self {
            Console => "console",
            Display => "display",
            Encoder => "encoder",
            System => "system",
            Touch => "touch",
            Rfid => "rfid",
            File => "file",
            Directory => "directory",
            Gpio => "gpio",
            I2c => "i2c",
            Buzzer => "buzzer",
            Timer => "timer",
            Memory => "memory",
            Power => "power",
            App => "app",
            Storage => "storage",
            Sensor => "sensor",
            Wifi => "wifi",
            Ipc => "ipc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_assigned_byte() {
        for byte in 0x00u8..=0x12 {
            assert_eq!(Subsystem::from_u8(byte).unwrap() as u8, byte);
        }
    }
}
