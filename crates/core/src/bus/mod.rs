// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::console::ConsolePort;
use crate::memory::LinearMemory;
use crate::{SimResult, SimulationError};
use std::sync::{Arc, Mutex};

/// Base of the single RAM region, matching the usual RISC-V DRAM origin
/// the payload is linked against.
pub const DRAM_BASE: u64 = 0x8000_0000;

/// Default RAM size for tests and the CLI when nothing else is asked for.
pub const DEFAULT_RAM_SIZE: usize = 16 * 1024 * 1024;

/// The system bus: one RAM region plus the console port window.
///
/// Accesses are width-aware. A store of ANY width whose address falls in
/// the console window is exactly one character event and is never
/// byte-decomposed; everything else is byte-addressed RAM, where wide
/// stores are all-or-nothing: a store rejected at the RAM boundary leaves
/// memory untouched. The console window is write-only: loads from it are
/// memory violations, as is any access outside the two regions.
pub struct SystemBus {
    pub ram: LinearMemory,
    pub console: ConsolePort,
}

impl Default for SystemBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemBus {
    pub fn new() -> Self {
        Self::with_ram_size(DEFAULT_RAM_SIZE)
    }

    pub fn with_ram_size(size: usize) -> Self {
        Self {
            ram: LinearMemory::new(size, DRAM_BASE),
            console: ConsolePort::new(),
        }
    }

    /// Attach a console capture sink.
    ///
    /// When `echo_stdout` is false, console writes are no longer printed.
    pub fn attach_console_sink(&mut self, sink: Arc<Mutex<Vec<u8>>>, echo_stdout: bool) {
        self.console.set_sink(Some(sink), echo_stdout);
    }

    fn read_ram_u8(&self, addr: u64) -> SimResult<u8> {
        self.ram
            .read_u8(addr)
            .ok_or(SimulationError::MemoryViolation(addr))
    }

    fn write_ram(&mut self, addr: u64, bytes: &[u8]) -> SimResult<()> {
        if self.ram.write_bytes(addr, bytes) {
            Ok(())
        } else {
            Err(SimulationError::MemoryViolation(addr))
        }
    }

    pub fn read_u8(&self, addr: u64) -> SimResult<u8> {
        if ConsolePort::contains(addr) {
            // Write-only register.
            return Err(SimulationError::MemoryViolation(addr));
        }
        self.read_ram_u8(addr)
    }

    pub fn read_u16(&self, addr: u64) -> SimResult<u16> {
        let b0 = self.read_u8(addr)? as u16;
        let b1 = self.read_u8(addr + 1)? as u16;
        Ok(b0 | (b1 << 8))
    }

    pub fn read_u32(&self, addr: u64) -> SimResult<u32> {
        let lo = self.read_u16(addr)? as u32;
        let hi = self.read_u16(addr + 2)? as u32;
        Ok(lo | (hi << 16))
    }

    pub fn read_u64(&self, addr: u64) -> SimResult<u64> {
        let lo = self.read_u32(addr)? as u64;
        let hi = self.read_u32(addr + 4)? as u64;
        Ok(lo | (hi << 32))
    }

    pub fn write_u8(&mut self, addr: u64, value: u8) -> SimResult<()> {
        if ConsolePort::contains(addr) {
            self.console.push(value as u64);
            return Ok(());
        }
        self.write_ram(addr, &[value])
    }

    pub fn write_u16(&mut self, addr: u64, value: u16) -> SimResult<()> {
        if ConsolePort::contains(addr) {
            self.console.push(value as u64);
            return Ok(());
        }
        self.write_ram(addr, &value.to_le_bytes())
    }

    pub fn write_u32(&mut self, addr: u64, value: u32) -> SimResult<()> {
        if ConsolePort::contains(addr) {
            self.console.push(value as u64);
            return Ok(());
        }
        self.write_ram(addr, &value.to_le_bytes())
    }

    pub fn write_u64(&mut self, addr: u64, value: u64) -> SimResult<()> {
        if ConsolePort::contains(addr) {
            self.console.push(value);
            return Ok(());
        }
        self.write_ram(addr, &value.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured_bus() -> (SystemBus, Arc<Mutex<Vec<u8>>>) {
        let mut bus = SystemBus::with_ram_size(4096);
        let sink = Arc::new(Mutex::new(Vec::new()));
        bus.attach_console_sink(sink.clone(), false);
        (bus, sink)
    }

    #[test]
    fn ram_words_round_trip() {
        let mut bus = SystemBus::with_ram_size(4096);
        bus.write_u64(DRAM_BASE + 8, 0x1122_3344_5566_7788).unwrap();
        assert_eq!(bus.read_u64(DRAM_BASE + 8).unwrap(), 0x1122_3344_5566_7788);
        // Little endian byte order.
        assert_eq!(bus.read_u8(DRAM_BASE + 8).unwrap(), 0x88);
        assert_eq!(bus.read_u8(DRAM_BASE + 15).unwrap(), 0x11);
    }

    #[test]
    fn unmapped_access_is_a_violation() {
        let mut bus = SystemBus::with_ram_size(4096);
        assert!(matches!(
            bus.read_u8(0x4000),
            Err(SimulationError::MemoryViolation(0x4000))
        ));
        assert!(matches!(
            bus.write_u8(DRAM_BASE - 1, 0),
            Err(SimulationError::MemoryViolation(_))
        ));
    }

    #[test]
    fn rejected_wide_store_leaves_memory_untouched() {
        let mut bus = SystemBus::with_ram_size(4096);
        let last_word = DRAM_BASE + 4096 - 4;
        bus.write_u32(last_word, 0xAABB_CCDD).unwrap();

        // Straddles the end of RAM: must fail without committing low bytes.
        assert!(matches!(
            bus.write_u64(last_word, 0x1122_3344_5566_7788),
            Err(SimulationError::MemoryViolation(_))
        ));
        assert_eq!(bus.read_u32(last_word).unwrap(), 0xAABB_CCDD);
    }

    #[test]
    fn any_width_console_store_is_one_event() {
        let (mut bus, sink) = captured_bus();

        bus.write_u8(crate::console::CONSOLE_BASE, b'a').unwrap();
        bus.write_u16(crate::console::CONSOLE_BASE, b'b' as u16).unwrap();
        bus.write_u32(crate::console::CONSOLE_BASE, b'c' as u32).unwrap();
        bus.write_u64(crate::console::CONSOLE_BASE, b'd' as u64).unwrap();

        let data = sink.lock().unwrap().clone();
        assert_eq!(data, b"abcd");
    }

    #[test]
    fn console_window_is_write_only() {
        let (bus, _sink) = captured_bus();
        assert!(matches!(
            bus.read_u64(crate::console::CONSOLE_BASE),
            Err(SimulationError::MemoryViolation(_))
        ));
        assert!(matches!(
            bus.read_u8(crate::console::CONSOLE_BASE + 7),
            Err(SimulationError::MemoryViolation(_))
        ));
    }
}
