// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Firmware-side accessor for the Minihart console port.
//!
//! The port is a single write-only register, one machine word wide, at a
//! fixed physical address. It is not backed by RAM; each store is an event
//! observed by the host. Consequently every character must go out as its
//! own full-width volatile store, in program order, and nothing here may be
//! merged or dropped by the compiler.

#![no_std]

/// Physical address of the console port. The host decodes stores to this
/// window; there is no status register and no acknowledgment.
pub const CONSOLE_BASE: usize = 0x1000;

/// Port register width in bytes (one RV64 machine word).
pub const CONSOLE_WIDTH: usize = 8;

/// A destination for full-width console words.
///
/// One call is one externally observable write. Implementations must not
/// buffer, reorder, or coalesce.
pub trait WordSink {
    fn put_word(&mut self, value: u64);
}

/// Handle to the memory-mapped console port.
///
/// Zero-sized; owning one stands in for owning the device. There is exactly
/// one port in the system, so the constructor is `unsafe`: the caller
/// asserts no other live handle exists.
pub struct ConsoleOut {
    _private: (),
}

impl ConsoleOut {
    /// Claim the console port.
    ///
    /// # Safety
    ///
    /// Only one handle may be live at a time, and the target must actually
    /// decode stores to [`CONSOLE_BASE`]. On any other platform a write
    /// through this handle is an arbitrary memory store.
    pub const unsafe fn claim() -> Self {
        ConsoleOut { _private: () }
    }
}

impl WordSink for ConsoleOut {
    fn put_word(&mut self, value: u64) {
        // Volatile keeps every store in the emitted code, full width and in
        // program order. The port is write-only; nothing to read back.
        unsafe {
            core::ptr::write_volatile(CONSOLE_BASE as *mut u64, value);
        }
    }
}

/// Write `bytes` to `sink`, one full-width word per byte, left to right.
///
/// The byte value is zero-extended to the port width, unmasked. An empty
/// slice performs no writes. The slice length bounds the loop; there is no
/// terminator scanning.
pub fn write_seq<S: WordSink>(sink: &mut S, bytes: &[u8]) {
    for &b in bytes {
        sink.put_word(b as u64);
    }
}

/// UTF-8 convenience wrapper over [`write_seq`].
pub fn write_str<S: WordSink>(sink: &mut S, s: &str) {
    write_seq(sink, s.as_bytes());
}

/// Terminal idle state: spin forever, performing no further observable
/// action. Deliberate "PC stuck" so a bounded-step host run can detect the
/// halt.
#[allow(clippy::empty_loop)]
pub fn park() -> ! {
    loop {}
}
