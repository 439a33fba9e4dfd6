// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Base address of the console port window.
pub const CONSOLE_BASE: u64 = 0x1000;

/// Window size: one RV64 machine word. Stores of any width inside the
/// window count as one character event.
pub const CONSOLE_WIDTH: u64 = 8;

/// Host-side mirror of the payload's write-only console register.
///
/// Each store the bus routes here is one character: the low byte of the
/// stored value, captured into an attachable sink and optionally echoed to
/// stdout. There is no RX path, no status register, no acknowledgment.
#[derive(Debug, Default)]
pub struct ConsolePort {
    sink: Option<Arc<Mutex<Vec<u8>>>>,
    echo_stdout: bool,
}

impl ConsolePort {
    pub fn new() -> Self {
        Self {
            sink: None,
            echo_stdout: true,
        }
    }

    /// Attach a capture sink. When `echo_stdout` is false, characters are
    /// no longer printed to stdout.
    pub fn set_sink(&mut self, sink: Option<Arc<Mutex<Vec<u8>>>>, echo_stdout: bool) {
        self.sink = sink;
        self.echo_stdout = echo_stdout;
    }

    pub fn contains(addr: u64) -> bool {
        (CONSOLE_BASE..CONSOLE_BASE + CONSOLE_WIDTH).contains(&addr)
    }

    /// One store, one character. The payload passes the character value
    /// unmasked at full register width; the host interprets the low byte.
    pub fn push(&mut self, value: u64) {
        let ch = value as u8;

        if let Some(sink) = &self.sink {
            if let Ok(mut guard) = sink.lock() {
                guard.push(ch);
            }
        }

        if self.echo_stdout {
            #[allow(unused_must_use)]
            {
                print!("{}", ch as char);
                io::stdout().flush();
            }
        }
    }
}
