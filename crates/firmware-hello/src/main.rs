// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Hello payload: emit one fixed message through the console port, then
//! park. The whole observable behavior of this binary is the ordered word
//! stores to `0x1000`.

#![no_std]
#![no_main]

use panic_halt as _;
use riscv_rt::entry;

use minihart_console::{park, write_str, ConsoleOut};

const MESSAGE: &str = "Hello World from RiscV C\n";

#[entry]
fn main() -> ! {
    // Sole claimant of the port; nothing else runs on this hart.
    let mut console = unsafe { ConsoleOut::claim() };

    write_str(&mut console, MESSAGE);

    // Terminal state. The host detects the stuck PC within a bounded step
    // budget; no further stores ever happen.
    park()
}
