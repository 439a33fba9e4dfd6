// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod bus;
pub mod console;
pub mod cpu;
pub mod decoder;
pub mod memory;

use crate::bus::SystemBus;
use crate::cpu::Hart;
use crate::memory::ProgramImage;

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error("Memory access violation at {0:#x}")]
    MemoryViolation(u64),
    #[error("Unknown instruction {inst:#010x} at {pc:#x}")]
    DecodeError { pc: u64, inst: u32 },
    #[error("Unsupported instruction {inst:#010x} at {pc:#x}")]
    UnsupportedInstruction { pc: u64, inst: u32 },
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Why a bounded run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The PC stopped advancing (a jump-to-self). This is the terminal
    /// idle state of a Minihart payload; no further observable action can
    /// follow.
    Parked(u64),
    /// The step budget ran out before the payload parked.
    MaxStepsReached,
}

/// A single-hart machine: one RV64I core on a system bus.
pub struct Machine {
    pub hart: Hart,
    pub bus: SystemBus,
    pub total_steps: u64,
}

impl Machine {
    pub fn new(bus: SystemBus) -> Self {
        Self {
            hart: Hart::new(),
            bus,
            total_steps: 0,
        }
    }

    /// Copy a program image into RAM and point the PC at its entry.
    pub fn load_image(&mut self, image: &ProgramImage) {
        for segment in &image.segments {
            if !self.bus.ram.load_from_segment(segment) {
                tracing::warn!(
                    "Failed to load segment at {:#x} - outside of memory map",
                    segment.start_addr
                );
            }
        }
        self.hart.pc = image.entry_point;
        tracing::info!("Image loaded, entry {:#x}", image.entry_point);
    }

    /// Execute one instruction.
    pub fn step(&mut self) -> SimResult<()> {
        self.total_steps += 1;
        self.hart.step(&mut self.bus)
    }

    /// Run until the hart parks or `max_steps` instructions have executed.
    ///
    /// Park detection is the bounded-time stand-in for "spins forever": an
    /// instruction that leaves the PC where it was can never make progress
    /// again on a hart with no interrupts.
    pub fn run(&mut self, max_steps: u64) -> SimResult<StopReason> {
        for _ in 0..max_steps {
            let pc_before = self.hart.pc;
            self.step()?;
            if self.hart.pc == pc_before {
                tracing::info!("Hart parked at {:#x} after {} steps", pc_before, self.total_steps);
                return Ok(StopReason::Parked(pc_before));
            }
        }
        Ok(StopReason::MaxStepsReached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SystemBus;

    #[test]
    fn run_detects_jump_to_self() {
        let mut machine = Machine::new(SystemBus::new());
        machine.hart.pc = crate::bus::DRAM_BASE;
        // JAL x0, 0: the canonical park instruction.
        machine
            .bus
            .write_u32(crate::bus::DRAM_BASE, 0x0000_006F)
            .unwrap();

        let reason = machine.run(10).unwrap();
        assert_eq!(reason, StopReason::Parked(crate::bus::DRAM_BASE));
    }

    #[test]
    fn run_reports_exhausted_budget() {
        let mut machine = Machine::new(SystemBus::new());
        machine.hart.pc = crate::bus::DRAM_BASE;
        // A straight line of ADDI x1, x1, 1 never parks.
        for i in 0..32u64 {
            machine
                .bus
                .write_u32(crate::bus::DRAM_BASE + i * 4, 0x0010_8093)
                .unwrap();
        }

        let reason = machine.run(16).unwrap();
        assert_eq!(reason, StopReason::MaxStepsReached);
        assert_eq!(machine.total_steps, 16);
    }
}
