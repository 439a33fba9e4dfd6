// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::SystemBus;
use crate::decoder::{decode_rv64, Instruction};
use crate::{SimResult, SimulationError};

/// A single RV64I hart.
///
/// Machine mode only, no interrupts: the payload protocol needs nothing
/// more. ECALL/EBREAK trap to `mtvec` and MRET returns, so a payload that
/// installs a handler behaves; everything else in the privileged spec is
/// out of scope.
#[derive(Debug, Default)]
pub struct Hart {
    pub x: [u64; 32], // x0..x31; x0 reads as zero in logic.
    pub pc: u64,

    // Minimal machine-mode CSR file
    pub mstatus: u64,
    pub mtvec: u64,
    pub mscratch: u64,
    pub mepc: u64,
    pub mcause: u64,
    pub mtval: u64,
}

impl Hart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_reg(&self, n: u8) -> u64 {
        if n == 0 {
            0
        } else {
            self.x[n as usize]
        }
    }

    pub fn write_reg(&mut self, n: u8, val: u64) {
        if n != 0 {
            self.x[n as usize] = val;
        }
    }

    fn read_csr(&self, csr: u16) -> u64 {
        match csr {
            0x300 => self.mstatus,
            0x305 => self.mtvec,
            0x340 => self.mscratch,
            0x341 => self.mepc,
            0x342 => self.mcause,
            0x343 => self.mtval,
            _ => 0,
        }
    }

    fn write_csr(&mut self, csr: u16, val: u64) {
        match csr {
            0x300 => self.mstatus = val & 0x0000_1888, // MIE/MPIE/MPP only
            0x305 => self.mtvec = val,
            0x340 => self.mscratch = val,
            0x341 => self.mepc = val,
            0x342 => self.mcause = val,
            0x343 => self.mtval = val,
            _ => {}
        }
    }

    fn handle_trap(&mut self, cause: u64, epc: u64) {
        self.mepc = epc;
        self.mcause = cause;
        // Direct mode only; there are no vectored interrupts on this hart.
        self.pc = self.mtvec & !3;
        self.mstatus &= !(1 << 3); // Clear MIE
    }

    /// Fetch, decode, and execute one instruction against `bus`.
    pub fn step(&mut self, bus: &mut SystemBus) -> SimResult<()> {
        let pc = self.pc;
        let word = bus.read_u32(pc)?;
        let instruction = decode_rv64(word);
        tracing::debug!("PC={:#x}, Op={:#010x}, Instr={:?}", pc, word, instruction);

        let mut next_pc = pc.wrapping_add(4);

        match instruction {
            Instruction::Lui { rd, imm } => {
                self.write_reg(rd, imm as i32 as i64 as u64);
            }
            Instruction::Auipc { rd, imm } => {
                let val = pc.wrapping_add(imm as i32 as i64 as u64);
                self.write_reg(rd, val);
            }
            Instruction::Jal { rd, imm } => {
                self.write_reg(rd, pc.wrapping_add(4));
                next_pc = pc.wrapping_add(imm as i64 as u64);
            }
            Instruction::Jalr { rd, rs1, imm } => {
                let base = self.read_reg(rs1);
                let target = base.wrapping_add(imm as i64 as u64) & !1;
                self.write_reg(rd, pc.wrapping_add(4));
                next_pc = target;
            }
            Instruction::Beq { rs1, rs2, imm } => {
                if self.read_reg(rs1) == self.read_reg(rs2) {
                    next_pc = pc.wrapping_add(imm as i64 as u64);
                }
            }
            Instruction::Bne { rs1, rs2, imm } => {
                if self.read_reg(rs1) != self.read_reg(rs2) {
                    next_pc = pc.wrapping_add(imm as i64 as u64);
                }
            }
            Instruction::Blt { rs1, rs2, imm } => {
                if (self.read_reg(rs1) as i64) < (self.read_reg(rs2) as i64) {
                    next_pc = pc.wrapping_add(imm as i64 as u64);
                }
            }
            Instruction::Bge { rs1, rs2, imm } => {
                if (self.read_reg(rs1) as i64) >= (self.read_reg(rs2) as i64) {
                    next_pc = pc.wrapping_add(imm as i64 as u64);
                }
            }
            Instruction::Bltu { rs1, rs2, imm } => {
                if self.read_reg(rs1) < self.read_reg(rs2) {
                    next_pc = pc.wrapping_add(imm as i64 as u64);
                }
            }
            Instruction::Bgeu { rs1, rs2, imm } => {
                if self.read_reg(rs1) >= self.read_reg(rs2) {
                    next_pc = pc.wrapping_add(imm as i64 as u64);
                }
            }
            Instruction::Lb { rd, rs1, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                let val = bus.read_u8(addr)? as i8;
                self.write_reg(rd, val as i64 as u64);
            }
            Instruction::Lh { rd, rs1, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                let val = bus.read_u16(addr)? as i16;
                self.write_reg(rd, val as i64 as u64);
            }
            Instruction::Lw { rd, rs1, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                let val = bus.read_u32(addr)? as i32;
                self.write_reg(rd, val as i64 as u64);
            }
            Instruction::Ld { rd, rs1, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                let val = bus.read_u64(addr)?;
                self.write_reg(rd, val);
            }
            Instruction::Lbu { rd, rs1, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                let val = bus.read_u8(addr)?;
                self.write_reg(rd, val as u64);
            }
            Instruction::Lhu { rd, rs1, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                let val = bus.read_u16(addr)?;
                self.write_reg(rd, val as u64);
            }
            Instruction::Lwu { rd, rs1, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                let val = bus.read_u32(addr)?;
                self.write_reg(rd, val as u64);
            }
            Instruction::Sb { rs1, rs2, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                bus.write_u8(addr, self.read_reg(rs2) as u8)?;
            }
            Instruction::Sh { rs1, rs2, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                bus.write_u16(addr, self.read_reg(rs2) as u16)?;
            }
            Instruction::Sw { rs1, rs2, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                bus.write_u32(addr, self.read_reg(rs2) as u32)?;
            }
            Instruction::Sd { rs1, rs2, imm } => {
                let addr = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                bus.write_u64(addr, self.read_reg(rs2))?;
            }
            Instruction::Addi { rd, rs1, imm } => {
                let res = self.read_reg(rs1).wrapping_add(imm as i64 as u64);
                self.write_reg(rd, res);
            }
            Instruction::Slti { rd, rs1, imm } => {
                let val = if (self.read_reg(rs1) as i64) < imm as i64 { 1 } else { 0 };
                self.write_reg(rd, val);
            }
            Instruction::Sltiu { rd, rs1, imm } => {
                let val = if self.read_reg(rs1) < imm as i64 as u64 { 1 } else { 0 };
                self.write_reg(rd, val);
            }
            Instruction::Xori { rd, rs1, imm } => {
                self.write_reg(rd, self.read_reg(rs1) ^ (imm as i64 as u64));
            }
            Instruction::Ori { rd, rs1, imm } => {
                self.write_reg(rd, self.read_reg(rs1) | (imm as i64 as u64));
            }
            Instruction::Andi { rd, rs1, imm } => {
                self.write_reg(rd, self.read_reg(rs1) & (imm as i64 as u64));
            }
            Instruction::Slli { rd, rs1, shamt } => {
                self.write_reg(rd, self.read_reg(rs1) << shamt);
            }
            Instruction::Srli { rd, rs1, shamt } => {
                self.write_reg(rd, self.read_reg(rs1) >> shamt);
            }
            Instruction::Srai { rd, rs1, shamt } => {
                self.write_reg(rd, ((self.read_reg(rs1) as i64) >> shamt) as u64);
            }
            Instruction::Addiw { rd, rs1, imm } => {
                let res = (self.read_reg(rs1) as i32).wrapping_add(imm);
                self.write_reg(rd, res as i64 as u64);
            }
            Instruction::Slliw { rd, rs1, shamt } => {
                let res = (self.read_reg(rs1) as u32) << shamt;
                self.write_reg(rd, res as i32 as i64 as u64);
            }
            Instruction::Srliw { rd, rs1, shamt } => {
                let res = (self.read_reg(rs1) as u32) >> shamt;
                self.write_reg(rd, res as i32 as i64 as u64);
            }
            Instruction::Sraiw { rd, rs1, shamt } => {
                let res = (self.read_reg(rs1) as i32) >> shamt;
                self.write_reg(rd, res as i64 as u64);
            }
            Instruction::Add { rd, rs1, rs2 } => {
                let res = self.read_reg(rs1).wrapping_add(self.read_reg(rs2));
                self.write_reg(rd, res);
            }
            Instruction::Sub { rd, rs1, rs2 } => {
                let res = self.read_reg(rs1).wrapping_sub(self.read_reg(rs2));
                self.write_reg(rd, res);
            }
            Instruction::Sll { rd, rs1, rs2 } => {
                let shamt = self.read_reg(rs2) & 0x3F;
                self.write_reg(rd, self.read_reg(rs1) << shamt);
            }
            Instruction::Slt { rd, rs1, rs2 } => {
                let val = if (self.read_reg(rs1) as i64) < (self.read_reg(rs2) as i64) {
                    1
                } else {
                    0
                };
                self.write_reg(rd, val);
            }
            Instruction::Sltu { rd, rs1, rs2 } => {
                let val = if self.read_reg(rs1) < self.read_reg(rs2) { 1 } else { 0 };
                self.write_reg(rd, val);
            }
            Instruction::Xor { rd, rs1, rs2 } => {
                self.write_reg(rd, self.read_reg(rs1) ^ self.read_reg(rs2));
            }
            Instruction::Srl { rd, rs1, rs2 } => {
                let shamt = self.read_reg(rs2) & 0x3F;
                self.write_reg(rd, self.read_reg(rs1) >> shamt);
            }
            Instruction::Sra { rd, rs1, rs2 } => {
                let shamt = self.read_reg(rs2) & 0x3F;
                self.write_reg(rd, ((self.read_reg(rs1) as i64) >> shamt) as u64);
            }
            Instruction::Or { rd, rs1, rs2 } => {
                self.write_reg(rd, self.read_reg(rs1) | self.read_reg(rs2));
            }
            Instruction::And { rd, rs1, rs2 } => {
                self.write_reg(rd, self.read_reg(rs1) & self.read_reg(rs2));
            }
            Instruction::Addw { rd, rs1, rs2 } => {
                let res = (self.read_reg(rs1) as i32).wrapping_add(self.read_reg(rs2) as i32);
                self.write_reg(rd, res as i64 as u64);
            }
            Instruction::Subw { rd, rs1, rs2 } => {
                let res = (self.read_reg(rs1) as i32).wrapping_sub(self.read_reg(rs2) as i32);
                self.write_reg(rd, res as i64 as u64);
            }
            Instruction::Sllw { rd, rs1, rs2 } => {
                let shamt = self.read_reg(rs2) & 0x1F;
                let res = (self.read_reg(rs1) as u32) << shamt;
                self.write_reg(rd, res as i32 as i64 as u64);
            }
            Instruction::Srlw { rd, rs1, rs2 } => {
                let shamt = self.read_reg(rs2) & 0x1F;
                let res = (self.read_reg(rs1) as u32) >> shamt;
                self.write_reg(rd, res as i32 as i64 as u64);
            }
            Instruction::Sraw { rd, rs1, rs2 } => {
                let shamt = self.read_reg(rs2) & 0x1F;
                let res = (self.read_reg(rs1) as i32) >> shamt;
                self.write_reg(rd, res as i64 as u64);
            }
            Instruction::Fence => {
                // No-op on a single in-order hart.
            }
            Instruction::Ecall | Instruction::Ebreak => {
                tracing::warn!("ECALL/EBREAK at {:#x}", pc);
                let cause = if instruction == Instruction::Ecall { 11 } else { 3 };
                self.handle_trap(cause, pc);
                return Ok(());
            }
            Instruction::Mret => {
                self.pc = self.mepc;
                self.mstatus |= 1 << 3; // Re-enable MIE
                return Ok(());
            }
            Instruction::Sret => {
                // No supervisor mode on this hart.
                return Err(SimulationError::UnsupportedInstruction { pc, inst: word });
            }
            Instruction::Csrrw { rd, rs1, csr } => {
                let old = self.read_csr(csr);
                let val = self.read_reg(rs1);
                self.write_csr(csr, val);
                if rd != 0 {
                    self.write_reg(rd, old);
                }
            }
            Instruction::Csrrs { rd, rs1, csr } => {
                let old = self.read_csr(csr);
                if rs1 != 0 {
                    let val = self.read_reg(rs1);
                    self.write_csr(csr, old | val);
                }
                if rd != 0 {
                    self.write_reg(rd, old);
                }
            }
            Instruction::Csrrc { rd, rs1, csr } => {
                let old = self.read_csr(csr);
                if rs1 != 0 {
                    let val = self.read_reg(rs1);
                    self.write_csr(csr, old & !val);
                }
                if rd != 0 {
                    self.write_reg(rd, old);
                }
            }
            Instruction::Csrrwi { rd, imm, csr } => {
                let old = self.read_csr(csr);
                self.write_csr(csr, imm as u64);
                if rd != 0 {
                    self.write_reg(rd, old);
                }
            }
            Instruction::Csrrsi { rd, imm, csr } => {
                let old = self.read_csr(csr);
                if imm != 0 {
                    self.write_csr(csr, old | imm as u64);
                }
                if rd != 0 {
                    self.write_reg(rd, old);
                }
            }
            Instruction::Csrrci { rd, imm, csr } => {
                let old = self.read_csr(csr);
                if imm != 0 {
                    self.write_csr(csr, old & !(imm as u64));
                }
                if rd != 0 {
                    self.write_reg(rd, old);
                }
            }
            Instruction::Unknown(inst) => {
                tracing::error!("Unknown instruction {:#010x} at {:#x}", inst, pc);
                return Err(SimulationError::DecodeError { pc, inst });
            }
        }

        self.pc = next_pc;
        Ok(())
    }
}
