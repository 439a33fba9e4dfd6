// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// RISC-V RV64I base integer instruction set.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Instruction {
    Lui { rd: u8, imm: u32 },              // LUI rd, imm
    Auipc { rd: u8, imm: u32 },            // AUIPC rd, imm
    Jal { rd: u8, imm: i32 },              // JAL rd, offset
    Jalr { rd: u8, rs1: u8, imm: i32 },    // JALR rd, rs1, offset
    Beq { rs1: u8, rs2: u8, imm: i32 },    // BEQ rs1, rs2, offset
    Bne { rs1: u8, rs2: u8, imm: i32 },    // BNE rs1, rs2, offset
    Blt { rs1: u8, rs2: u8, imm: i32 },    // BLT rs1, rs2, offset
    Bge { rs1: u8, rs2: u8, imm: i32 },    // BGE rs1, rs2, offset
    Bltu { rs1: u8, rs2: u8, imm: i32 },   // BLTU rs1, rs2, offset
    Bgeu { rs1: u8, rs2: u8, imm: i32 },   // BGEU rs1, rs2, offset
    Lb { rd: u8, rs1: u8, imm: i32 },      // LB rd, offset(rs1)
    Lh { rd: u8, rs1: u8, imm: i32 },      // LH rd, offset(rs1)
    Lw { rd: u8, rs1: u8, imm: i32 },      // LW rd, offset(rs1)
    Ld { rd: u8, rs1: u8, imm: i32 },      // LD rd, offset(rs1)
    Lbu { rd: u8, rs1: u8, imm: i32 },     // LBU rd, offset(rs1)
    Lhu { rd: u8, rs1: u8, imm: i32 },     // LHU rd, offset(rs1)
    Lwu { rd: u8, rs1: u8, imm: i32 },     // LWU rd, offset(rs1)
    Sb { rs1: u8, rs2: u8, imm: i32 },     // SB rs2, offset(rs1)
    Sh { rs1: u8, rs2: u8, imm: i32 },     // SH rs2, offset(rs1)
    Sw { rs1: u8, rs2: u8, imm: i32 },     // SW rs2, offset(rs1)
    Sd { rs1: u8, rs2: u8, imm: i32 },     // SD rs2, offset(rs1)
    Addi { rd: u8, rs1: u8, imm: i32 },    // ADDI rd, rs1, imm
    Slti { rd: u8, rs1: u8, imm: i32 },    // SLTI rd, rs1, imm
    Sltiu { rd: u8, rs1: u8, imm: i32 },   // SLTIU rd, rs1, imm
    Xori { rd: u8, rs1: u8, imm: i32 },    // XORI rd, rs1, imm
    Ori { rd: u8, rs1: u8, imm: i32 },     // ORI rd, rs1, imm
    Andi { rd: u8, rs1: u8, imm: i32 },    // ANDI rd, rs1, imm
    Slli { rd: u8, rs1: u8, shamt: u8 },   // SLLI rd, rs1, shamt (6-bit)
    Srli { rd: u8, rs1: u8, shamt: u8 },   // SRLI rd, rs1, shamt (6-bit)
    Srai { rd: u8, rs1: u8, shamt: u8 },   // SRAI rd, rs1, shamt (6-bit)
    Addiw { rd: u8, rs1: u8, imm: i32 },   // ADDIW rd, rs1, imm
    Slliw { rd: u8, rs1: u8, shamt: u8 },  // SLLIW rd, rs1, shamt (5-bit)
    Srliw { rd: u8, rs1: u8, shamt: u8 },  // SRLIW rd, rs1, shamt (5-bit)
    Sraiw { rd: u8, rs1: u8, shamt: u8 },  // SRAIW rd, rs1, shamt (5-bit)
    Add { rd: u8, rs1: u8, rs2: u8 },      // ADD rd, rs1, rs2
    Sub { rd: u8, rs1: u8, rs2: u8 },      // SUB rd, rs1, rs2
    Sll { rd: u8, rs1: u8, rs2: u8 },      // SLL rd, rs1, rs2
    Slt { rd: u8, rs1: u8, rs2: u8 },      // SLT rd, rs1, rs2
    Sltu { rd: u8, rs1: u8, rs2: u8 },     // SLTU rd, rs1, rs2
    Xor { rd: u8, rs1: u8, rs2: u8 },      // XOR rd, rs1, rs2
    Srl { rd: u8, rs1: u8, rs2: u8 },      // SRL rd, rs1, rs2
    Sra { rd: u8, rs1: u8, rs2: u8 },      // SRA rd, rs1, rs2
    Or { rd: u8, rs1: u8, rs2: u8 },       // OR rd, rs1, rs2
    And { rd: u8, rs1: u8, rs2: u8 },      // AND rd, rs1, rs2
    Addw { rd: u8, rs1: u8, rs2: u8 },     // ADDW rd, rs1, rs2
    Subw { rd: u8, rs1: u8, rs2: u8 },     // SUBW rd, rs1, rs2
    Sllw { rd: u8, rs1: u8, rs2: u8 },     // SLLW rd, rs1, rs2
    Srlw { rd: u8, rs1: u8, rs2: u8 },     // SRLW rd, rs1, rs2
    Sraw { rd: u8, rs1: u8, rs2: u8 },     // SRAW rd, rs1, rs2
    Fence,                                 // FENCE
    Ecall,                                 // ECALL
    Ebreak,                                // EBREAK
    Sret,                                  // SRET
    Mret,                                  // MRET
    Csrrw { rd: u8, rs1: u8, csr: u16 },   // CSRRW
    Csrrs { rd: u8, rs1: u8, csr: u16 },   // CSRRS
    Csrrc { rd: u8, rs1: u8, csr: u16 },   // CSRRC
    Csrrwi { rd: u8, imm: u8, csr: u16 },  // CSRRWI
    Csrrsi { rd: u8, imm: u8, csr: u16 },  // CSRRSI
    Csrrci { rd: u8, imm: u8, csr: u16 },  // CSRRCI
    Unknown(u32),
}

pub fn decode_rv64(inst: u32) -> Instruction {
    let opcode = inst & 0x7F;
    let rd = ((inst >> 7) & 0x1F) as u8;
    let funct3 = ((inst >> 12) & 0x7) as u8;
    let rs1 = ((inst >> 15) & 0x1F) as u8;
    let rs2 = ((inst >> 20) & 0x1F) as u8;
    let funct7 = ((inst >> 25) & 0x7F) as u8;

    match opcode {
        0x37 => {
            let imm = inst & 0xFFFF_F000;
            Instruction::Lui { rd, imm }
        }
        0x17 => {
            let imm = inst & 0xFFFF_F000;
            Instruction::Auipc { rd, imm }
        }
        0x6F => {
            // imm[20|10:1|11|19:12]
            let imm20 = (inst >> 31) & 1;
            let imm10_1 = (inst >> 21) & 0x3FF;
            let imm11 = (inst >> 20) & 1;
            let imm19_12 = (inst >> 12) & 0xFF;
            let offset = (imm20 << 20) | (imm19_12 << 12) | (imm11 << 11) | (imm10_1 << 1);
            let imm = ((offset as i32) << 11) >> 11; // sign extend 21 bits
            Instruction::Jal { rd, imm }
        }
        0x67 => {
            let imm = (inst as i32) >> 20;
            match funct3 {
                0 => Instruction::Jalr { rd, rs1, imm },
                _ => Instruction::Unknown(inst),
            }
        }
        0x63 => {
            // imm[12|10:5] ... imm[4:1|11]
            let imm12 = (inst >> 31) & 1;
            let imm10_5 = (inst >> 25) & 0x3F;
            let imm4_1 = (inst >> 8) & 0xF;
            let imm11 = (inst >> 7) & 1;
            let offset = (imm12 << 12) | (imm11 << 11) | (imm10_5 << 5) | (imm4_1 << 1);
            let imm = ((offset as i32) << 19) >> 19; // sign extend 13 bits

            match funct3 {
                0b000 => Instruction::Beq { rs1, rs2, imm },
                0b001 => Instruction::Bne { rs1, rs2, imm },
                0b100 => Instruction::Blt { rs1, rs2, imm },
                0b101 => Instruction::Bge { rs1, rs2, imm },
                0b110 => Instruction::Bltu { rs1, rs2, imm },
                0b111 => Instruction::Bgeu { rs1, rs2, imm },
                _ => Instruction::Unknown(inst),
            }
        }
        0x03 => {
            let imm = (inst as i32) >> 20;
            match funct3 {
                0b000 => Instruction::Lb { rd, rs1, imm },
                0b001 => Instruction::Lh { rd, rs1, imm },
                0b010 => Instruction::Lw { rd, rs1, imm },
                0b011 => Instruction::Ld { rd, rs1, imm },
                0b100 => Instruction::Lbu { rd, rs1, imm },
                0b101 => Instruction::Lhu { rd, rs1, imm },
                0b110 => Instruction::Lwu { rd, rs1, imm },
                _ => Instruction::Unknown(inst),
            }
        }
        0x23 => {
            let imm11_5 = (inst >> 25) & 0x7F;
            let imm4_0 = (inst >> 7) & 0x1F;
            let offset = (imm11_5 << 5) | imm4_0;
            let imm = ((offset as i32) << 20) >> 20; // sign extend 12 bits
            match funct3 {
                0b000 => Instruction::Sb { rs1, rs2, imm },
                0b001 => Instruction::Sh { rs1, rs2, imm },
                0b010 => Instruction::Sw { rs1, rs2, imm },
                0b011 => Instruction::Sd { rs1, rs2, imm },
                _ => Instruction::Unknown(inst),
            }
        }
        0x13 => {
            let imm = (inst as i32) >> 20;
            // RV64 shifts take a 6-bit shamt; the remaining high bits select
            // logical vs arithmetic.
            let shamt = ((inst >> 20) & 0x3F) as u8;
            let funct6 = (inst >> 26) & 0x3F;
            match funct3 {
                0b000 => Instruction::Addi { rd, rs1, imm },
                0b010 => Instruction::Slti { rd, rs1, imm },
                0b011 => Instruction::Sltiu { rd, rs1, imm },
                0b100 => Instruction::Xori { rd, rs1, imm },
                0b110 => Instruction::Ori { rd, rs1, imm },
                0b111 => Instruction::Andi { rd, rs1, imm },
                0b001 => match funct6 {
                    0b000000 => Instruction::Slli { rd, rs1, shamt },
                    _ => Instruction::Unknown(inst),
                },
                0b101 => match funct6 {
                    0b000000 => Instruction::Srli { rd, rs1, shamt },
                    0b010000 => Instruction::Srai { rd, rs1, shamt },
                    _ => Instruction::Unknown(inst),
                },
                _ => Instruction::Unknown(inst),
            }
        }
        0x1B => {
            let imm = (inst as i32) >> 20;
            let shamt = rs2; // 5-bit shamt for the *W shifts
            match funct3 {
                0b000 => Instruction::Addiw { rd, rs1, imm },
                0b001 => match funct7 {
                    0b0000000 => Instruction::Slliw { rd, rs1, shamt },
                    _ => Instruction::Unknown(inst),
                },
                0b101 => match funct7 {
                    0b0000000 => Instruction::Srliw { rd, rs1, shamt },
                    0b0100000 => Instruction::Sraiw { rd, rs1, shamt },
                    _ => Instruction::Unknown(inst),
                },
                _ => Instruction::Unknown(inst),
            }
        }
        0x33 => match (funct3, funct7) {
            (0b000, 0b0000000) => Instruction::Add { rd, rs1, rs2 },
            (0b000, 0b0100000) => Instruction::Sub { rd, rs1, rs2 },
            (0b001, 0b0000000) => Instruction::Sll { rd, rs1, rs2 },
            (0b010, 0b0000000) => Instruction::Slt { rd, rs1, rs2 },
            (0b011, 0b0000000) => Instruction::Sltu { rd, rs1, rs2 },
            (0b100, 0b0000000) => Instruction::Xor { rd, rs1, rs2 },
            (0b101, 0b0000000) => Instruction::Srl { rd, rs1, rs2 },
            (0b101, 0b0100000) => Instruction::Sra { rd, rs1, rs2 },
            (0b110, 0b0000000) => Instruction::Or { rd, rs1, rs2 },
            (0b111, 0b0000000) => Instruction::And { rd, rs1, rs2 },
            _ => Instruction::Unknown(inst),
        },
        0x3B => match (funct3, funct7) {
            (0b000, 0b0000000) => Instruction::Addw { rd, rs1, rs2 },
            (0b000, 0b0100000) => Instruction::Subw { rd, rs1, rs2 },
            (0b001, 0b0000000) => Instruction::Sllw { rd, rs1, rs2 },
            (0b101, 0b0000000) => Instruction::Srlw { rd, rs1, rs2 },
            (0b101, 0b0100000) => Instruction::Sraw { rd, rs1, rs2 },
            _ => Instruction::Unknown(inst),
        },
        0x0F => match funct3 {
            0b000 => Instruction::Fence,
            _ => Instruction::Unknown(inst),
        },
        0x73 => {
            let csr = ((inst >> 20) & 0xFFF) as u16;
            let uimm = rs1;
            match funct3 {
                0b000 => match (inst >> 20) & 0xFFF {
                    0x000 => Instruction::Ecall,
                    0x001 => Instruction::Ebreak,
                    0x102 => Instruction::Sret,
                    0x302 => Instruction::Mret,
                    _ => Instruction::Unknown(inst),
                },
                0b001 => Instruction::Csrrw { rd, rs1, csr },
                0b010 => Instruction::Csrrs { rd, rs1, csr },
                0b011 => Instruction::Csrrc { rd, rs1, csr },
                0b101 => Instruction::Csrrwi { rd, imm: uimm, csr },
                0b110 => Instruction::Csrrsi { rd, imm: uimm, csr },
                0b111 => Instruction::Csrrci { rd, imm: uimm, csr },
                _ => Instruction::Unknown(inst),
            }
        }
        _ => Instruction::Unknown(inst),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_op_imm() {
        // ADDI x1, x0, 5
        assert_eq!(
            decode_rv64(0x0050_0093),
            Instruction::Addi { rd: 1, rs1: 0, imm: 5 }
        );
        // ADDI x5, x5, -1
        assert_eq!(
            decode_rv64(0xFFF2_8293),
            Instruction::Addi { rd: 5, rs1: 5, imm: -1 }
        );
    }

    #[test]
    fn distinguishes_rv64_shift_immediates() {
        // SLLI x1, x2, 63 (6-bit shamt, legal only on RV64)
        assert_eq!(
            decode_rv64(0x03F1_1093),
            Instruction::Slli { rd: 1, rs1: 2, shamt: 63 }
        );
        // SRAI x1, x2, 4
        assert_eq!(
            decode_rv64(0x4041_5093),
            Instruction::Srai { rd: 1, rs1: 2, shamt: 4 }
        );
        // SRLI x1, x2, 4
        assert_eq!(
            decode_rv64(0x0041_5093),
            Instruction::Srli { rd: 1, rs1: 2, shamt: 4 }
        );
    }

    #[test]
    fn decodes_doubleword_memory_ops() {
        // LD x6, 8(x5)
        assert_eq!(
            decode_rv64(0x0082_B303),
            Instruction::Ld { rd: 6, rs1: 5, imm: 8 }
        );
        // SD x6, 0(x7)
        assert_eq!(
            decode_rv64(0x0063_B023),
            Instruction::Sd { rs1: 7, rs2: 6, imm: 0 }
        );
    }

    #[test]
    fn decodes_word_ops() {
        // ADDIW x1, x0, -1
        assert_eq!(
            decode_rv64(0xFFF0_009B),
            Instruction::Addiw { rd: 1, rs1: 0, imm: -1 }
        );
        // SUBW x3, x1, x2
        assert_eq!(
            decode_rv64(0x4020_81BB),
            Instruction::Subw { rd: 3, rs1: 1, rs2: 2 }
        );
    }

    #[test]
    fn decodes_jumps_and_branches() {
        // JAL x0, 0 (jump-to-self)
        assert_eq!(decode_rv64(0x0000_006F), Instruction::Jal { rd: 0, imm: 0 });
        // JAL x0, -20
        assert_eq!(
            decode_rv64(0xFEDF_F06F),
            Instruction::Jal { rd: 0, imm: -20 }
        );
        // BEQ x1, x2, 8
        assert_eq!(
            decode_rv64(0x0020_8463),
            Instruction::Beq { rs1: 1, rs2: 2, imm: 8 }
        );
    }

    #[test]
    fn decodes_system() {
        assert_eq!(decode_rv64(0x0000_0073), Instruction::Ecall);
        assert_eq!(decode_rv64(0x0010_0073), Instruction::Ebreak);
        assert_eq!(decode_rv64(0x3020_0073), Instruction::Mret);
        assert_eq!(decode_rv64(0x1020_0073), Instruction::Sret);
        // CSRRW x1, mscratch, x2
        assert_eq!(
            decode_rv64(0x3401_10F3),
            Instruction::Csrrw { rd: 1, rs1: 2, csr: 0x340 }
        );
    }

    #[test]
    fn unknown_encodings_are_preserved() {
        assert_eq!(decode_rv64(0xFFFF_FFFF), Instruction::Unknown(0xFFFF_FFFF));
        assert_eq!(decode_rv64(0x0000_0000), Instruction::Unknown(0));
    }
}
