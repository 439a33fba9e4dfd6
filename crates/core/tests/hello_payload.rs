// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! End-to-end run of a hand-assembled console payload: the same loop the
//! firmware-hello crate compiles to, built here instruction by instruction
//! so the test is self-contained.

use std::sync::{Arc, Mutex};

use minihart_core::bus::{SystemBus, DRAM_BASE};
use minihart_core::console::CONSOLE_BASE;
use minihart_core::memory::ProgramImage;
use minihart_core::{Machine, StopReason};

const MESSAGE: &[u8] = b"Hello World from RiscV C\n";

// Minimal RV64I encoders, enough for the payload loop.

fn i_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm: i32) -> u32 {
    ((imm as u32 & 0xFFF) << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0x13, rd, 0b000, rs1, imm)
}

fn lbu(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0x03, rd, 0b100, rs1, imm)
}

fn sd(rs2: u32, rs1: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 5) & 0x7F) << 25
        | rs2 << 20
        | rs1 << 15
        | 0b011 << 12
        | (imm & 0x1F) << 7
        | 0x23
}

fn beq(rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 12) & 1) << 31
        | ((imm >> 5) & 0x3F) << 25
        | rs2 << 20
        | rs1 << 15
        | ((imm >> 1) & 0xF) << 8
        | ((imm >> 11) & 1) << 7
        | 0x63
}

fn jal(rd: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    ((imm >> 20) & 1) << 31
        | ((imm >> 1) & 0x3FF) << 21
        | ((imm >> 11) & 1) << 20
        | ((imm >> 12) & 0xFF) << 12
        | rd << 7
        | 0x6F
}

fn lui(rd: u32, imm20: u32) -> u32 {
    (imm20 << 12) | (rd << 7) | 0x37
}

fn auipc(rd: u32, imm20: u32) -> u32 {
    (imm20 << 12) | (rd << 7) | 0x17
}

/// The payload: walk a length-bounded message, one SD to the console port
/// per byte, then park on a jump-to-self.
///
/// Register use: x5 message cursor, x6 remaining count, x7 port address,
/// x28 current character. Message lives at code base + 0x40.
fn assemble_payload(msg_len: i32) -> Vec<u32> {
    vec![
        lui(7, (CONSOLE_BASE >> 12) as u32), // 0x00: x7  = 0x1000
        auipc(5, 0),                         // 0x04: x5  = pc
        addi(5, 5, 0x40 - 4),                // 0x08: x5  = message base
        addi(6, 0, msg_len),                 // 0x0c: x6  = length
        beq(6, 0, 24),                       // 0x10: loop: done? -> park
        lbu(28, 5, 0),                       // 0x14: x28 = *x5
        sd(28, 7, 0),                        // 0x18: port <- x28 (one event)
        addi(5, 5, 1),                       // 0x1c
        addi(6, 6, -1),                      // 0x20
        jal(0, -20),                         // 0x24: -> loop
        jal(0, 0),                           // 0x28: park
    ]
}

const PARK_PC: u64 = DRAM_BASE + 0x28;

fn image_with_payload(msg: &[u8]) -> ProgramImage {
    let code = assemble_payload(msg.len() as i32);
    let bytes: Vec<u8> = code.iter().flat_map(|w| w.to_le_bytes()).collect();

    let mut image = ProgramImage::new(DRAM_BASE);
    image.add_segment(DRAM_BASE, bytes);
    if !msg.is_empty() {
        image.add_segment(DRAM_BASE + 0x40, msg.to_vec());
    }
    image
}

fn captured_machine(image: &ProgramImage) -> (Machine, Arc<Mutex<Vec<u8>>>) {
    let mut machine = Machine::new(SystemBus::new());
    let sink = Arc::new(Mutex::new(Vec::new()));
    machine.bus.attach_console_sink(sink.clone(), false);
    machine.load_image(image);
    (machine, sink)
}

#[test]
fn payload_emits_message_then_parks() {
    let image = image_with_payload(MESSAGE);
    let (mut machine, sink) = captured_machine(&image);

    let reason = machine.run(10_000).unwrap();
    assert_eq!(reason, StopReason::Parked(PARK_PC));

    let captured = sink.lock().unwrap().clone();
    assert_eq!(captured, MESSAGE);
    assert_eq!(captured.len(), MESSAGE.len(), "exactly one write per character");
}

#[test]
fn parked_machine_never_writes_again() {
    let image = image_with_payload(MESSAGE);
    let (mut machine, sink) = captured_machine(&image);

    machine.run(10_000).unwrap();
    let len_at_park = sink.lock().unwrap().len();

    // Keep stepping well past the park; the port must stay silent.
    for _ in 0..256 {
        machine.step().unwrap();
    }
    assert_eq!(sink.lock().unwrap().len(), len_at_park);
    assert_eq!(machine.hart.pc, PARK_PC);
}

#[test]
fn empty_message_parks_without_writing() {
    let image = image_with_payload(b"");
    let (mut machine, sink) = captured_machine(&image);

    let reason = machine.run(1_000).unwrap();
    assert_eq!(reason, StopReason::Parked(PARK_PC));
    assert!(sink.lock().unwrap().is_empty());
}

#[test]
fn two_runs_back_to_back_double_the_stream() {
    // Re-enter the writer after the first park: same message, two
    // identical back-to-back sequences, no interleaving or omission.
    let image = image_with_payload(MESSAGE);
    let (mut machine, sink) = captured_machine(&image);

    machine.run(10_000).unwrap();
    machine.hart.pc = DRAM_BASE;
    machine.run(10_000).unwrap();

    let captured = sink.lock().unwrap().clone();
    assert_eq!(captured.len(), MESSAGE.len() * 2);
    assert_eq!(&captured[..MESSAGE.len()], MESSAGE);
    assert_eq!(&captured[MESSAGE.len()..], MESSAGE);
}

#[test]
fn step_budget_short_of_park_reports_exhaustion() {
    let image = image_with_payload(MESSAGE);
    let (mut machine, _sink) = captured_machine(&image);

    let reason = machine.run(10).unwrap();
    assert_eq!(reason, StopReason::MaxStepsReached);
}
