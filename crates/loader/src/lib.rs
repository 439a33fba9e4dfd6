// Minihart - RISC-V Console Payload Harness
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{anyhow, bail, Context, Result};
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use minihart_core::memory::ProgramImage;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub fn load_elf(path: &Path) -> Result<ProgramImage> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    load_elf_bytes(&buffer)
}

pub fn load_elf_bytes(buffer: &[u8]) -> Result<ProgramImage> {
    let elf = Elf::parse(buffer).context("Failed to parse ELF binary")?;

    info!("ELF Entry Point: {:#x}", elf.entry);

    if elf.header.e_machine != goblin::elf::header::EM_RISCV {
        bail!(
            "Not a RISC-V ELF (machine type {})",
            elf.header.e_machine
        );
    }

    let mut program_image = ProgramImage::new(elf.entry);

    for ph in elf.program_headers {
        if ph.p_type == PT_LOAD {
            // We only care about loadable segments
            let start_addr = ph.p_paddr; // Physical address (LMA) is what lands in RAM
            let size = ph.p_filesz as usize;
            let offset = ph.p_offset as usize;

            if size == 0 {
                continue;
            }

            debug!(
                "Found Loadable Segment: Addr={:#x}, Size={} bytes, Offset={:#x}",
                start_addr, size, offset
            );

            // checked_add: a crafted p_offset near u64::MAX must error,
            // not wrap the bounds check.
            let end = match offset.checked_add(size) {
                Some(end) if end <= buffer.len() => end,
                _ => return Err(anyhow!("Segment out of bounds in ELF file")),
            };

            let segment_data = buffer[offset..end].to_vec();
            program_image.add_segment(start_addr, segment_data);
        }
    }

    if program_image.segments.is_empty() {
        warn!("No loadable segments found in ELF file");
    }

    Ok(program_image)
}
