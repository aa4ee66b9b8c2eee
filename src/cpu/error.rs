//! Error types surfaced by the CPU core.

use thiserror::Error;

/// Fatal conditions raised by [`crate::cpu::Cpu::step`].
///
/// `DecodeError` is the only variant: an opcode with no entry in the
/// instruction table (an unofficial/illegal 6502 opcode) is a hard stop.
/// The core does not recover from it internally; the host decides whether
/// to terminate, reset, or resume past the faulting instruction.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuError {
    #[error("unofficial opcode 0x{opcode:02X} at pc=0x{pc:04X}")]
    DecodeError { pc: u16, opcode: u8 },
}
