//! The 256-entry opcode-to-descriptor instruction table.
//!
//! Built once as a `static`, populated at compile time from a flat list of
//! descriptors (see `DESCRIPTORS` below). `None` entries mark unofficial
//! opcodes; decoding one is a fatal [`crate::cpu::error::CpuError::DecodeError`].
//!
//! There is exactly one dispatch path: a tagged enum (`Mnemonic`) matched by
//! `execute::dispatch`, not a map of closures and not a second, feature-gated
//! implementation kept in parallel.

/// Addressing mode identity for a decoded instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AddrMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
    Relative,
}

/// Instruction identity, independent of addressing mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mnemonic {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
}

/// One row of the instruction table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub mnemonic: Mnemonic,
    pub mode: AddrMode,
    pub size_bytes: u8,
    pub base_cycles: u8,
    pub page_cross_penalty: u8,
}

const fn d(
    mnemonic: Mnemonic,
    mode: AddrMode,
    size_bytes: u8,
    base_cycles: u8,
    page_cross_penalty: u8,
) -> Descriptor {
    Descriptor {
        mnemonic,
        mode,
        size_bytes,
        base_cycles,
        page_cross_penalty,
    }
}

/// The flat descriptor list for all 151 official opcodes, keyed by the
/// raw opcode byte. This is the single source of truth for the table;
/// `OPCODES` below is derived from it at compile time and checked for
/// duplicate keys by construction (each literal index is written once).
static DESCRIPTORS: [(u8, Descriptor); 151] = {
    use AddrMode::*;
    use Mnemonic::*;
    [
        (0x69, d(Adc, Immediate, 2, 2, 0)),
        (0x65, d(Adc, ZeroPage, 2, 3, 0)),
        (0x75, d(Adc, ZeroPageX, 2, 4, 0)),
        (0x6D, d(Adc, Absolute, 3, 4, 0)),
        (0x7D, d(Adc, AbsoluteX, 3, 4, 1)),
        (0x79, d(Adc, AbsoluteY, 3, 4, 1)),
        (0x61, d(Adc, IndexedIndirect, 2, 6, 0)),
        (0x71, d(Adc, IndirectIndexed, 2, 5, 1)),
        (0x29, d(And, Immediate, 2, 2, 0)),
        (0x25, d(And, ZeroPage, 2, 3, 0)),
        (0x35, d(And, ZeroPageX, 2, 4, 0)),
        (0x2D, d(And, Absolute, 3, 4, 0)),
        (0x3D, d(And, AbsoluteX, 3, 4, 1)),
        (0x39, d(And, AbsoluteY, 3, 4, 1)),
        (0x21, d(And, IndexedIndirect, 2, 6, 0)),
        (0x31, d(And, IndirectIndexed, 2, 5, 1)),
        (0x0A, d(Asl, Accumulator, 1, 2, 0)),
        (0x06, d(Asl, ZeroPage, 2, 5, 0)),
        (0x16, d(Asl, ZeroPageX, 2, 6, 0)),
        (0x0E, d(Asl, Absolute, 3, 6, 0)),
        (0x1E, d(Asl, AbsoluteX, 3, 7, 0)),
        (0x90, d(Bcc, Relative, 2, 2, 1)),
        (0xB0, d(Bcs, Relative, 2, 2, 1)),
        (0xF0, d(Beq, Relative, 2, 2, 1)),
        (0x24, d(Bit, ZeroPage, 2, 3, 0)),
        (0x2C, d(Bit, Absolute, 3, 4, 0)),
        (0x30, d(Bmi, Relative, 2, 2, 1)),
        (0xD0, d(Bne, Relative, 2, 2, 1)),
        (0x10, d(Bpl, Relative, 2, 2, 1)),
        (0x00, d(Brk, Implied, 1, 7, 0)),
        (0x50, d(Bvc, Relative, 2, 2, 1)),
        (0x70, d(Bvs, Relative, 2, 2, 1)),
        (0x18, d(Clc, Implied, 1, 2, 0)),
        (0xD8, d(Cld, Implied, 1, 2, 0)),
        (0x58, d(Cli, Implied, 1, 2, 0)),
        (0xB8, d(Clv, Implied, 1, 2, 0)),
        (0xC9, d(Cmp, Immediate, 2, 2, 0)),
        (0xC5, d(Cmp, ZeroPage, 2, 3, 0)),
        (0xD5, d(Cmp, ZeroPageX, 2, 4, 0)),
        (0xCD, d(Cmp, Absolute, 3, 4, 0)),
        (0xDD, d(Cmp, AbsoluteX, 3, 4, 1)),
        (0xD9, d(Cmp, AbsoluteY, 3, 4, 1)),
        (0xC1, d(Cmp, IndexedIndirect, 2, 6, 0)),
        (0xD1, d(Cmp, IndirectIndexed, 2, 5, 1)),
        (0xE0, d(Cpx, Immediate, 2, 2, 0)),
        (0xE4, d(Cpx, ZeroPage, 2, 3, 0)),
        (0xEC, d(Cpx, Absolute, 3, 4, 0)),
        (0xC0, d(Cpy, Immediate, 2, 2, 0)),
        (0xC4, d(Cpy, ZeroPage, 2, 3, 0)),
        (0xCC, d(Cpy, Absolute, 3, 4, 0)),
        (0xC6, d(Dec, ZeroPage, 2, 5, 0)),
        (0xD6, d(Dec, ZeroPageX, 2, 6, 0)),
        (0xCE, d(Dec, Absolute, 3, 6, 0)),
        (0xDE, d(Dec, AbsoluteX, 3, 7, 0)),
        (0xCA, d(Dex, Implied, 1, 2, 0)),
        (0x88, d(Dey, Implied, 1, 2, 0)),
        (0x49, d(Eor, Immediate, 2, 2, 0)),
        (0x45, d(Eor, ZeroPage, 2, 3, 0)),
        (0x55, d(Eor, ZeroPageX, 2, 4, 0)),
        (0x4D, d(Eor, Absolute, 3, 4, 0)),
        (0x5D, d(Eor, AbsoluteX, 3, 4, 1)),
        (0x59, d(Eor, AbsoluteY, 3, 4, 1)),
        (0x41, d(Eor, IndexedIndirect, 2, 6, 0)),
        (0x51, d(Eor, IndirectIndexed, 2, 5, 1)),
        (0xE6, d(Inc, ZeroPage, 2, 5, 0)),
        (0xF6, d(Inc, ZeroPageX, 2, 6, 0)),
        (0xEE, d(Inc, Absolute, 3, 6, 0)),
        (0xFE, d(Inc, AbsoluteX, 3, 7, 0)),
        (0xE8, d(Inx, Implied, 1, 2, 0)),
        (0xC8, d(Iny, Implied, 1, 2, 0)),
        (0x4C, d(Jmp, Absolute, 3, 3, 0)),
        (0x6C, d(Jmp, Indirect, 3, 5, 0)),
        (0x20, d(Jsr, Absolute, 3, 6, 0)),
        (0xA9, d(Lda, Immediate, 2, 2, 0)),
        (0xA5, d(Lda, ZeroPage, 2, 3, 0)),
        (0xB5, d(Lda, ZeroPageX, 2, 4, 0)),
        (0xAD, d(Lda, Absolute, 3, 4, 0)),
        (0xBD, d(Lda, AbsoluteX, 3, 4, 1)),
        (0xB9, d(Lda, AbsoluteY, 3, 4, 1)),
        (0xA1, d(Lda, IndexedIndirect, 2, 6, 0)),
        (0xB1, d(Lda, IndirectIndexed, 2, 5, 1)),
        (0xA2, d(Ldx, Immediate, 2, 2, 0)),
        (0xA6, d(Ldx, ZeroPage, 2, 3, 0)),
        (0xB6, d(Ldx, ZeroPageY, 2, 4, 0)),
        (0xAE, d(Ldx, Absolute, 3, 4, 0)),
        (0xBE, d(Ldx, AbsoluteY, 3, 4, 1)),
        (0xA0, d(Ldy, Immediate, 2, 2, 0)),
        (0xA4, d(Ldy, ZeroPage, 2, 3, 0)),
        (0xB4, d(Ldy, ZeroPageX, 2, 4, 0)),
        (0xAC, d(Ldy, Absolute, 3, 4, 0)),
        (0xBC, d(Ldy, AbsoluteX, 3, 4, 1)),
        (0x4A, d(Lsr, Accumulator, 1, 2, 0)),
        (0x46, d(Lsr, ZeroPage, 2, 5, 0)),
        (0x56, d(Lsr, ZeroPageX, 2, 6, 0)),
        (0x4E, d(Lsr, Absolute, 3, 6, 0)),
        (0x5E, d(Lsr, AbsoluteX, 3, 7, 0)),
        (0xEA, d(Nop, Implied, 1, 2, 0)),
        (0x09, d(Ora, Immediate, 2, 2, 0)),
        (0x05, d(Ora, ZeroPage, 2, 3, 0)),
        (0x15, d(Ora, ZeroPageX, 2, 4, 0)),
        (0x0D, d(Ora, Absolute, 3, 4, 0)),
        (0x1D, d(Ora, AbsoluteX, 3, 4, 1)),
        (0x19, d(Ora, AbsoluteY, 3, 4, 1)),
        (0x01, d(Ora, IndexedIndirect, 2, 6, 0)),
        (0x11, d(Ora, IndirectIndexed, 2, 5, 1)),
        (0x48, d(Pha, Implied, 1, 3, 0)),
        (0x08, d(Php, Implied, 1, 3, 0)),
        (0x68, d(Pla, Implied, 1, 4, 0)),
        (0x28, d(Plp, Implied, 1, 4, 0)),
        (0x2A, d(Rol, Accumulator, 1, 2, 0)),
        (0x26, d(Rol, ZeroPage, 2, 5, 0)),
        (0x36, d(Rol, ZeroPageX, 2, 6, 0)),
        (0x2E, d(Rol, Absolute, 3, 6, 0)),
        (0x3E, d(Rol, AbsoluteX, 3, 7, 0)),
        (0x6A, d(Ror, Accumulator, 1, 2, 0)),
        (0x66, d(Ror, ZeroPage, 2, 5, 0)),
        (0x76, d(Ror, ZeroPageX, 2, 6, 0)),
        (0x6E, d(Ror, Absolute, 3, 6, 0)),
        (0x7E, d(Ror, AbsoluteX, 3, 7, 0)),
        (0x40, d(Rti, Implied, 1, 6, 0)),
        (0x60, d(Rts, Implied, 1, 6, 0)),
        (0xE9, d(Sbc, Immediate, 2, 2, 0)),
        (0xE5, d(Sbc, ZeroPage, 2, 3, 0)),
        (0xF5, d(Sbc, ZeroPageX, 2, 4, 0)),
        (0xED, d(Sbc, Absolute, 3, 4, 0)),
        (0xFD, d(Sbc, AbsoluteX, 3, 4, 1)),
        (0xF9, d(Sbc, AbsoluteY, 3, 4, 1)),
        (0xE1, d(Sbc, IndexedIndirect, 2, 6, 0)),
        (0xF1, d(Sbc, IndirectIndexed, 2, 5, 1)),
        (0x38, d(Sec, Implied, 1, 2, 0)),
        (0xF8, d(Sed, Implied, 1, 2, 0)),
        (0x78, d(Sei, Implied, 1, 2, 0)),
        (0x85, d(Sta, ZeroPage, 2, 3, 0)),
        (0x95, d(Sta, ZeroPageX, 2, 4, 0)),
        (0x8D, d(Sta, Absolute, 3, 4, 0)),
        (0x9D, d(Sta, AbsoluteX, 3, 5, 0)),
        (0x99, d(Sta, AbsoluteY, 3, 5, 0)),
        (0x81, d(Sta, IndexedIndirect, 2, 6, 0)),
        (0x91, d(Sta, IndirectIndexed, 2, 6, 0)),
        (0x86, d(Stx, ZeroPage, 2, 3, 0)),
        (0x96, d(Stx, ZeroPageY, 2, 4, 0)),
        (0x8E, d(Stx, Absolute, 3, 4, 0)),
        (0x84, d(Sty, ZeroPage, 2, 3, 0)),
        (0x94, d(Sty, ZeroPageX, 2, 4, 0)),
        (0x8C, d(Sty, Absolute, 3, 4, 0)),
        (0xAA, d(Tax, Implied, 1, 2, 0)),
        (0xA8, d(Tay, Implied, 1, 2, 0)),
        (0xBA, d(Tsx, Implied, 1, 2, 0)),
        (0x8A, d(Txa, Implied, 1, 2, 0)),
        (0x9A, d(Txs, Implied, 1, 2, 0)),
        (0x98, d(Tya, Implied, 1, 2, 0)),
    ]
};

/// The 256-entry table, derived from `DESCRIPTORS` once at compile time.
/// `None` marks an opcode outside the official set.
pub static OPCODES: [Option<Descriptor>; 256] = {
    let mut table: [Option<Descriptor>; 256] = [None; 256];
    let mut i = 0;
    while i < DESCRIPTORS.len() {
        let (opcode, descriptor) = DESCRIPTORS[i];
        table[opcode as usize] = Some(descriptor);
        i += 1;
    }
    table
};

/// Look up the descriptor for a raw opcode byte.
#[inline]
pub fn decode(opcode: u8) -> Option<Descriptor> {
    OPCODES[opcode as usize]
}
