//! Execution handlers for the 56 official 6502 operations.
//!
//! Each handler is a function of CPU + Bus state, reached from
//! [`dispatch`] by matching on [`Mnemonic`] rather than through a table of
//! function pointers or boxed closures, so the whole opcode space is
//! exhaustively checked by the compiler.

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::cpu::flags::{self, CARRY, NEGATIVE, OVERFLOW, ZERO};
use crate::cpu::table::Mnemonic;

#[inline]
fn page(addr: u16) -> u16 {
    addr & 0xFF00
}

/// Dispatch one decoded instruction. Returns extra cycles beyond the
/// table's base cost (nonzero only for taken/page-crossing branches).
pub(crate) fn dispatch(
    cpu: &mut Cpu,
    bus: &mut Bus,
    mnemonic: Mnemonic,
    ea: u16,
    accumulator_mode: bool,
    page_crossed: bool,
) -> u64 {
    use Mnemonic::*;
    match mnemonic {
        Adc => {
            let m = bus.read8(ea);
            adc(cpu, m);
            0
        }
        Sbc => {
            let m = bus.read8(ea);
            adc(cpu, !m);
            0
        }
        And => {
            let m = bus.read8(ea);
            cpu.a &= m;
            flags::update_zn(&mut cpu.status, cpu.a);
            0
        }
        Ora => {
            let m = bus.read8(ea);
            cpu.a |= m;
            flags::update_zn(&mut cpu.status, cpu.a);
            0
        }
        Eor => {
            let m = bus.read8(ea);
            cpu.a ^= m;
            flags::update_zn(&mut cpu.status, cpu.a);
            0
        }
        Asl => {
            rmw(cpu, bus, ea, accumulator_mode, |status, v| {
                flags::set(status, CARRY, v & 0x80 != 0);
                let r = v << 1;
                flags::update_zn(status, r);
                r
            });
            0
        }
        Lsr => {
            rmw(cpu, bus, ea, accumulator_mode, |status, v| {
                flags::set(status, CARRY, v & 0x01 != 0);
                let r = v >> 1;
                flags::update_zn(status, r);
                r
            });
            0
        }
        Rol => {
            rmw(cpu, bus, ea, accumulator_mode, |status, v| {
                let carry_in = flags::is_set(*status, CARRY) as u8;
                flags::set(status, CARRY, v & 0x80 != 0);
                let r = (v << 1) | carry_in;
                flags::update_zn(status, r);
                r
            });
            0
        }
        Ror => {
            rmw(cpu, bus, ea, accumulator_mode, |status, v| {
                let carry_in = flags::is_set(*status, CARRY) as u8;
                flags::set(status, CARRY, v & 0x01 != 0);
                let r = (v >> 1) | (carry_in << 7);
                flags::update_zn(status, r);
                r
            });
            0
        }
        Bit => {
            let m = bus.read8(ea);
            flags::set(&mut cpu.status, ZERO, (cpu.a & m) == 0);
            flags::set(&mut cpu.status, OVERFLOW, m & 0x40 != 0);
            flags::set(&mut cpu.status, NEGATIVE, m & 0x80 != 0);
            0
        }
        Cmp => {
            let m = bus.read8(ea);
            cmp_generic(cpu, cpu.a, m);
            0
        }
        Cpx => {
            let m = bus.read8(ea);
            cmp_generic(cpu, cpu.x, m);
            0
        }
        Cpy => {
            let m = bus.read8(ea);
            cmp_generic(cpu, cpu.y, m);
            0
        }
        Lda => {
            cpu.a = bus.read8(ea);
            flags::update_zn(&mut cpu.status, cpu.a);
            0
        }
        Ldx => {
            cpu.x = bus.read8(ea);
            flags::update_zn(&mut cpu.status, cpu.x);
            0
        }
        Ldy => {
            cpu.y = bus.read8(ea);
            flags::update_zn(&mut cpu.status, cpu.y);
            0
        }
        Sta => {
            bus.write8(ea, cpu.a);
            0
        }
        Stx => {
            bus.write8(ea, cpu.x);
            0
        }
        Sty => {
            bus.write8(ea, cpu.y);
            0
        }
        Tax => {
            cpu.x = cpu.a;
            flags::update_zn(&mut cpu.status, cpu.x);
            0
        }
        Tay => {
            cpu.y = cpu.a;
            flags::update_zn(&mut cpu.status, cpu.y);
            0
        }
        Txa => {
            cpu.a = cpu.x;
            flags::update_zn(&mut cpu.status, cpu.a);
            0
        }
        Tya => {
            cpu.a = cpu.y;
            flags::update_zn(&mut cpu.status, cpu.a);
            0
        }
        Tsx => {
            cpu.x = cpu.sp;
            flags::update_zn(&mut cpu.status, cpu.x);
            0
        }
        Txs => {
            cpu.sp = cpu.x;
            0
        }
        Pha => {
            cpu.push8(bus, cpu.a);
            0
        }
        Pla => {
            cpu.a = cpu.pull8(bus);
            flags::update_zn(&mut cpu.status, cpu.a);
            0
        }
        Php => {
            cpu.push8(bus, cpu.status | flags::BREAK);
            0
        }
        Plp => {
            let v = cpu.pull8(bus);
            cpu.status = (v | flags::UNUSED) & !flags::BREAK;
            0
        }
        Inc => {
            rmw(cpu, bus, ea, false, |status, v| {
                let r = v.wrapping_add(1);
                flags::update_zn(status, r);
                r
            });
            0
        }
        Dec => {
            rmw(cpu, bus, ea, false, |status, v| {
                let r = v.wrapping_sub(1);
                flags::update_zn(status, r);
                r
            });
            0
        }
        Inx => {
            cpu.x = cpu.x.wrapping_add(1);
            flags::update_zn(&mut cpu.status, cpu.x);
            0
        }
        Dex => {
            cpu.x = cpu.x.wrapping_sub(1);
            flags::update_zn(&mut cpu.status, cpu.x);
            0
        }
        Iny => {
            cpu.y = cpu.y.wrapping_add(1);
            flags::update_zn(&mut cpu.status, cpu.y);
            0
        }
        Dey => {
            cpu.y = cpu.y.wrapping_sub(1);
            flags::update_zn(&mut cpu.status, cpu.y);
            0
        }
        Clc => {
            flags::set(&mut cpu.status, CARRY, false);
            0
        }
        Sec => {
            flags::set(&mut cpu.status, CARRY, true);
            0
        }
        Cli => {
            flags::set(&mut cpu.status, flags::INTERRUPT_DISABLE, false);
            0
        }
        Sei => {
            flags::set(&mut cpu.status, flags::INTERRUPT_DISABLE, true);
            0
        }
        Cld => {
            flags::set(&mut cpu.status, flags::DECIMAL, false);
            0
        }
        Sed => {
            flags::set(&mut cpu.status, flags::DECIMAL, true);
            0
        }
        Clv => {
            flags::set(&mut cpu.status, OVERFLOW, false);
            0
        }
        Bcc => branch(cpu, !flags::is_set(cpu.status, CARRY), ea, page_crossed),
        Bcs => branch(cpu, flags::is_set(cpu.status, CARRY), ea, page_crossed),
        Bne => branch(cpu, !flags::is_set(cpu.status, ZERO), ea, page_crossed),
        Beq => branch(cpu, flags::is_set(cpu.status, ZERO), ea, page_crossed),
        Bpl => branch(cpu, !flags::is_set(cpu.status, NEGATIVE), ea, page_crossed),
        Bmi => branch(cpu, flags::is_set(cpu.status, NEGATIVE), ea, page_crossed),
        Bvc => branch(cpu, !flags::is_set(cpu.status, OVERFLOW), ea, page_crossed),
        Bvs => branch(cpu, flags::is_set(cpu.status, OVERFLOW), ea, page_crossed),
        Jmp => {
            cpu.pc = ea;
            0
        }
        Jsr => {
            let ret = cpu.pc.wrapping_sub(1);
            cpu.push16(bus, ret);
            cpu.pc = ea;
            0
        }
        Rts => {
            cpu.pc = cpu.pull16(bus).wrapping_add(1);
            0
        }
        Brk => {
            cpu.push16(bus, cpu.pc.wrapping_add(1));
            cpu.push8(bus, cpu.status | flags::BREAK);
            flags::set(&mut cpu.status, flags::INTERRUPT_DISABLE, true);
            cpu.pc = bus.read16(0xFFFE);
            0
        }
        Rti => {
            let v = cpu.pull8(bus);
            cpu.status = (v | flags::UNUSED) & !flags::BREAK;
            cpu.pc = cpu.pull16(bus);
            0
        }
        Nop => 0,
    }
}

/// `A' = A + M + C`. Used directly by ADC, and by SBC via `adc(cpu, !m)`
/// per the canonical identity `SBC(A, M, C) = ADC(A, !M, C)`.
fn adc(cpu: &mut Cpu, m: u8) {
    let a = cpu.a;
    let carry_in = flags::is_set(cpu.status, CARRY) as u16;
    let sum = a as u16 + m as u16 + carry_in;
    let result = sum as u8;
    flags::set(&mut cpu.status, CARRY, sum > 0xFF);
    flags::set(
        &mut cpu.status,
        OVERFLOW,
        (!(a ^ m) & (a ^ result) & 0x80) != 0,
    );
    flags::update_zn(&mut cpu.status, result);
    cpu.a = result;
}

/// CMP/CPX/CPY are independent operations parameterized by the already-read
/// register value; none of them is implemented by recursing into another.
fn cmp_generic(cpu: &mut Cpu, register_value: u8, operand: u8) {
    flags::set(&mut cpu.status, CARRY, register_value >= operand);
    let r = register_value.wrapping_sub(operand);
    flags::update_zn(&mut cpu.status, r);
}

/// Read-modify-write at `ea` (or the accumulator), including the hardware
/// dummy write-back of the unmodified value before the new one lands.
fn rmw<F>(cpu: &mut Cpu, bus: &mut Bus, ea: u16, accumulator_mode: bool, transform: F)
where
    F: FnOnce(&mut u8, u8) -> u8,
{
    if accumulator_mode {
        let old = cpu.a;
        cpu.a = transform(&mut cpu.status, old);
    } else {
        let old = bus.read8(ea);
        bus.write8(ea, old);
        let new = transform(&mut cpu.status, old);
        bus.write8(ea, new);
    }
}

/// Test the branch condition; if taken, move PC to `ea` and charge +1 cycle,
/// plus another +1 if the branch crosses a page (computed against the
/// address of the instruction following the branch, per the addressing
/// unit's page-cross flag — inequality, never equality, of page bits).
fn branch(cpu: &mut Cpu, take: bool, ea: u16, page_crossed: bool) -> u64 {
    if !take {
        return 0;
    }
    cpu.pc = ea;
    if page_crossed { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_nrom_with_prg;
    use crate::Cartridge;

    fn setup() -> (Cpu, Bus) {
        let rom = build_nrom_with_prg(&[], 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    #[test]
    fn adc_sets_carry_and_not_overflow_on_unsigned_wrap() {
        let (mut cpu, _bus) = setup();
        cpu.a = 0xFF;
        adc(&mut cpu, 0x01);
        assert_eq!(cpu.a, 0x00);
        assert!(flags::is_set(cpu.status, CARRY));
        assert!(!flags::is_set(cpu.status, OVERFLOW));
        assert!(flags::is_set(cpu.status, ZERO));
    }

    #[test]
    fn cmp_sets_carry_on_greater_or_equal() {
        let (mut cpu, _bus) = setup();
        cmp_generic(&mut cpu, 0x10, 0x10);
        assert!(flags::is_set(cpu.status, CARRY));
        assert!(flags::is_set(cpu.status, ZERO));
    }

    #[test]
    fn rmw_asl_sets_carry_from_old_bit7() {
        let (mut cpu, mut bus) = setup();
        bus.write8(0x0010, 0b1000_0001);
        rmw(&mut cpu, &mut bus, 0x0010, false, |status, v| {
            flags::set(status, CARRY, v & 0x80 != 0);
            let r = v << 1;
            flags::update_zn(status, r);
            r
        });
        assert_eq!(bus.read8(0x0010), 0b0000_0010);
        assert!(flags::is_set(cpu.status, CARRY));
    }

    #[test]
    fn branch_not_taken_returns_zero_extra_cycles() {
        let (mut cpu, _bus) = setup();
        let pc_before = cpu.pc;
        let extra = branch(&mut cpu, false, 0x1234, true);
        assert_eq!(extra, 0);
        assert_eq!(cpu.pc, pc_before);
    }

    #[test]
    fn branch_taken_with_page_cross_costs_two_extra() {
        let (mut cpu, _bus) = setup();
        let extra = branch(&mut cpu, true, 0x1234, true);
        assert_eq!(extra, 2);
        assert_eq!(cpu.pc, 0x1234);
    }
}
