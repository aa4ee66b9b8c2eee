//! Effective-address computation for all thirteen addressing modes.
//!
//! A single function, keyed by mode, rather than an inlined switch at each
//! dispatch site. `Cpu::pc` is expected to still point at the opcode byte
//! when `resolve` is called; the step driver advances it afterwards.

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::cpu::table::AddrMode;

/// Result of resolving an addressing mode: the effective address (meaningless
/// for `Implied`/`Accumulator`, where the operand is the accumulator) and
/// whether indexing crossed a page boundary.
pub struct Resolved {
    pub ea: u16,
    pub page_crossed: bool,
}

#[inline]
fn page(addr: u16) -> u16 {
    addr & 0xFF00
}

pub fn resolve(cpu: &Cpu, bus: &mut Bus, mode: AddrMode) -> Resolved {
    let pc = cpu.pc;
    match mode {
        AddrMode::Implied | AddrMode::Accumulator => Resolved {
            ea: 0,
            page_crossed: false,
        },
        AddrMode::Immediate => Resolved {
            ea: pc.wrapping_add(1),
            page_crossed: false,
        },
        AddrMode::ZeroPage => {
            let ea = bus.read8(pc.wrapping_add(1)) as u16;
            Resolved {
                ea,
                page_crossed: false,
            }
        }
        AddrMode::ZeroPageX => {
            let base = bus.read8(pc.wrapping_add(1));
            let ea = base.wrapping_add(cpu.x) as u16;
            Resolved {
                ea,
                page_crossed: false,
            }
        }
        AddrMode::ZeroPageY => {
            let base = bus.read8(pc.wrapping_add(1));
            let ea = base.wrapping_add(cpu.y) as u16;
            Resolved {
                ea,
                page_crossed: false,
            }
        }
        AddrMode::Absolute => {
            let ea = bus.read16(pc.wrapping_add(1));
            Resolved {
                ea,
                page_crossed: false,
            }
        }
        AddrMode::AbsoluteX => {
            let base = bus.read16(pc.wrapping_add(1));
            let ea = base.wrapping_add(cpu.x as u16);
            Resolved {
                ea,
                page_crossed: page(base) != page(ea),
            }
        }
        AddrMode::AbsoluteY => {
            let base = bus.read16(pc.wrapping_add(1));
            let ea = base.wrapping_add(cpu.y as u16);
            Resolved {
                ea,
                page_crossed: page(base) != page(ea),
            }
        }
        AddrMode::Indirect => {
            let ptr = bus.read16(pc.wrapping_add(1));
            let ea = bus.read16_wrap(ptr);
            Resolved {
                ea,
                page_crossed: false,
            }
        }
        AddrMode::IndexedIndirect => {
            let zp = bus.read8(pc.wrapping_add(1));
            let ptr = zp.wrapping_add(cpu.x) as u16;
            let ea = bus.read16_wrap(ptr);
            Resolved {
                ea,
                page_crossed: false,
            }
        }
        AddrMode::IndirectIndexed => {
            let zp = bus.read8(pc.wrapping_add(1)) as u16;
            let base = bus.read16_wrap(zp);
            let ea = base.wrapping_add(cpu.y as u16);
            Resolved {
                ea,
                page_crossed: page(base) != page(ea),
            }
        }
        AddrMode::Relative => {
            let offset = bus.read8(pc.wrapping_add(1)) as i8;
            let next_instr = pc.wrapping_add(2);
            let ea = next_instr.wrapping_add_signed(offset as i16);
            Resolved {
                ea,
                page_crossed: page(next_instr) != page(ea),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_nrom_with_prg;
    use crate::Cartridge;

    fn setup(prg: &[u8]) -> (Cpu, Bus) {
        let rom = build_nrom_with_prg(prg, 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    #[test]
    fn zero_page_x_wraps_without_carry() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.pc = 0x0000;
        bus.write8(0x0001, 0xFF);
        cpu.x = 2;
        let r = resolve(&cpu, &mut bus, AddrMode::ZeroPageX);
        assert_eq!(r.ea, 0x0001);
    }

    #[test]
    fn absolute_x_reports_page_cross() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.pc = 0x0000;
        bus.write8(0x0001, 0xFF);
        bus.write8(0x0002, 0x80); // base = 0x80FF
        cpu.x = 0x01;
        let r = resolve(&cpu, &mut bus, AddrMode::AbsoluteX);
        assert_eq!(r.ea, 0x8100);
        assert!(r.page_crossed);
    }

    #[test]
    fn absolute_x_no_cross_within_page() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.pc = 0x0000;
        bus.write8(0x0001, 0x00);
        bus.write8(0x0002, 0x80); // base = 0x8000
        cpu.x = 0x01;
        let r = resolve(&cpu, &mut bus, AddrMode::AbsoluteX);
        assert_eq!(r.ea, 0x8001);
        assert!(!r.page_crossed);
    }

    #[test]
    fn indirect_jmp_page_boundary_bug() {
        let (cpu, mut bus) = setup(&[]);
        bus.write8(0x10FF, 0x34);
        bus.write8(0x1000, 0x12);
        bus.write8(0x1100, 0xAB);
        let ea = bus.read16_wrap(0x10FF);
        assert_eq!(ea, 0x1234);
        let _ = cpu;
    }

    #[test]
    fn relative_addressing_computes_signed_offset() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.pc = 0x00FE;
        bus.write8(0x00FF, 0x05);
        let r = resolve(&cpu, &mut bus, AddrMode::Relative);
        assert_eq!(r.ea, 0x0105);
    }
}
