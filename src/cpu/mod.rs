/*!
The 6502-derived CPU core: register file, interrupt controller, and the
per-instruction step driver.

The instruction table ([`table`]), addressing-mode resolver
([`addressing`]), and execution handlers ([`execute`]) are kept in
separate modules so each carries its own focused test module, in the
style already used for this crate's `mapper` trait/impl split.
*/

pub mod addressing;
pub mod error;
pub mod execute;
pub mod flags;
pub mod table;

use crate::bus::Bus;
pub use error::CpuError;
use table::{AddrMode, Mnemonic};

/// A pending hardware interrupt latch. Modeled as two independent booleans
/// (rather than the single `{None, NMI, IRQ}` enum a register-level summary
/// might suggest) so a still-unserviced NMI is never silently clobbered by
/// a later `trigger_irq()` call before the next `step()` gets a chance to
/// service it; NMI keeps priority at the servicing point either way.
#[derive(Clone, Debug, Default)]
struct PendingInterrupt {
    nmi: bool,
    irq: bool,
}

/// The 6502 register file plus the bookkeeping the step driver needs
/// (`cycles`, `stall`, the interrupt latch, and the debug-trace flag).
#[derive(Clone, Debug)]
pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub cycles: u64,
    pub stall: u64,
    pending: PendingInterrupt,
    debug: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Construct a CPU at documented power-up register values. No bus
    /// access happens here; call `reset(bus)` to load the reset vector.
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: flags::POWER_ON_STATUS,
            cycles: 0,
            stall: 0,
            pending: PendingInterrupt::default(),
            debug: false,
        }
    }

    /// RESET: zero A/X/Y, SP=0xFD, status=0x24, clear cycles/stall/pending
    /// latches, and load PC from the reset vector at $FFFC. May be called
    /// more than once; consecutive calls yield identical state.
    pub fn reset(&mut self, bus: &mut Bus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = flags::POWER_ON_STATUS;
        self.cycles = 0;
        self.stall = 0;
        self.pending = PendingInterrupt::default();
        self.pc = bus.read16(0xFFFC);
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// NMI is level-triggered by caller intent in this core; the caller
    /// must not re-trigger it for the same physical event.
    pub fn trigger_nmi(&mut self) {
        self.pending.nmi = true;
    }

    /// No-op if the interrupt-disable flag is set.
    pub fn trigger_irq(&mut self) {
        if !flags::is_set(self.status, flags::INTERRUPT_DISABLE) {
            self.pending.irq = true;
        }
    }

    /// Feed additional stall cycles into the CPU (e.g. from OAM DMA).
    pub fn add_stall(&mut self, cycles: u64) {
        self.stall += cycles;
    }

    // -- stack helpers: page 1 ($0100-$01FF), SP wraps within 8 bits --

    pub(crate) fn push8(&mut self, bus: &mut Bus, value: u8) {
        bus.write8(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pull8(&mut self, bus: &mut Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read8(0x0100 | self.sp as u16)
    }

    pub(crate) fn push16(&mut self, bus: &mut Bus, value: u16) {
        self.push8(bus, (value >> 8) as u8);
        self.push8(bus, (value & 0xFF) as u8);
    }

    pub(crate) fn pull16(&mut self, bus: &mut Bus) -> u16 {
        let lo = self.pull8(bus) as u16;
        let hi = self.pull8(bus) as u16;
        (hi << 8) | lo
    }

    /// Service a pending interrupt (NMI has priority over IRQ). Returns
    /// the number of cycles consumed, or 0 if nothing was pending.
    fn service_interrupt(&mut self, bus: &mut Bus) -> u64 {
        let vector = if self.pending.nmi {
            self.pending.nmi = false;
            self.pending.irq = false;
            0xFFFA
        } else if self.pending.irq {
            self.pending.irq = false;
            0xFFFE
        } else {
            return 0;
        };

        self.push16(bus, self.pc);
        self.push8(bus, self.status | flags::BREAK);
        flags::set(&mut self.status, flags::INTERRUPT_DISABLE, true);
        self.pc = bus.read16(vector);
        7
    }

    /// Fetch-decode-execute one instruction (or consume one stall cycle).
    /// Returns cycles consumed, or `Err` if the fetched opcode is not in
    /// the official instruction table.
    pub fn step(&mut self, bus: &mut Bus) -> Result<u64, CpuError> {
        if self.stall > 0 {
            self.stall -= 1;
            return Ok(1);
        }

        let interrupt_cycles = self.service_interrupt(bus);
        if interrupt_cycles > 0 {
            self.cycles += interrupt_cycles;
            bus.tick(interrupt_cycles);
            return Ok(interrupt_cycles);
        }

        let pc_at_fetch = self.pc;
        let opcode = bus.read8(self.pc);
        let descriptor = match table::decode(opcode) {
            Some(d) => d,
            None => {
                return Err(CpuError::DecodeError {
                    pc: pc_at_fetch,
                    opcode,
                });
            }
        };

        let resolved = addressing::resolve(self, bus, descriptor.mode);
        let cycles_before = self.cycles;

        self.pc = self.pc.wrapping_add(descriptor.size_bytes as u16);
        self.cycles += descriptor.base_cycles as u64;
        if descriptor.mode != AddrMode::Relative
            && resolved.page_crossed
            && descriptor.page_cross_penalty > 0
        {
            self.cycles += descriptor.page_cross_penalty as u64;
        }

        let accumulator_mode = descriptor.mode == AddrMode::Accumulator;
        let extra = execute::dispatch(
            self,
            bus,
            descriptor.mnemonic,
            resolved.ea,
            accumulator_mode,
            resolved.page_crossed,
        );
        self.cycles += extra;

        let delta = self.cycles - cycles_before;
        bus.tick(delta);

        let dma_stall = bus.take_dma_stall();
        if dma_stall > 0 {
            self.add_stall(dma_stall);
        }

        if self.debug {
            log::trace!(
                "pc={pc_at_fetch:#06x} op={opcode:#04x} {:?} a={:#04x} x={:#04x} y={:#04x} sp={:#04x} p={:#04x}",
                descriptor.mnemonic,
                self.a,
                self.x,
                self.y,
                self.sp,
                self.status
            );
        }

        Ok(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{build_nrom_with_prg, build_nrom_with_prg_reset_only};
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
    fn reset_is_idempotent() {
        let (mut cpu, mut bus) = setup(&[]);
        let snapshot = cpu.clone();
        cpu.reset(&mut bus);
        assert_eq!(cpu.a, snapshot.a);
        assert_eq!(cpu.x, snapshot.x);
        assert_eq!(cpu.y, snapshot.y);
        assert_eq!(cpu.sp, snapshot.sp);
        assert_eq!(cpu.status, snapshot.status);
        assert_eq!(cpu.pc, snapshot.pc);
    }

    #[test]
    fn lda_immediate_scenario() {
        let rom = build_nrom_with_prg_reset_only(&[0xA9, 0x42, 0x00], 1, 1, Some(0x8000));
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        let delta = cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x42);
        assert!(!flags::is_set(cpu.status, flags::ZERO));
        assert!(!flags::is_set(cpu.status, flags::NEGATIVE));
        assert_eq!(cpu.pc, 0x8002);
        assert_eq!(delta, 2);
    }

    #[test]
    fn adc_overflow_into_sign() {
        let rom = build_nrom_with_prg_reset_only(&[0x69, 0x40, 0x00], 1, 1, Some(0x8000));
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.a = 0x40;

        let delta = cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.a, 0x80);
        assert!(!flags::is_set(cpu.status, flags::CARRY));
        assert!(flags::is_set(cpu.status, flags::OVERFLOW));
        assert!(flags::is_set(cpu.status, flags::NEGATIVE));
        assert!(!flags::is_set(cpu.status, flags::ZERO));
        assert_eq!(delta, 2);
    }

    #[test]
    fn taken_branch_within_same_page() {
        // BEQ at 0x80FE with offset +5: the instruction following the
        // branch is 0x8100, and the destination is 0x8105 — same page, so
        // this costs base(2) + taken(1) = 3, not a page-cross 4. Page-cross
        // is judged against the post-increment PC (0x8100), not the branch
        // opcode's own address (0x80FE), so the high-byte change from 0x80
        // to 0x81 between the opcode and its target never enters into it.
        let mut prg = vec![0xEA; 0x100];
        prg[0xFE] = 0xF0; // BEQ
        prg[0xFF] = 0x05;
        let rom = build_nrom_with_prg_reset_only(&prg, 1, 1, Some(0x8000));
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.pc = 0x80FE;
        flags::set(&mut cpu.status, flags::ZERO, true);

        let delta = cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc, 0x8105);
        assert_eq!(delta, 3);
    }

    #[test]
    fn jsr_then_rts_round_trip() {
        let mut prg = vec![0xEA; 0x200];
        prg[0x100] = 0x20; // JSR
        prg[0x101] = 0x34;
        prg[0x102] = 0x12;
        let rom = build_nrom_with_prg_reset_only(&prg, 1, 1, Some(0x8000));
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        bus.write8(0x1234, 0x60); // RTS at target
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.pc = 0x8100;
        let sp_before = cpu.sp;

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc, 0x1234);
        assert_eq!(cpu.sp, sp_before.wrapping_sub(2));

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc, 0x8103);
        assert_eq!(cpu.sp, sp_before);
    }

    #[test]
    fn indirect_jmp_page_boundary_bug_end_to_end() {
        let (mut cpu, mut bus) = setup(&[]);
        bus.write8(0x00FF, 0x6C);
        bus.write8(0x0100, 0xFF);
        bus.write8(0x0101, 0x10);
        bus.write8(0x10FF, 0x34);
        bus.write8(0x1000, 0x12);
        bus.write8(0x1100, 0xAB);
        cpu.pc = 0x00FF;

        cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc, 0x1234);
    }

    #[test]
    fn nmi_service_scenario() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.pc = 0x4000;
        cpu.sp = 0xFD;
        cpu.status = 0x24;
        bus.write8(0xFFFA, 0x00);
        bus.write8(0xFFFB, 0x80);
        cpu.trigger_nmi();

        let delta = cpu.step(&mut bus).unwrap();
        assert_eq!(cpu.pc, 0x8000);
        assert_eq!(cpu.sp, 0xFA);
        assert!(flags::is_set(cpu.status, flags::INTERRUPT_DISABLE));
        assert_eq!(delta, 7);

        // Push order is PCH, PCL, then status, so the top of the stack
        // (last byte written, at the final SP+1) is the status byte.
        assert_eq!(bus.read8(0x01FB), 0x24 | flags::BREAK);
        assert_eq!(bus.read8(0x01FC), 0x00);
        assert_eq!(bus.read8(0x01FD), 0x40);
    }

    #[test]
    fn unofficial_opcode_is_fatal_decode_error() {
        let (mut cpu, mut bus) = setup(&[]);
        bus.write8(0x8000, 0x02);
        cpu.pc = 0x8000;
        let pc_before = cpu.pc;
        let cycles_before = cpu.cycles;

        let err = cpu.step(&mut bus).unwrap_err();
        assert_eq!(
            err,
            CpuError::DecodeError {
                pc: 0x8000,
                opcode: 0x02
            }
        );
        assert_eq!(cpu.pc, pc_before);
        assert_eq!(cpu.cycles, cycles_before);
    }

    #[test]
    fn oam_dma_stall_parity_then_step_consumes_without_fetch() {
        let (mut cpu, mut bus) = setup(&[]);
        cpu.pc = 0x8000;
        bus.write8(0x8000, 0xEA); // NOP, makes the even/odd master_cycle line up below
        bus.write8(0x4014, 0x02);

        assert!(cpu.stall == 0);
        // write8 to 0x4014 happens independent of a step; simulate the
        // step driver picking up the resulting stall as §4.6 describes.
        let dma_stall = bus.take_dma_stall();
        cpu.add_stall(dma_stall);
        assert!(dma_stall == 513 || dma_stall == 514);

        let before_pc = cpu.pc;
        let delta = cpu.step(&mut bus).unwrap();
        assert_eq!(delta, 1);
        assert_eq!(cpu.pc, before_pc);
        assert_eq!(cpu.stall, dma_stall - 1);
    }

    #[test]
    fn sbc_matches_adc_of_complement() {
        let (mut cpu_a, mut bus_a) = setup(&[0xE9, 0x10, 0x00]);
        let (mut cpu_b, mut bus_b) = setup(&[0x69, !0x10u8, 0x00]);
        cpu_a.a = 0x50;
        cpu_b.a = 0x50;
        flags::set(&mut cpu_a.status, flags::CARRY, true);
        flags::set(&mut cpu_b.status, flags::CARRY, true);

        cpu_a.step(&mut bus_a).unwrap();
        cpu_b.step(&mut bus_b).unwrap();

        assert_eq!(cpu_a.a, cpu_b.a);
        assert_eq!(cpu_a.status, cpu_b.status);
    }
}
