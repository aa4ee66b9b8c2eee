/*!
CPU memory bus: the NES CPU address-space mapping and the collaborators
reachable through it.

Address map:
- `[0x0000, 0x2000)`: 2 KiB internal RAM, mirrored four times.
- `[0x2000, 0x4000)`: PPU registers, 8 regs mirrored every 8 bytes.
- `0x4014`: OAM DMA trigger (write-only; triggers a 513/514-cycle CPU stall).
- `0x4015`: APU status (read) / enable (write).
- `0x4016`, `0x4017`: controller 1, controller 2 (reads); controller strobe
  and the APU frame counter (writes).
- `[0x4000, 0x4014) ∪ (0x4017, 0x4020)`: remaining APU registers.
- `[0x4020, 0x10000)`: cartridge space, delegated to the mapper.

Reads from unmapped cartridge space (no cartridge attached) return 0;
writes there are discarded. Both are logged at `debug` level rather than
treated as errors, matching the rest of this crate's error-handling
design: bus-level gaps are not failures, only unofficial opcodes are.
*/

use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::ports::{ApuPort, NullApu, NullPpu, PpuPort};

pub struct Bus {
    ram: [u8; 0x0800],
    ppu: Box<dyn PpuPort>,
    apu: Box<dyn ApuPort>,
    pub controller1: Controller,
    pub controller2: Controller,
    cartridge: Option<Cartridge>,

    /// Advanced only by `tick(cycles)`, called once per completed
    /// instruction by the step driver. Its only consumer today is OAM-DMA
    /// stall parity.
    master_cycle: u64,

    /// Stall cycles computed by the most recent `$4014` write, collected
    /// by the step driver via `take_dma_stall` and folded into the CPU's
    /// own stall counter.
    pending_dma_stall: u64,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: [0; 0x0800],
            ppu: Box::new(NullPpu::new()),
            apu: Box::new(NullApu::new()),
            controller1: Controller::new(),
            controller2: Controller::new(),
            cartridge: None,
            master_cycle: 0,
            pending_dma_stall: 0,
        }
    }

    pub fn attach_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    pub fn set_ppu(&mut self, ppu: Box<dyn PpuPort>) {
        self.ppu = ppu;
    }

    pub fn set_apu(&mut self, apu: Box<dyn ApuPort>) {
        self.apu = apu;
    }

    /// Advance the bus-owned cycle counter. Called once per completed
    /// instruction by the step driver, never by a per-PPU/APU-dot
    /// simulation loop (those internals are out of scope here).
    pub fn tick(&mut self, cycles: u64) {
        self.master_cycle = self.master_cycle.wrapping_add(cycles);
    }

    pub fn master_cycle(&self) -> u64 {
        self.master_cycle
    }

    /// Take and clear the stall accumulated by any `$4014` write since the
    /// last call (0 if none happened).
    pub fn take_dma_stall(&mut self) -> u64 {
        let stall = self.pending_dma_stall;
        self.pending_dma_stall = 0;
        stall
    }

    pub fn read8(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => self.ppu.read((addr & 0x0007) as u8),
            0x4014 => 0,
            0x4015 => self.apu.read_status(),
            0x4016 => self.controller1.read(),
            0x4017 => self.controller2.read(),
            0x4000..=0x4013 | 0x4018..=0x401F => 0,
            0x4020..=0xFFFF => match &self.cartridge {
                Some(cart) => {
                    if addr < 0x6000 {
                        0
                    } else if addr < 0x8000 {
                        cart.cpu_read_prg_ram(addr)
                    } else {
                        cart.cpu_read_prg_rom(addr)
                    }
                }
                None => {
                    log::debug!("bus: read from cartridge space {addr:#06x} with no cartridge attached");
                    0
                }
            },
        }
    }

    pub fn write8(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => self.ppu.write((addr & 0x0007) as u8, value),
            0x4014 => {
                let stall = if self.master_cycle & 1 == 0 { 513 } else { 514 };
                self.pending_dma_stall += stall;
                self.ppu.oam_dma(value);
            }
            0x4015 => self.apu.write(addr, value),
            0x4016 => {
                self.controller1.write_strobe(value);
                self.controller2.write_strobe(value);
            }
            0x4017 => self.apu.write(addr, value),
            0x4000..=0x4013 | 0x4018..=0x401F => self.apu.write(addr, value),
            0x4020..=0xFFFF => match &mut self.cartridge {
                Some(cart) => {
                    if addr < 0x6000 {
                        log::debug!("bus: discarded write to unmapped expansion address {addr:#06x}");
                    } else if addr < 0x8000 {
                        cart.cpu_write_prg_ram(addr, value);
                    } else {
                        cart.cpu_write_prg_rom(addr, value);
                    }
                }
                None => {
                    log::debug!(
                        "bus: discarded write of {value:#04x} to {addr:#06x} with no cartridge attached"
                    );
                }
            },
        }
    }

    /// Two `read8` calls composed little-endian. Never advances PC.
    pub fn read16(&mut self, addr: u16) -> u16 {
        let lo = self.read8(addr) as u16;
        let hi = self.read8(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// The hardware indirect-vector bug: the high byte wraps within the
    /// same page instead of crossing into the next one.
    pub fn read16_wrap(&mut self, addr: u16) -> u16 {
        let lo = self.read8(addr) as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.read8(hi_addr) as u16;
        (hi << 8) | lo
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Button;
    use crate::test_utils::build_nrom_with_prg;

    fn bus_with_cartridge() -> Bus {
        let rom = build_nrom_with_prg(&[0xAA; 16], 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).unwrap();
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        bus
    }

    #[test]
    fn ram_is_mirrored_four_times() {
        let mut bus = Bus::new();
        bus.write8(0x0001, 0x42);
        assert_eq!(bus.read8(0x0801), 0x42);
        assert_eq!(bus.read8(0x1001), 0x42);
        assert_eq!(bus.read8(0x1801), 0x42);
    }

    #[test]
    fn ppu_register_window_is_mirrored_every_eight_bytes() {
        let mut bus = Bus::new();
        bus.write8(0x2000, 0xFF); // accepted and discarded by NullPpu
        assert_eq!(bus.read8(0x2008), 0);
        assert_eq!(bus.read8(0x3FF8), 0);
    }

    #[test]
    fn controller_strobe_and_serial_read() {
        let mut bus = Bus::new();
        bus.controller1.press(Button::A);
        bus.write8(0x4016, 1);
        bus.write8(0x4016, 0);
        assert_eq!(bus.read8(0x4016), 1);
        for _ in 0..7 {
            bus.read8(0x4016);
        }
        assert_eq!(bus.read8(0x4016), 1); // past-8-reads convention
    }

    #[test]
    fn prg_ram_round_trip() {
        let mut bus = bus_with_cartridge();
        bus.write8(0x6000, 0x77);
        assert_eq!(bus.read8(0x6000), 0x77);
    }

    #[test]
    fn prg_rom_is_readable_through_the_bus() {
        let mut bus = bus_with_cartridge();
        assert_eq!(bus.read8(0x8000), 0xAA);
    }

    #[test]
    fn read16_wrap_implements_the_indirect_jmp_bug() {
        let mut bus = Bus::new();
        bus.write8(0x10FF, 0x34);
        bus.write8(0x1000, 0x12);
        bus.write8(0x1100, 0xAB);
        assert_eq!(bus.read16_wrap(0x10FF), 0x1234);
    }

    #[test]
    fn read16_does_not_wrap() {
        let mut bus = Bus::new();
        bus.write8(0x00FF, 0x34);
        bus.write8(0x0100, 0x12);
        assert_eq!(bus.read16(0x00FF), 0x1234);
    }

    #[test]
    fn oam_dma_write_adds_correct_stall_parity() {
        let mut bus = Bus::new();
        bus.tick(4); // even master_cycle
        bus.write8(0x4014, 0x02);
        assert_eq!(bus.take_dma_stall(), 513);

        bus.tick(1); // now odd
        bus.write8(0x4014, 0x02);
        assert_eq!(bus.take_dma_stall(), 514);
    }

    #[test]
    fn unmapped_expansion_reads_return_zero() {
        let mut bus = Bus::new();
        assert_eq!(bus.read8(0x4020), 0);
    }
}
