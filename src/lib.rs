#![doc = r#"
NES CPU core library crate.

This crate exposes a MOS 6502-derived CPU interpreter and its memory bus
for use by binaries and tests. The picture/audio processors, controllers'
input source, and mapper-specific logic beyond NROM are out of scope;
`ports` defines the trait seams a host implements to supply them.

Modules:
- bus: CPU address-space mapping, coordinating RAM, the cartridge, the
  PPU/APU ports, and the controllers
- cartridge: iNES v1 loader and cartridge metadata; constructs a Mapper
- controller: NES controller serial-read abstraction
- cpu: the 6502 register/flag model, instruction table, addressing unit,
  execution unit, and interrupt/reset controller
- mapper: Mapper trait and NROM (mapper 0) implementation
- ports: PPU/APU collaborator traits and inert default implementations

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod mapper;
pub mod ports;

pub use bus::Bus;
pub use cartridge::Cartridge;
pub use cpu::Cpu;

#[cfg(test)]
pub mod test_utils;
