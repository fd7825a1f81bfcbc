//! The system bus: routes CPU reads/writes to the correct component and keeps the Timer, PPU,
//! DMA engine, and serial port ticking in lockstep with the CPU clock.

use crate::apu::Apu;
use crate::cartridge::Cartridge;
use crate::dma::DmaUnit;
use crate::inputs::InputState;
use crate::interrupts::InterruptRegisters;
use crate::memory::Memory;
use crate::ppu::Ppu;
use crate::serial::SerialPort;
use crate::sm83::InterruptType;
use crate::sm83::bus::BusInterface;
use crate::timer::GbTimer;

/// A short-lived view over every component reachable from the CPU, constructed fresh for the
/// duration of a single instruction step.
pub struct Bus<'a> {
    pub cartridge: &'a mut Cartridge,
    pub memory: &'a mut Memory,
    pub ppu: &'a mut Ppu,
    pub apu: &'a mut Apu,
    pub timer: &'a mut GbTimer,
    pub dma: &'a mut DmaUnit,
    pub serial: &'a mut SerialPort,
    pub inputs: &'a mut InputState,
    pub interrupts: &'a mut InterruptRegisters,
}

impl Bus<'_> {
    // Advance Timer, PPU, DMA, and the serial port by one M-cycle. Every M-cycle the CPU spends
    // corresponds to exactly one read/write/idle call, so ticking hardware from in here keeps
    // everything synchronized without the CPU needing any notion of the clock at all.
    fn tick_components(&mut self) {
        self.timer.tick_m_cycle(self.interrupts);

        for _ in 0..4 {
            self.ppu.tick_dot(self.dma, self.interrupts);
        }

        self.dma.tick_m_cycle(self.cartridge, self.memory, self.ppu);
        self.serial.tick(self.interrupts);
    }

    fn dma_blocks(&self, address: u16) -> bool {
        self.dma.oam_dma_in_progress() && address < 0xFF80 && address != 0xFFFF
    }

    fn read_io_register(&mut self, address: u16) -> u8 {
        match address {
            0xFF00 => self.inputs.read_joyp(),
            0xFF01 => self.serial.read_data(),
            0xFF02 => self.serial.read_control(),
            0xFF04 => self.timer.read_div(),
            0xFF05 => self.timer.read_tima(),
            0xFF06 => self.timer.read_tma(),
            0xFF07 => self.timer.read_tac(),
            0xFF0F => self.interrupts.read_if(),
            0xFF10..=0xFF3F => self.apu.read_register(address),
            0xFF40..=0xFF45 | 0xFF47..=0xFF4B => self.ppu.read_register(address),
            0xFF46 => self.dma.read_dma_register(),
            _ => {
                log::trace!("Unmapped IO register read: {address:04X}");
                0xFF
            }
        }
    }

    fn write_io_register(&mut self, address: u16, value: u8) {
        match address {
            0xFF00 => self.inputs.write_joyp(value, self.interrupts),
            0xFF01 => self.serial.write_data(value),
            0xFF02 => self.serial.write_control(value),
            0xFF04 => self.timer.write_div(),
            0xFF05 => self.timer.write_tima(value),
            0xFF06 => self.timer.write_tma(value),
            0xFF07 => self.timer.write_tac(value),
            0xFF0F => self.interrupts.write_if(value),
            0xFF10..=0xFF3F => self.apu.write_register(address, value),
            0xFF40..=0xFF45 | 0xFF47..=0xFF4B => {
                self.ppu.write_register(address, value, self.interrupts);
            }
            0xFF46 => self.dma.write_dma_register(value),
            _ => log::trace!("Unmapped IO register write: {address:04X} {value:02X}"),
        }
    }
}

impl BusInterface for Bus<'_> {
    fn read(&mut self, address: u16) -> u8 {
        self.tick_components();

        if self.dma_blocks(address) {
            return 0xFF;
        }

        match address {
            0x0000..=0x7FFF => self.cartridge.read_rom(address),
            0x8000..=0x9FFF => self.ppu.read_vram(address),
            0xA000..=0xBFFF => self.cartridge.read_ram(address),
            0xC000..=0xDFFF | 0xE000..=0xFDFF => self.memory.read_main_ram(address),
            0xFE00..=0xFE9F => self.ppu.read_oam(address),
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00..=0xFF7F => self.read_io_register(address),
            0xFF80..=0xFFFE => self.memory.read_hram(address),
            0xFFFF => self.interrupts.read_ie(),
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        self.tick_components();

        if self.dma_blocks(address) {
            return;
        }

        match address {
            0x0000..=0x7FFF => self.cartridge.write_rom(address, value),
            0x8000..=0x9FFF => self.ppu.write_vram(address, value),
            0xA000..=0xBFFF => self.cartridge.write_ram(address, value),
            0xC000..=0xDFFF | 0xE000..=0xFDFF => self.memory.write_main_ram(address, value),
            0xFE00..=0xFE9F => self.ppu.write_oam(address, value),
            0xFEA0..=0xFEFF => {}
            0xFF00..=0xFF7F => self.write_io_register(address, value),
            0xFF80..=0xFFFE => self.memory.write_hram(address, value),
            0xFFFF => self.interrupts.write_ie(value),
        }
    }

    fn idle(&mut self) {
        self.tick_components();
    }

    fn read_ie_register(&self) -> u8 {
        self.interrupts.read_ie() & 0x1F
    }

    fn read_if_register(&self) -> u8 {
        self.interrupts.read_if() & 0x1F
    }

    fn acknowledge_interrupt(&mut self, interrupt_type: InterruptType) {
        self.interrupts.clear_flag(interrupt_type);
    }
}
