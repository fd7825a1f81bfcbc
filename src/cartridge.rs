//! Game Boy cartridge loading and mapping

mod mappers;

use crate::api::GameBoyLoadError;
use crate::cartridge::mappers::Mbc1;
use std::ops::Deref;
use std::ops::RangeInclusive;

// The 48-byte Nintendo logo bitmap that every licensed ROM embeds at $0104-$0133; the DMG boot
// ROM refuses to start a cartridge whose logo does not match this pattern.
const NINTENDO_LOGO: [u8; 48] = [
    0xCE, 0xED, 0x66, 0x66, 0xCC, 0x0D, 0x00, 0x0B, 0x03, 0x73, 0x00, 0x83, 0x00, 0x0C, 0x00, 0x0D,
    0x00, 0x08, 0x11, 0x1F, 0x88, 0x89, 0x00, 0x0E, 0xDC, 0xCC, 0x6E, 0xE6, 0xDD, 0xDD, 0xD9, 0x99,
    0xBB, 0xBB, 0x67, 0x63, 0x6E, 0x0E, 0xEC, 0xCC, 0xDD, 0xDC, 0x99, 0x9F, 0xBB, 0xB9, 0x33, 0x3E,
];

const LOGO_ADDR: RangeInclusive<usize> = 0x0104..=0x0133;
const CHECKSUMMED_ADDR: RangeInclusive<usize> = 0x0134..=0x014C;
const HEADER_CHECKSUM_ADDR: usize = 0x014D;
const MIN_ROM_LEN: usize = 0x0150;

fn header_checksum(rom: &[u8]) -> u8 {
    rom[CHECKSUMMED_ADDR].iter().fold(0u8, |acc, &byte| acc.wrapping_sub(byte).wrapping_sub(1))
}

fn validate_header(rom: &[u8]) -> Result<(), GameBoyLoadError> {
    if rom.len() < MIN_ROM_LEN {
        return Err(GameBoyLoadError::RomTooSmall(rom.len()));
    }

    if rom[LOGO_ADDR] != NINTENDO_LOGO {
        log::warn!(
            "ROM header Nintendo logo does not match the reference pattern; loading it anyway"
        );
    }

    let expected = rom[HEADER_CHECKSUM_ADDR];
    let actual = header_checksum(rom);
    if actual != expected {
        return Err(GameBoyLoadError::HeaderChecksumMismatch { expected, actual });
    }

    Ok(())
}

#[derive(Debug, Clone, Default)]
struct Rom(Box<[u8]>);

impl Deref for Rom {
    type Target = Box<[u8]>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone)]
enum Mapper {
    None,
    Mbc1(Mbc1),
}

impl Mapper {
    fn map_rom_address(&self, address: u16) -> u32 {
        match self {
            Self::None => address.into(),
            Self::Mbc1(mbc1) => mbc1.map_rom_address(address),
        }
    }

    fn map_ram_address(&self, address: u16) -> u32 {
        match self {
            Self::None => (address & 0x1FFF).into(),
            Self::Mbc1(mbc1) => mbc1.map_ram_address(address),
        }
    }

    fn is_ram_enabled(&self) -> bool {
        match self {
            Self::None => true,
            Self::Mbc1(mbc1) => mbc1.is_ram_enabled(),
        }
    }

    fn write_rom_address(&mut self, address: u16, value: u8) {
        match self {
            Self::None => {}
            Self::Mbc1(mbc1) => mbc1.write_rom_address(address, value),
        }
    }

    fn mapper_type(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Mbc1(..) => "MBC1",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cartridge {
    rom: Rom,
    sram: Box<[u8]>,
    mapper: Mapper,
}

impl Cartridge {
    pub fn create(rom: Box<[u8]>, initial_sram: Option<Vec<u8>>) -> Result<Self, GameBoyLoadError> {
        validate_header(&rom)?;

        // The byte at $0149 in the ROM header indicates SRAM size
        let sram_len_byte = rom[0x0149];
        let sram_len = match sram_len_byte {
            0x00 => 0,
            0x02 => 8 * 1024,
            0x03 => 32 * 1024,
            0x04 => 128 * 1024,
            0x05 => 64 * 1024,
            _ => return Err(GameBoyLoadError::InvalidSramByte(sram_len_byte)),
        };

        log::info!("SRAM size: {sram_len} bytes");

        let sram = match initial_sram {
            Some(initial_sram) if initial_sram.len() == sram_len => initial_sram,
            _ => vec![0; sram_len],
        };

        // Cartridge type is always at $0147 in ROM
        let mapper_byte = rom[0x0147];
        let mapper = match mapper_byte {
            0x00 => Mapper::None,
            0x01..=0x03 => Mapper::Mbc1(Mbc1::new(rom.len() as u32, sram_len as u32)),
            _ => return Err(GameBoyLoadError::UnsupportedMapperByte(mapper_byte)),
        };

        log::info!("Using mapper {}", mapper.mapper_type());

        Ok(Self { rom: Rom(rom), sram: sram.into_boxed_slice(), mapper })
    }

    pub fn read_rom(&self, address: u16) -> u8 {
        let rom_addr = self.mapper.map_rom_address(address);
        self.rom[rom_addr as usize]
    }

    pub fn write_rom(&mut self, address: u16, value: u8) {
        self.mapper.write_rom_address(address, value);
    }

    pub fn read_ram(&self, address: u16) -> u8 {
        if !self.mapper.is_ram_enabled() || self.sram.is_empty() {
            return 0xFF;
        }

        let ram_addr = self.mapper.map_ram_address(address);
        self.sram[ram_addr as usize]
    }

    pub fn write_ram(&mut self, address: u16, value: u8) {
        if !self.mapper.is_ram_enabled() || self.sram.is_empty() {
            return;
        }

        let ram_addr = self.mapper.map_ram_address(address);
        self.sram[ram_addr as usize] = value;
    }

    pub fn ram(&self) -> &[u8] {
        &self.sram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with_header(mapper_byte: u8, sram_byte: u8) -> Box<[u8]> {
        let mut rom = vec![0u8; MIN_ROM_LEN];
        rom[LOGO_ADDR].copy_from_slice(&NINTENDO_LOGO);
        rom[0x0147] = mapper_byte;
        rom[0x0149] = sram_byte;
        rom[HEADER_CHECKSUM_ADDR] = header_checksum(&rom);
        rom.into_boxed_slice()
    }

    #[test]
    fn header_checksum_matches_for_well_formed_rom() {
        let rom = rom_with_header(0x00, 0x00);
        assert!(validate_header(&rom).is_ok());
    }

    #[test]
    fn header_checksum_mismatch_is_rejected() {
        let mut rom = rom_with_header(0x00, 0x00).into_vec();
        rom[HEADER_CHECKSUM_ADDR] ^= 0xFF;
        let err = validate_header(&rom).unwrap_err();
        assert!(matches!(err, GameBoyLoadError::HeaderChecksumMismatch { .. }));
    }

    #[test]
    fn logo_mismatch_is_only_a_warning() {
        let mut rom = rom_with_header(0x00, 0x00).into_vec();
        rom[0x0104] = 0x00;
        rom[HEADER_CHECKSUM_ADDR] = header_checksum(&rom);
        assert!(validate_header(&rom).is_ok());
    }

    #[test]
    fn rom_too_small_is_rejected() {
        let rom = vec![0u8; 0x10].into_boxed_slice();
        let err = validate_header(&rom).unwrap_err();
        assert!(matches!(err, GameBoyLoadError::RomTooSmall(0x10)));
    }

    #[test]
    fn rom_only_cartridge_has_no_mapper_banking() {
        let rom = rom_with_header(0x00, 0x00);
        let cartridge = Cartridge::create(rom, None).unwrap();
        assert!(matches!(cartridge.mapper, Mapper::None));
    }

    #[test]
    fn mbc1_cartridge_type_byte_selects_mbc1() {
        let rom = rom_with_header(0x01, 0x02);
        let cartridge = Cartridge::create(rom, None).unwrap();
        assert!(matches!(cartridge.mapper, Mapper::Mbc1(_)));
        assert_eq!(cartridge.sram.len(), 8 * 1024);
    }

    #[test]
    fn unsupported_mapper_byte_is_rejected() {
        let rom = rom_with_header(0xFF, 0x00);
        let err = Cartridge::create(rom, None).unwrap_err();
        assert!(matches!(err, GameBoyLoadError::UnsupportedMapperByte(0xFF)));
    }
}
