//! Pixel fetcher and dual pixel FIFO driving mode-3 (`PixelDraw`) rendering.

use crate::ppu::registers::Registers;
use crate::ppu::{PpuFrameBuffer, SCREEN_WIDTH, SpriteData, Vram};
use arrayvec::ArrayVec;

const BG_FIFO_CAPACITY: usize = 16;

// Sprites always use $8000-based unsigned tile addressing
const SPRITE_TILE_BASE_SHIFT: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetcherState {
    GetTile,
    GetDataLow,
    GetDataHigh,
    Sleep,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchSource {
    Background,
    Window,
}

#[derive(Debug, Clone, Copy)]
struct ObjPixel {
    color: u8,
    palette: u8,
    bg_priority: bool,
}

#[derive(Debug, Clone)]
pub struct PixelFifo {
    bg_fifo: ArrayVec<u8, BG_FIFO_CAPACITY>,
    obj_overlay: Box<[Option<ObjPixel>; SCREEN_WIDTH]>,
    fetcher_state: FetcherState,
    fetcher_dots: u8,
    tile_number: u8,
    data_low: u8,
    data_high: u8,
    fetcher_x: u8,
    source: FetchSource,
    primed: bool,
    screen_x: u8,
    scx_discard: u8,
    sprite_stall_remaining: u8,
    next_sprite_idx: usize,
    window_line_counter: u8,
    window_active: bool,
    window_drawn_this_line: bool,
    line_done: bool,
}

impl PixelFifo {
    pub fn new() -> Self {
        Self {
            bg_fifo: ArrayVec::new(),
            obj_overlay: Box::new([None; SCREEN_WIDTH]),
            fetcher_state: FetcherState::GetTile,
            fetcher_dots: 0,
            tile_number: 0,
            data_low: 0,
            data_high: 0,
            fetcher_x: 0,
            source: FetchSource::Background,
            primed: false,
            screen_x: 0,
            scx_discard: 0,
            sprite_stall_remaining: 0,
            next_sprite_idx: 0,
            window_line_counter: 0,
            window_active: false,
            window_drawn_this_line: false,
            line_done: true,
        }
    }

    pub fn reset_window_state(&mut self) {
        self.window_line_counter = 0;
        self.window_drawn_this_line = false;
    }

    // Called once per line, just before LY advances, to latch the window line counter.
    pub fn check_window_y(&mut self, _scanline: u8, _registers: &Registers) {
        if self.window_drawn_this_line {
            self.window_line_counter = self.window_line_counter.wrapping_add(1);
        }
        self.window_drawn_this_line = false;
    }

    pub fn start_new_line(&mut self, _scanline: u8, registers: &Registers, _sprites: &[SpriteData]) {
        self.bg_fifo.clear();
        self.obj_overlay.fill(None);
        self.fetcher_state = FetcherState::GetTile;
        self.fetcher_dots = 0;
        self.fetcher_x = 0;
        self.source = FetchSource::Background;
        self.primed = false;
        self.screen_x = 0;
        self.scx_discard = registers.bg_x_scroll & 0x07;
        self.sprite_stall_remaining = 0;
        self.next_sprite_idx = 0;
        self.window_active = false;
        self.line_done = false;
    }

    pub fn done_with_line(&self) -> bool {
        self.line_done
    }

    pub fn tick(
        &mut self,
        vram: &Vram,
        registers: &Registers,
        sprite_buffer: &[SpriteData],
        scanline: u8,
        frame_buffer: &mut PpuFrameBuffer,
    ) {
        if self.line_done {
            return;
        }

        if self.sprite_stall_remaining > 0 {
            self.sprite_stall_remaining -= 1;
            return;
        }

        if registers.sprites_enabled {
            while let Some(sprite) = sprite_buffer.get(self.next_sprite_idx) {
                let sprite_left = i16::from(sprite.x) - 8;
                if sprite_left > i16::from(self.screen_x) {
                    break;
                }

                self.fetch_sprite_into_overlay(sprite, vram, registers, scanline);
                self.next_sprite_idx += 1;
                // 6 dots for an aligned fetch; real hardware pays more for a fetch already in
                // flight, but this core does not model sub-fetch interruption.
                self.sprite_stall_remaining += 6;
            }

            if self.sprite_stall_remaining > 0 {
                self.sprite_stall_remaining -= 1;
                return;
            }
        }

        self.advance_fetcher(vram, registers, scanline);

        if registers.window_enabled
            && !self.window_active
            && scanline >= registers.window_y
            && registers.window_x <= 166
            && u16::from(self.screen_x) + 7 >= u16::from(registers.window_x)
        {
            self.source = FetchSource::Window;
            self.fetcher_x = 0;
            self.bg_fifo.clear();
            self.fetcher_state = FetcherState::GetTile;
            self.fetcher_dots = 0;
            self.window_active = true;
            self.window_drawn_this_line = true;
        }

        if self.primed && !self.bg_fifo.is_empty() {
            let bg_color = self.bg_fifo.remove(0);

            if self.scx_discard > 0 {
                self.scx_discard -= 1;
                return;
            }

            let effective_bg_color = if registers.bg_enabled { bg_color } else { 0 };
            let obj_pixel = self.obj_overlay[self.screen_x as usize];

            let shade = match obj_pixel {
                Some(obj) if obj.color != 0 && (!obj.bg_priority || effective_bg_color == 0) => {
                    registers.sprite_palettes[obj.palette as usize][obj.color as usize]
                }
                _ => registers.bg_palette[effective_bg_color as usize],
            };

            frame_buffer.set(scanline, self.screen_x, shade);

            self.screen_x += 1;
            if self.screen_x as usize == SCREEN_WIDTH {
                self.line_done = true;
            }
        }
    }

    fn advance_fetcher(&mut self, vram: &Vram, registers: &Registers, scanline: u8) {
        if self.fetcher_dots > 0 {
            self.fetcher_dots -= 1;
            return;
        }

        match self.fetcher_state {
            FetcherState::GetTile => {
                self.tile_number = self.fetch_tile_number(vram, registers, scanline);
                self.fetcher_state = FetcherState::GetDataLow;
                self.fetcher_dots = 1;
            }
            FetcherState::GetDataLow => {
                self.data_low = self.fetch_tile_data(vram, registers, scanline, false);
                self.fetcher_state = FetcherState::GetDataHigh;
                self.fetcher_dots = 1;
            }
            FetcherState::GetDataHigh => {
                self.data_high = self.fetch_tile_data(vram, registers, scanline, true);
                if self.bg_fifo.len() <= 8 {
                    self.fetcher_state = FetcherState::Push;
                    self.fetcher_dots = 0;
                } else {
                    self.fetcher_state = FetcherState::Sleep;
                    self.fetcher_dots = 1;
                }
            }
            FetcherState::Sleep => {
                self.fetcher_state = FetcherState::Push;
                self.fetcher_dots = 0;
            }
            FetcherState::Push => {
                if self.bg_fifo.len() <= 8 {
                    for bit in 0..8u8 {
                        let shift = 7 - bit;
                        let lo = (self.data_low >> shift) & 1;
                        let hi = (self.data_high >> shift) & 1;
                        let _ = self.bg_fifo.try_push((hi << 1) | lo);
                    }
                    if self.bg_fifo.len() >= 8 {
                        self.primed = true;
                    }
                    self.fetcher_x = self.fetcher_x.wrapping_add(1);
                    self.fetcher_state = FetcherState::GetTile;
                    self.fetcher_dots = 1;
                }
            }
        }
    }

    fn fetch_tile_number(&self, vram: &Vram, registers: &Registers, scanline: u8) -> u8 {
        let map_addr = match self.source {
            FetchSource::Window => {
                let tile_row = u16::from(self.window_line_counter / 8);
                let tile_col = u16::from(self.fetcher_x) & 0x1F;
                registers.window_tile_map_addr + tile_row * 32 + tile_col
            }
            FetchSource::Background => {
                let tile_row = ((u16::from(scanline) + u16::from(registers.bg_y_scroll)) / 8) & 0x1F;
                let tile_col =
                    ((u16::from(registers.bg_x_scroll) / 8) + u16::from(self.fetcher_x)) & 0x1F;
                registers.bg_tile_map_addr + tile_row * 32 + tile_col
            }
        };

        vram[map_addr as usize]
    }

    fn fetch_tile_data(&self, vram: &Vram, registers: &Registers, scanline: u8, high: bool) -> u8 {
        let row_in_tile = match self.source {
            FetchSource::Window => u16::from(self.window_line_counter) & 7,
            FetchSource::Background => (u16::from(scanline) + u16::from(registers.bg_y_scroll)) & 7,
        };

        let tile_addr = registers.bg_tile_data_area.tile_address(self.tile_number);
        let addr = tile_addr + row_in_tile * 2 + u16::from(high);
        vram[addr as usize]
    }

    fn fetch_sprite_into_overlay(
        &mut self,
        sprite: &SpriteData,
        vram: &Vram,
        registers: &Registers,
        scanline: u8,
    ) {
        let sprite_height: u8 = if registers.double_height_sprites { 16 } else { 8 };
        let mut row = (i16::from(scanline) - (i16::from(sprite.y) - 16)) as u8;
        if sprite.vertical_flip {
            row = sprite_height - 1 - row;
        }

        let tile_number = if registers.double_height_sprites {
            if row < 8 { sprite.tile_number & 0xFE } else { sprite.tile_number | 0x01 }
        } else {
            sprite.tile_number
        };

        let tile_addr = u16::from(tile_number) << SPRITE_TILE_BASE_SHIFT;
        let row_in_tile = u16::from(row & 7);
        let low = vram[(tile_addr + row_in_tile * 2) as usize];
        let high = vram[(tile_addr + row_in_tile * 2 + 1) as usize];

        let sprite_left = i16::from(sprite.x) - 8;
        for px in 0..8i16 {
            let bit = if sprite.horizontal_flip { px as u8 } else { 7 - px as u8 };
            let color = (((high >> bit) & 1) << 1) | ((low >> bit) & 1);
            if color == 0 {
                continue;
            }

            let col = sprite_left + px;
            if !(0..SCREEN_WIDTH as i16).contains(&col) {
                continue;
            }

            let slot = &mut self.obj_overlay[col as usize];
            if slot.is_none() || slot.is_some_and(|existing| existing.color == 0) {
                *slot =
                    Some(ObjPixel { color, palette: sprite.palette, bg_priority: sprite.low_priority });
            }
        }
    }
}

impl Default for PixelFifo {
    fn default() -> Self {
        Self::new()
    }
}
