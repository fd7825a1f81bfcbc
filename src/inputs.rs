//! Game Boy input handling

use crate::GetBit;
use crate::interrupts::InterruptRegisters;
use crate::sm83::InterruptType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameBoyInputs {
    pub up: bool,
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
}

// JOYP ($FF00): bits 4-5 select d-pad/buttons (active low), bits 0-3 report the active-low
// state of whichever group(s) are selected. `select_dpad`/`select_buttons` mirror the raw,
// as-written bit values (true means the group is NOT selected), matching the register layout.
#[derive(Debug, Clone)]
pub struct InputState {
    inputs: GameBoyInputs,
    select_dpad: bool,
    select_buttons: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self { inputs: GameBoyInputs::default(), select_dpad: true, select_buttons: true }
    }

    pub fn set_inputs(&mut self, inputs: GameBoyInputs) {
        self.inputs = inputs;
    }

    fn dpad_nibble(&self) -> u8 {
        !((u8::from(self.inputs.down) << 3)
            | (u8::from(self.inputs.up) << 2)
            | (u8::from(self.inputs.left) << 1)
            | u8::from(self.inputs.right))
            & 0x0F
    }

    fn buttons_nibble(&self) -> u8 {
        !((u8::from(self.inputs.start) << 3)
            | (u8::from(self.inputs.select) << 2)
            | (u8::from(self.inputs.b) << 1)
            | u8::from(self.inputs.a))
            & 0x0F
    }

    fn input_nibble(&self) -> u8 {
        // If both groups are selected (both bits low), real hardware ANDs the two nibbles
        match (self.select_dpad, self.select_buttons) {
            (false, false) => self.dpad_nibble() & self.buttons_nibble(),
            (false, true) => self.dpad_nibble(),
            (true, false) => self.buttons_nibble(),
            (true, true) => 0x0F,
        }
    }

    // $FF00: JOYP
    pub fn read_joyp(&self) -> u8 {
        0xC0 | (u8::from(self.select_buttons) << 5)
            | (u8::from(self.select_dpad) << 4)
            | self.input_nibble()
    }

    // $FF00: JOYP
    pub fn write_joyp(&mut self, value: u8, interrupt_registers: &mut InterruptRegisters) {
        let previous_nibble = self.input_nibble();

        self.select_buttons = value.bit(5);
        self.select_dpad = value.bit(4);

        log::trace!("JOYP write: {value:02X}");
        log::trace!("  Dpad selected: {}", !self.select_dpad);
        log::trace!("  Buttons selected: {}", !self.select_buttons);

        // Approximate the joypad interrupt: a write that moves the selected nibble from
        // all-1s (nothing selected, or nothing pressed) to something with a 0 bit is the
        // best signal this core can observe without cycle-accurate input polling.
        let new_nibble = self.input_nibble();
        if previous_nibble == 0x0F && new_nibble != 0x0F {
            interrupt_registers.set_flag(InterruptType::Joypad);
        }
    }
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}
