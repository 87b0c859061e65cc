use crate::emulator::image::ProgramImage;
use crate::hardware::keyboard::KeyboardInputProvider;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Number of addressable 16 bit cells.
pub const MEMORY_SIZE: usize = 1 << 16;

/// Addresses aliased to keyboard device registers.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, enumn::N)]
pub enum DeviceRegister {
    /// Keyboard status register; bit 15 is high while a character is ready.
    KeyboardStatus = 0xFE00,
    /// Keyboard data register; the most recently polled character.
    KeyboardData = 0xFE02,
}

impl DeviceRegister {
    /// The address this register is mapped at.
    #[must_use]
    pub const fn address(self) -> u16 {
        self as u16
    }
}

/// The machine's flat address space with the keyboard device mapped into it.
///
/// Every 16 bit value is a valid address; there are no fault semantics. The
/// input capability is injected at construction so tests can substitute a
/// scripted source.
pub struct Memory {
    /// Index equals memory address.
    data: Vec<u16>,
    keyboard: Rc<RefCell<dyn KeyboardInputProvider>>,
}

impl Memory {
    const KEYBOARD_READY: u16 = 1 << 15;

    /// Zeroed memory wired to the given input source.
    #[must_use]
    pub fn new(keyboard: Rc<RefCell<dyn KeyboardInputProvider>>) -> Self {
        Self {
            data: vec![0; MEMORY_SIZE],
            keyboard,
        }
    }

    /// The word at `address`.
    ///
    /// Reading [`DeviceRegister::KeyboardStatus`] polls the keyboard first: a
    /// ready character lands in [`DeviceRegister::KeyboardData`] with the
    /// status bit raised, otherwise the status register is cleared. Every
    /// other address, the data register included, is a plain lookup.
    pub fn read(&mut self, address: u16) -> u16 {
        if DeviceRegister::n(address) == Some(DeviceRegister::KeyboardStatus) {
            self.poll_keyboard();
        }
        self.data[usize::from(address)]
    }

    /// Stores `value` at `address`. A plain store everywhere, device
    /// addresses included; only keyboard input is emulated.
    pub fn write(&mut self, address: u16, value: u16) {
        self.data[usize::from(address)] = value;
    }

    /// Copies an image's words into place at its origin. Cells outside the
    /// image keep their previous contents.
    pub fn load_image(&mut self, image: &ProgramImage) {
        let origin = usize::from(image.origin());
        self.data[origin..origin + image.len()].copy_from_slice(image.words());
    }

    // Poll failures count as "no key ready"; the memory bus has no error
    // channel.
    fn poll_keyboard(&mut self) {
        let key = {
            let mut keyboard = self.keyboard.borrow_mut();
            match keyboard.poll_ready() {
                Ok(true) => keyboard.read_char().ok(),
                Ok(false) | Err(_) => None,
            }
        };
        let status = usize::from(DeviceRegister::KeyboardStatus.address());
        if let Some(byte) = key {
            self.data[status] = Self::KEYBOARD_READY;
            self.data[usize::from(DeviceRegister::KeyboardData.address())] = u16::from(byte);
        } else {
            self.data[status] = 0;
        }
    }
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let occupied = self.data.iter().filter(|word| **word != 0).count();
        write!(f, "Memory {{ occupied cells: {occupied} }}")
    }
}
