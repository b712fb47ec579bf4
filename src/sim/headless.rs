//! The in-memory Screen/Keyboard stand-ins used by `--headless` and by
//! every test in this crate: an owned pixel buffer and a settable
//! scancode cell, with no window system dependency.

use super::{Color, Point, BLACK, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::error::SimError;

/// An owned 512x256 1-bpp framebuffer, row-major, one `bool` per pixel.
pub struct HeadlessScreen {
    pixels: Vec<bool>,
    present_count: u64,
}

impl HeadlessScreen {
    pub fn new() -> Self {
        Self {
            pixels: vec![false; SCREEN_WIDTH * SCREEN_HEIGHT],
            present_count: 0,
        }
    }

    pub fn pixel(&self, x: u16, y: u16) -> bool {
        self.pixels[y as usize * SCREEN_WIDTH + x as usize]
    }

    /// How many times `present()` has been called, useful for tests that
    /// want to assert a device tick actually ran.
    pub fn present_count(&self) -> u64 {
        self.present_count
    }

    #[cfg(feature = "screenshot")]
    pub fn save_png(&self, path: &std::path::Path) -> Result<(), SimError> {
        let mut buffer = image::GrayImage::new(SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32);
        for y in 0..SCREEN_HEIGHT {
            for x in 0..SCREEN_WIDTH {
                let value = if self.pixel(x as u16, y as u16) { 255u8 } else { 0u8 };
                buffer.put_pixel(x as u32, y as u32, image::Luma([value]));
            }
        }
        buffer
            .save(path)
            .map_err(|e| SimError::Io(e.to_string()))
    }
}

impl Default for HeadlessScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Screen for HeadlessScreen {
    fn clear(&mut self) -> Result<(), SimError> {
        self.pixels.fill(false);
        Ok(())
    }

    fn fill(&mut self, color: Color, points: &[Point]) -> Result<(), SimError> {
        let on = color != BLACK;
        for point in points {
            self.pixels[point.y as usize * SCREEN_WIDTH + point.x as usize] = on;
        }
        Ok(())
    }

    fn present(&mut self) {
        self.present_count += 1;
    }
}

/// A settable scancode cell: `set` models a key-down event, `release`
/// models the scancode returning to idle (0).
pub struct HeadlessKeyboard {
    scancode: u16,
}

impl HeadlessKeyboard {
    pub fn new() -> Self {
        Self { scancode: 0 }
    }

    pub fn with_scancode(scancode: u16) -> Self {
        Self { scancode }
    }

    pub fn set(&mut self, scancode: u16) {
        self.scancode = scancode;
    }

    pub fn release(&mut self) {
        self.scancode = 0;
    }
}

impl Default for HeadlessKeyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Keyboard for HeadlessKeyboard {
    fn poll(&mut self) -> u16 {
        self.scancode
    }
}

/// A shared handle to a [`HeadlessScreen`], so a caller can keep reading
/// the framebuffer (e.g. to save a screenshot) after handing a `Screen`
/// implementation off to a [`super::Simulator`].
#[derive(Clone)]
pub struct HeadlessScreenHandle(std::rc::Rc<std::cell::RefCell<HeadlessScreen>>);

impl HeadlessScreenHandle {
    pub fn new() -> Self {
        Self(std::rc::Rc::new(std::cell::RefCell::new(HeadlessScreen::new())))
    }

    #[cfg(feature = "screenshot")]
    pub fn save_png(&self, path: &std::path::Path) -> Result<(), SimError> {
        self.0.borrow().save_png(path)
    }
}

impl Default for HeadlessScreenHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl super::Screen for HeadlessScreenHandle {
    fn clear(&mut self) -> Result<(), SimError> {
        self.0.borrow_mut().clear()
    }

    fn fill(&mut self, color: Color, points: &[Point]) -> Result<(), SimError> {
        self.0.borrow_mut().fill(color, points)
    }

    fn present(&mut self) {
        self.0.borrow_mut().present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Screen;

    #[test]
    fn fill_and_clear_round_trip() {
        let mut screen = HeadlessScreen::new();
        screen.fill(super::super::WHITE, &[Point { x: 3, y: 1 }]).unwrap();
        assert!(screen.pixel(3, 1));
        screen.clear().unwrap();
        assert!(!screen.pixel(3, 1));
    }

    #[test]
    fn present_increments_counter() {
        let mut screen = HeadlessScreen::new();
        screen.present();
        screen.present();
        assert_eq!(screen.present_count(), 2);
    }

    #[test]
    fn keyboard_defaults_to_idle() {
        let mut keyboard = HeadlessKeyboard::new();
        assert_eq!(keyboard.poll(), 0);
        keyboard.set(42);
        assert_eq!(keyboard.poll(), 42);
        keyboard.release();
        assert_eq!(keyboard.poll(), 0);
    }
}
