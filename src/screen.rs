use anyhow::Context;
use chip8vm::display::{Grid, HEIGHT, WIDTH};
use chip8vm::keyboard::Keypad;
use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};

// 1 2 3 C        1 2 3 4
// 4 5 6 D   <-   Q W E R
// 7 8 9 E        A S D F
// A 0 B F        Z X C V
const KEYMAP: [(Key, u8); 16] = [
    (Key::Key1, 0x1),
    (Key::Key2, 0x2),
    (Key::Key3, 0x3),
    (Key::Key4, 0xC),
    (Key::Q, 0x4),
    (Key::W, 0x5),
    (Key::E, 0x6),
    (Key::R, 0xD),
    (Key::A, 0x7),
    (Key::S, 0x8),
    (Key::D, 0x9),
    (Key::F, 0xE),
    (Key::Z, 0xA),
    (Key::X, 0x0),
    (Key::C, 0xB),
    (Key::V, 0xF),
];

const PIXEL_ON: u32 = from_u16_rgb(0, 127, 255);
const PIXEL_OFF: u32 = from_u16_rgb(0, 0, 0);

const fn from_u16_rgb(r: u16, g: u16, b: u16) -> u32 {
    let (r, g, b) = (r as u32, g as u32, b as u32);
    (r << 16) | (g << 8) | b
}

fn scale_for(factor: usize) -> Scale {
    match factor {
        0 | 1 => Scale::X1,
        2 => Scale::X2,
        3 | 4 => Scale::X4,
        5..=8 => Scale::X8,
        9..=16 => Scale::X16,
        _ => Scale::X32,
    }
}

fn grid_to_pixels(grid: &Grid, pixel_buffer: &mut [u32]) {
    for (dst, lit) in pixel_buffer.iter_mut().zip(grid.iter().flatten()) {
        *dst = if *lit { PIXEL_ON } else { PIXEL_OFF };
    }
}

/// minifb window showing the frame buffer and feeding the keypad.
pub struct Screen {
    window: Window,
    pixel_buffer: Vec<u32>,
}

impl Screen {
    pub fn new(scale: usize) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "chip8vm - ESC to exit",
            WIDTH,
            HEIGHT,
            WindowOptions {
                scale: scale_for(scale),
                ..WindowOptions::default()
            },
        )
        .context("opening window")?;
        // Limit to max ~60 fps update rate
        window.limit_update_rate(Some(std::time::Duration::from_micros(16600)));
        Ok(Self {
            window,
            pixel_buffer: vec![PIXEL_OFF; WIDTH * HEIGHT],
        })
    }

    /// Mirrors the host keyboard into `keypad`. Closing the window or ESC
    /// raises the quit flag.
    pub fn poll_keys(&self, keypad: &mut Keypad) -> chip8vm::Result<()> {
        if !self.window.is_open() || self.window.is_key_pressed(Key::Escape, KeyRepeat::No) {
            keypad.request_quit();
        }
        for (key, num) in KEYMAP {
            if self.window.is_key_down(key) {
                keypad.key_down(num)?;
            } else {
                keypad.key_up(num)?;
            }
        }
        Ok(())
    }

    pub fn draw(&mut self, grid: &Grid) -> anyhow::Result<()> {
        grid_to_pixels(grid, &mut self.pixel_buffer);
        self.window
            .update_with_buffer(&self.pixel_buffer, WIDTH, HEIGHT)
            .context("updating window")?;
        Ok(())
    }
}
