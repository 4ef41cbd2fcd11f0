pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub const MAX_SPRITE_ROWS: usize = 15;

/// Row-major, origin top-left.
pub type Grid = [[bool; WIDTH]; HEIGHT];

/// The logical 64x32 monochrome screen. Turning it into real pixels is up
/// to whoever reads [`FrameBuffer::snapshot`].
#[derive(Clone)]
pub struct FrameBuffer {
    bit_buffer: Grid,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bit_buffer: [[false; WIDTH]; HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        self.bit_buffer = [[false; WIDTH]; HEIGHT];
    }

    /// XORs `sprite` onto the grid at (x, y), wrapping at both edges.
    /// Returns true if any lit pixel got switched off.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut collision = false;
        for (j, row) in sprite.iter().take(MAX_SPRITE_ROWS).enumerate() {
            let ny = (y as usize + j) % HEIGHT;
            for i in 0..8 {
                if (row >> (7 - i)) & 1 == 0 {
                    continue;
                }
                let nx = (x as usize + i) % WIDTH;
                let pixel = &mut self.bit_buffer[ny][nx];
                collision |= *pixel;
                *pixel = !*pixel;
            }
        }
        collision
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.bit_buffer[y % HEIGHT][x % WIDTH]
    }

    pub fn snapshot(&self) -> Grid {
        self.bit_buffer
    }

    pub fn lit_pixels(&self) -> usize {
        self.bit_buffer
            .iter()
            .map(|row| row.iter().filter(|p| **p).count())
            .sum()
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_msb_first() {
        let mut fb = FrameBuffer::new();
        assert!(!fb.draw_sprite(10, 5, &[0b1010_0000]));
        assert!(fb.pixel(10, 5));
        assert!(!fb.pixel(11, 5));
        assert!(fb.pixel(12, 5));
        assert_eq!(fb.lit_pixels(), 2);
    }

    #[test]
    fn redraw_erases_and_collides() {
        let mut fb = FrameBuffer::new();
        let sprite = [0xF0, 0x90, 0x90, 0x90, 0xF0];
        assert!(!fb.draw_sprite(3, 4, &sprite));
        let drawn = fb.snapshot();
        assert!(fb.draw_sprite(3, 4, &sprite));
        assert_eq!(fb.snapshot(), FrameBuffer::new().snapshot());
        assert_ne!(drawn, fb.snapshot());
    }

    #[test]
    fn collision_is_aggregated_over_rows() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 0, &[0x80]);
        // only the first row overlaps, the last row does not
        assert!(fb.draw_sprite(0, 0, &[0x80, 0x00, 0x01]));
        assert!(!fb.pixel(0, 0));
        assert!(fb.pixel(7, 2));
    }

    #[test]
    fn wraps_at_edges() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(62, 31, &[0xFF, 0xFF]);
        assert!(fb.pixel(62, 31));
        assert!(fb.pixel(63, 31));
        assert!(fb.pixel(0, 31));
        assert!(fb.pixel(5, 31));
        assert!(fb.pixel(62, 0));
        assert!(fb.pixel(5, 0));
        assert_eq!(fb.lit_pixels(), 16);
    }

    #[test]
    fn coordinates_past_screen_wrap() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(70, 40, &[0x80]);
        assert!(fb.pixel(6, 8));
    }

    #[test]
    fn clear_zeroes_grid() {
        let mut fb = FrameBuffer::new();
        fb.draw_sprite(0, 0, &[0xFF; 15]);
        fb.clear();
        assert_eq!(fb.lit_pixels(), 0);
        assert!(fb.snapshot().iter().flatten().all(|p| !p));
    }
}
