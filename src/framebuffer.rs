//! A flat, row-major pixel surface the render workers write into
//! directly (each pixel owned by exactly one task's row range, so no
//! locking is needed during the render itself).

use crate::math::Color;

pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    samples: Vec<f32>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, samples: vec![0.0; (width as usize) * (height as usize) * 3] }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 3
    }

    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.samples[i] = color.x as f32;
        self.samples[i + 1] = color.y as f32;
        self.samples[i + 2] = color.z as f32;
    }

    pub fn get(&self, x: u32, y: u32) -> Color {
        let i = self.index(x, y);
        Color::new(self.samples[i] as f64, self.samples[i + 1] as f64, self.samples[i + 2] as f64)
    }

    pub fn row_range(&self, y0: u32, y1: u32) -> &[f32] {
        &self.samples[self.index(0, y0)..self.index(0, y1)]
    }

    /// Converts every sample to gamma-corrected 8-bit RGB, for handing
    /// off to image encoding.
    pub fn to_rgb8(&self, gamma: f64) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len());
        for chunk in self.samples.chunks_exact(3) {
            let c = Color::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64).gamma_correct(gamma);
            let rgb = c.to_rgb8();
            out.extend_from_slice(&rgb);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.set(1, 2, Color::new(0.5, 0.25, 0.1));
        let c = fb.get(1, 2);
        assert!((c.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn to_rgb8_has_correct_length() {
        let fb = FrameBuffer::new(2, 3);
        assert_eq!(fb.to_rgb8(2.2).len(), 2 * 3 * 3);
    }
}
