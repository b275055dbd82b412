// Core types shared by the capture, detection and preview stages.

use image::{Rgb, RgbImage};

/// Software canvas pushed to the preview window.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // canvas width in pixels
    pub height: usize,     // canvas height in pixels
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn clear(&mut self, color: u32) {
        for p in &mut self.pixels { *p = color; }
    }
}

/// One captured scan window: a square RGB grid, `2 * half_size` on a side.
/// Owned by the cycle that captured it and dropped once detection is done.
pub struct PixelBuffer {
    image: RgbImage,
}

impl PixelBuffer {
    /// Wrap an already decoded image.
    pub fn from_image(image: RgbImage) -> Self {
        Self { image }
    }

    /// Build a buffer from 32bpp ZPixmap rows (B, G, R, pad per pixel).
    /// Returns None when `data` is too short for the requested size.
    pub fn from_bgrx(width: u32, height: u32, data: &[u8]) -> Option<Self> {
        let needed = (width as usize) * (height as usize) * 4;
        if data.len() < needed {
            return None;
        }
        let image = RgbImage::from_fn(width, height, |x, y| {
            let i = ((y * width + x) * 4) as usize;
            Rgb([data[i + 2], data[i + 1], data[i]])
        });
        Some(Self::from_image(image))
    }

    pub fn width(&self) -> u32 { self.image.width() }
    pub fn height(&self) -> u32 { self.image.height() }

    #[inline]
    pub fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    /// Packed 0x00RRGGBB for drawing into a FrameBuffer.
    #[inline]
    pub fn packed(&self, x: u32, y: u32) -> u32 {
        let [r, g, b] = self.rgb(x, y);
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }
}

/// Buffer-local pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }
}

/// Corners found by the forward and reverse scans. Lives for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl BoundingBox {
    /// Vertical extent used by the scan-window sizing policy.
    pub fn vertical_extent(&self) -> i32 {
        (self.top_left.y - self.bottom_right.y).abs()
    }
}

/// Window-local capture rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub size: u32,
}

/// Handle of a desktop window (X11 window id).
pub type WindowId = u32;
