// Scan preview window + software drawing utilities.
// Visual effects provided here:
// 1) A window that mirrors the latest captured scan window.
// 2) The detected box outlined, and a crosshair on the reference point.
// 3) A tiny 5x7 bitmap font for the HUD line.

use crate::aim::ScanFrame;
use crate::error::{Error, Result};
use crate::scan::INITIAL_HALF;
use crate::types::FrameBuffer;
use crate::vision::Detection;
use minifb::{Scale, Window, WindowOptions};

/// Logical preview size: the widest scan window.
pub const PREVIEW_SIZE: usize = (INITIAL_HALF * 2) as usize;

const BACKDROP: u32 = 0x00_10_10_18;
const BOX_COLOR: u32 = 0x00_FF_E0_20;
const CROSS_COLOR: u32 = 0x00_20_FF_60;
const HUD_COLOR: u32 = 0x00_FF_FF_FF;

pub struct Preview {
    window: Window, // the on-screen window you see
    canvas: FrameBuffer,
}

impl Preview {
    /// Open the preview window. `scale` is 1, 2 or 4.
    pub fn new(scale: u8) -> Result<Self> {
        let scale = match scale {
            4 => Scale::X4,
            2 => Scale::X2,
            _ => Scale::X1,
        };
        let opts = WindowOptions { scale, ..WindowOptions::default() };
        let window = Window::new("crimson-lock scan", PREVIEW_SIZE, PREVIEW_SIZE, opts)
            .map_err(|e| Error::PreviewInit(e.to_string()))?;
        Ok(Self { window, canvas: FrameBuffer::new(PREVIEW_SIZE, PREVIEW_SIZE) })
    }

    /// Returns false once the user closes the window.
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Draw `frame` and push it to the screen.
    pub fn show(&mut self, frame: &ScanFrame, locked_on: bool) -> Result<()> {
        render_scan(&mut self.canvas, frame, locked_on);
        self.window
            .update_with_buffer(&self.canvas.pixels, self.canvas.width, self.canvas.height)
            .map_err(|e| Error::PreviewUpdate(e.to_string()))
    }

    /// Keep the window responsive on cycles without a capture.
    pub fn idle(&mut self) {
        self.window.update();
    }
}

/// Paint a scan frame centered on the canvas, with box, crosshair and HUD.
pub fn render_scan(fb: &mut FrameBuffer, frame: &ScanFrame, locked_on: bool) {
    fb.clear(BACKDROP);
    let buf = &frame.buffer;
    let ox = (fb.width as i32 - buf.width() as i32) / 2;
    let oy = (fb.height as i32 - buf.height() as i32) / 2;

    for y in 0..buf.height() {
        for x in 0..buf.width() {
            put_pixel(fb, ox + x as i32, oy + y as i32, buf.packed(x, y));
        }
    }

    if let Detection::Found(b) = frame.detection {
        draw_rect(
            fb,
            ox + b.top_left.x.min(b.bottom_right.x),
            oy + b.top_left.y,
            ox + b.top_left.x.max(b.bottom_right.x),
            oy + b.bottom_right.y,
            BOX_COLOR,
        );
    }

    let (cx, cy) = (fb.width as i32 / 2, fb.height as i32 / 2);
    draw_crosshair(fb, cx, cy, 6, CROSS_COLOR);

    let tag = if locked_on { "LOCK" } else { "SCAN" };
    draw_text_5x7(fb, 4, 4, &format!("{tag} HALF:{}", frame.half), HUD_COLOR);
}

/* ---------- Software drawing: pixels, lines, rectangles, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Outline the rectangle with corners (x0,y0) and (x1,y1), inclusive.
pub fn draw_rect(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    draw_line(fb, x0, y0, x1, y0, color);
    draw_line(fb, x1, y0, x1, y1, color);
    draw_line(fb, x1, y1, x0, y1, color);
    draw_line(fb, x0, y1, x0, y0, color);
}

/// Draw a small crosshair centered at (cx,cy), with a gap at the center.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    draw_line(fb, cx - size, cy, cx - 2, cy, color);
    draw_line(fb, cx + 2, cy, cx + size, cy, color);
    draw_line(fb, cx, cy - size, cx, cy - 2, color);
    draw_line(fb, cx, cy + 2, cx, cy + size, color);
}

/// Return a 5x7 glyph bitmap for the characters the HUD uses.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // HUD letters: LOCK SCAN HALF
        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'N' => g!(0b10001,0b11001,0b10101,0b10011,0b10001,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y) with a 1-pixel black shadow.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    let Some(rows) = glyph5x7(ch) else { return };
    for (shift, c) in [(1, 0x00000000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) != 0 {
                    put_pixel(fb, x + rx + shift, y + ry as i32 + shift, c);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += 6; // 5 pixels glyph width + 1 pixel spacing
    }
}
