// X11 desktop: window tree search, ZPixmap capture, keymap polling,
// XTEST relative motion and the scan-window outline.

use crate::error::{Error, Result};
use crate::platform::{
    FrameSource, Key, KeyQuery, Overlay, PointerActuator, TargetWindow, WindowResolver,
};
use crate::types::{PixelBuffer, Region, WindowId};
use tracing::{debug, trace, warn};
use x11rb::connection::{Connection, RequestConnection};
use x11rb::protocol::xproto::{
    self, AtomEnum, ChangeGCAux, ConnectionExt as _, CreateGCAux, Gcontext, ImageFormat, Keycode,
    Rectangle, Window,
};
use x11rb::protocol::xtest::{self, ConnectionExt as _};
use x11rb::rust_connection::RustConnection;

// WM_NAME longer than this is truncated; we only need a substring match.
const NAME_LEN_WORDS: u32 = 256;

pub struct X11Desktop {
    conn: RustConnection,
    root: Window,
    gc: Gcontext,
    keycodes: Vec<(Key, Keycode)>,
}

impl X11Desktop {
    /// Connect to `$DISPLAY` and prepare the GC and keycode table.
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn.setup().roots[screen_num].root;

        if conn.extension_information(xtest::X11_EXTENSION_NAME)?.is_none() {
            return Err(Error::MissingExtension("XTEST"));
        }

        let gc = conn.generate_id()?;
        conn.create_gc(gc, root, &CreateGCAux::new().foreground(0x00_FF_00))?;

        let keycodes = keycode_table(&conn)?;
        debug!(root, keys = keycodes.len(), "connected to X server");
        Ok(Self { conn, root, gc, keycodes })
    }

    fn window_name(&self, window: Window) -> Result<Option<String>> {
        let reply = self
            .conn
            .get_property(false, window, AtomEnum::WM_NAME, AtomEnum::ANY, 0, NAME_LEN_WORDS)?
            .reply()?;
        if reply.value.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    }

    /// Depth-first search for the first window whose title contains `needle`.
    fn find_window(&self, current: Window, needle: &str) -> Result<Option<Window>> {
        if self.window_name(current)?.is_some_and(|name| name.contains(needle)) {
            return Ok(Some(current));
        }
        let tree = self.conn.query_tree(current)?.reply()?;
        for child in tree.children {
            match self.find_window(child, needle) {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) => {}
                // Windows come and go while we walk; skip vanished subtrees.
                Err(e) => trace!(child, error = %e, "skipping window"),
            }
        }
        Ok(None)
    }

    /// First child of `window` (the client surface under the frame), or itself.
    fn first_child(&self, window: Window) -> Result<Window> {
        let tree = self.conn.query_tree(window)?.reply()?;
        Ok(tree.children.first().copied().unwrap_or(window))
    }

    /// Deepest window under the pointer.
    fn window_under_pointer(&self) -> Result<Option<Window>> {
        let mut window = self.conn.query_pointer(self.root)?.reply()?.child;
        if window == x11rb::NONE {
            return Ok(None);
        }
        loop {
            let child = self.conn.query_pointer(window)?.reply()?.child;
            if child == x11rb::NONE {
                return Ok(Some(window));
            }
            window = child;
        }
    }

    fn locate(&self, needle: &str) -> Result<Option<TargetWindow>> {
        let window = match self.find_window(self.root, needle)? {
            Some(w) => Some(self.first_child(w).unwrap_or(w)),
            None => self.window_under_pointer()?,
        };
        let Some(id) = window else { return Ok(None) };
        let geo = self.conn.get_geometry(id)?.reply()?;
        Ok(Some(TargetWindow { id, width: geo.width as u32, height: geo.height as u32 }))
    }

    fn grab(&self, window: WindowId, region: Region) -> Result<Option<PixelBuffer>> {
        let size = region.size as u16;
        let reply = self
            .conn
            .get_image(ImageFormat::Z_PIXMAP, window, region.x as i16, region.y as i16, size, size, !0)?
            .reply()?;
        // 24/32-bit visuals come back as 4 bytes per pixel, BGRX.
        if reply.depth < 24 {
            return Ok(None);
        }
        Ok(PixelBuffer::from_bgrx(region.size, region.size, &reply.data))
    }

    fn keymap(&self) -> Result<[u8; 32]> {
        Ok(self.conn.query_keymap()?.reply()?.keys)
    }

    fn fake_motion(&self, dx: i32, dy: i32) -> Result<()> {
        let clamp = |v: i32| v.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        // detail = 1 marks the motion as relative.
        self.conn.xtest_fake_input(
            xproto::MOTION_NOTIFY_EVENT,
            1,
            x11rb::CURRENT_TIME,
            x11rb::NONE,
            clamp(dx),
            clamp(dy),
            0,
        )?;
        self.conn.flush()?;
        Ok(())
    }

    fn outline(&self, window: WindowId, x: i32, y: i32, size: u32, color: u32) -> Result<()> {
        self.conn.change_gc(self.gc, &ChangeGCAux::new().foreground(color))?;
        let rect = Rectangle { x: x as i16, y: y as i16, width: size as u16, height: size as u16 };
        self.conn.poly_rectangle(window, self.gc, &[rect])?;
        self.conn.flush()?;
        Ok(())
    }
}

/// Map each logical key to the first keycode producing its keysym.
fn keycode_table(conn: &RustConnection) -> Result<Vec<(Key, Keycode)>> {
    let setup = conn.setup();
    let (min, max) = (setup.min_keycode, setup.max_keycode);
    let mapping = conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
    let per = mapping.keysyms_per_keycode as usize;

    let mut table = Vec::new();
    for key in Key::ALL {
        let found = mapping
            .keysyms
            .chunks(per.max(1))
            .position(|syms| syms.contains(&key.keysym()));
        match found {
            Some(i) => table.push((key, min + i as u8)),
            None => warn!(?key, "no keycode for key, it will never read as pressed"),
        }
    }
    Ok(table)
}

impl Drop for X11Desktop {
    fn drop(&mut self) {
        let _ = self.conn.free_gc(self.gc);
        let _ = self.conn.flush();
    }
}

impl FrameSource for X11Desktop {
    fn capture(&mut self, window: WindowId, region: Region) -> Option<PixelBuffer> {
        match self.grab(window, region) {
            Ok(buf) => buf,
            Err(e) => {
                debug!(window, error = %e, "capture failed");
                None
            }
        }
    }
}

impl PointerActuator for X11Desktop {
    fn move_relative(&mut self, dx: i32, dy: i32) {
        if let Err(e) = self.fake_motion(dx, dy) {
            warn!(error = %e, "pointer move failed");
        }
    }
}

impl WindowResolver for X11Desktop {
    fn resolve(&mut self, needle: &str) -> Option<TargetWindow> {
        match self.locate(needle) {
            Ok(found) => found,
            Err(e) => {
                warn!(needle, error = %e, "window lookup failed");
                None
            }
        }
    }
}

impl Overlay for X11Desktop {
    fn draw_frame(&mut self, window: WindowId, x: i32, y: i32, size: u32, color: u32) {
        if let Err(e) = self.outline(window, x, y, size, color) {
            trace!(window, error = %e, "outline draw failed");
        }
    }
}

impl KeyQuery for X11Desktop {
    fn is_down(&self, key: Key) -> bool {
        let Some(&(_, code)) = self.keycodes.iter().find(|(k, _)| *k == key) else {
            return false;
        };
        match self.keymap() {
            Ok(keys) => keys[(code >> 3) as usize] & (1 << (code & 7)) != 0,
            Err(e) => {
                debug!(error = %e, "keymap query failed");
                false
            }
        }
    }
}
