use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_long, c_uchar, c_uint, c_ulong};
use std::ptr::{null_mut, NonNull};

use fontconfig::Fontconfig;
use x11::xinerama;
use x11::{xft, xlib, xrender};

use crate::colour::{Colour, ALL_COLOURS};
use crate::error::TilemuxError;
use crate::ivec2::IVec2;
use crate::utils::die;

// From <X11/Xproto.h>
pub const X_SET_INPUT_FOCUS: u8 = 42;
pub const X_POLY_TEXT8: u8 = 74;
pub const X_POLY_FILL_RECTANGLE: u8 = 69;
pub const X_POLY_SEGMENT: u8 = 66;
pub const X_CONFIGURE_WINDOW: u8 = 12;
pub const X_GRAB_BUTTON: u8 = 28;
pub const X_GRAB_KEY: u8 = 33;
pub const X_COPY_AREA: u8 = 62;

static mut X_ERROR_OCCURRED: bool = false;

unsafe extern "C" fn x_error_ignore(
    _dpy: *mut xlib::Display,
    _ee: *mut xlib::XErrorEvent,
) -> c_int {
    0
}

unsafe extern "C" fn x_error_start(
    _dpy: *mut xlib::Display,
    _ee: *mut xlib::XErrorEvent,
) -> c_int {
    unsafe {
        X_ERROR_OCCURRED = true;
    }
    0
}

/// There is no way to check accesses to destroyed windows, so those cases
/// are ignored (especially on UnmapNotify). Everything else is fatal.
unsafe extern "C" fn x_error(_dpy: *mut xlib::Display, ee: *mut xlib::XErrorEvent) -> c_int {
    let ee = unsafe { &*ee };
    if ee.error_code == xlib::BadWindow
        || (ee.request_code == X_SET_INPUT_FOCUS && ee.error_code == xlib::BadMatch)
        || (ee.request_code == X_POLY_TEXT8 && ee.error_code == xlib::BadDrawable)
        || (ee.request_code == X_POLY_FILL_RECTANGLE && ee.error_code == xlib::BadDrawable)
        || (ee.request_code == X_POLY_SEGMENT && ee.error_code == xlib::BadDrawable)
        || (ee.request_code == X_CONFIGURE_WINDOW && ee.error_code == xlib::BadMatch)
        || (ee.request_code == X_GRAB_BUTTON && ee.error_code == xlib::BadAccess)
        || (ee.request_code == X_GRAB_KEY && ee.error_code == xlib::BadAccess)
        || (ee.request_code == X_COPY_AREA && ee.error_code == xlib::BadDrawable)
    {
        return 0;
    }
    eprintln!(
        "tilemux: fatal error: request code={}, error code={}",
        ee.request_code, ee.error_code
    );
    die("fatal X error");
}

#[derive(PartialEq, Copy, Clone)]
pub enum Net {
    Supported,
    WMName,
    WMState,
    WMCheck,
    WMFullscreen,
    ActiveWindow,
    WMWindowType,
    WMWindowTypeDialog,
    ClientList,
    Last,
}

#[derive(PartialEq, Copy, Clone)]
pub enum WM {
    Protocols,
    Delete,
    State,
    TakeFocus,
    Last,
}

pub enum Atom {
    Net(Net),
    Wm(WM),
}

pub struct Font {
    pub dpy: *mut xlib::Display,
    pub h: c_uint,
    pub xfont: *mut xft::XftFont,
}

impl Drop for Font {
    fn drop(&mut self) {
        unsafe {
            if !self.xfont.is_null() {
                xft::XftFontClose(self.dpy, self.xfont);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Window(pub xlib::Window);

impl Default for Window {
    fn default() -> Self {
        Window(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorId(pub c_ulong);

pub struct KeySpecification {
    pub mask: u32,
    pub keysym: u32,
}

/// The urgency and input fields of a window's WM_HINTS.
pub struct WmHintsInfo {
    pub urgent: bool,
    pub input: Option<bool>,
}

pub struct XWrapper {
    dpy: *mut xlib::Display,
    pub screen: c_int,
    root: xlib::Window,
    drawable: xlib::Drawable,
    gc: xlib::GC,
    xftdraw: *mut xft::XftDraw,
    pub fonts: Vec<Font>,
    colors: [xft::XftColor; ALL_COLOURS.len()],
    pub atoms: Atoms,
}

impl XWrapper {
    pub fn connect() -> Result<Self, TilemuxError> {
        unsafe {
            let dpy = xlib::XOpenDisplay(null_mut());
            NonNull::new(dpy).ok_or(TilemuxError::DisplayOpen)?;

            let screen = xlib::XDefaultScreen(dpy);
            let root = xlib::XRootWindow(dpy, screen);
            let w = xlib::XDisplayWidth(dpy, screen) as u32;
            let h = xlib::XDisplayHeight(dpy, screen) as u32;

            let drawable =
                xlib::XCreatePixmap(dpy, root, w, h, xlib::XDefaultDepth(dpy, screen) as u32);
            let gc = xlib::XCreateGC(dpy, root, 0, null_mut());
            xlib::XSetLineAttributes(dpy, gc, 1, xlib::LineSolid, xlib::CapButt, xlib::JoinMiter);

            let xftdraw = xft::XftDrawCreate(
                dpy,
                drawable,
                xlib::XDefaultVisual(dpy, screen),
                xlib::XDefaultColormap(dpy, screen),
            );
            if xftdraw.is_null() {
                die("cannot create XftDraw");
            }

            let atoms = Atoms::new(dpy);
            let mut wrapper = Self {
                dpy,
                screen,
                root,
                drawable,
                gc,
                xftdraw,
                fonts: Vec::new(),
                colors: [std::mem::zeroed(); ALL_COLOURS.len()],
                atoms,
            };
            wrapper.init_colors();
            Ok(wrapper)
        }
    }

    /// File descriptor of the display connection; closed in forked
    /// children before exec.
    pub fn connection_fd(&self) -> i32 {
        unsafe { xlib::XConnectionNumber(self.dpy) }
    }

    fn init_colors(&mut self) {
        for (i, colour) in ALL_COLOURS.iter().enumerate() {
            let [r, g, b, a] = colour.rgba();
            let mut clr = unsafe { std::mem::zeroed() };
            unsafe {
                if xft::XftColorAllocValue(
                    self.dpy,
                    xlib::XDefaultVisual(self.dpy, self.screen),
                    xlib::XDefaultColormap(self.dpy, self.screen),
                    &xrender::XRenderColor {
                        red: r as u16 * 0x101,
                        green: g as u16 * 0x101,
                        blue: b as u16 * 0x101,
                        alpha: a as u16 * 0x101,
                    },
                    &mut clr,
                ) == 0
                {
                    die("cannot allocate color");
                }
            }
            self.colors[i] = clr;
        }
    }

    pub fn fontset_create(&mut self, font_names: &[&str]) -> bool {
        // fontconfig must be initialised before Xft opens patterns
        let _fc = Fontconfig::new();
        for font_name in font_names {
            self.xfont_create(font_name);
        }
        !self.fonts.is_empty()
    }

    fn xfont_create(&mut self, font_name: &str) -> bool {
        unsafe {
            let cstr = match CString::new(font_name) {
                Ok(s) => s,
                Err(_) => {
                    log::error!("invalid font name '{}': contains NUL", font_name);
                    return false;
                }
            };
            let xfont = xft::XftFontOpenName(self.dpy, self.screen, cstr.as_ptr());
            if xfont.is_null() {
                log::error!("cannot load font from name: '{}'", font_name);
                return false;
            }
            let h = ((*xfont).ascent + (*xfont).descent) as c_uint;
            self.fonts.push(Font {
                dpy: self.dpy,
                h,
                xfont,
            });
            true
        }
    }

    pub fn get_font_height(&self) -> u32 {
        self.fonts.first().map_or(0, |f| f.h)
    }

    /// Recreate the double-buffer pixmap, e.g. after the root window grew.
    pub fn resize_drawable(&mut self, w: u32, h: u32) {
        unsafe {
            xft::XftDrawDestroy(self.xftdraw);
            xlib::XFreePixmap(self.dpy, self.drawable);
            self.drawable = xlib::XCreatePixmap(
                self.dpy,
                self.root,
                w.max(1),
                h.max(1),
                xlib::XDefaultDepth(self.dpy, self.screen) as u32,
            );
            self.xftdraw = xft::XftDrawCreate(
                self.dpy,
                self.drawable,
                xlib::XDefaultVisual(self.dpy, self.screen),
                xlib::XDefaultColormap(self.dpy, self.screen),
            );
        }
    }

    pub fn rect(&mut self, color: Colour, tl: IVec2, wh: IVec2, filled: bool) {
        let clr = &self.colors[color as usize];
        unsafe {
            xlib::XSetForeground(self.dpy, self.gc, clr.pixel);
            if filled {
                xlib::XFillRectangle(
                    self.dpy,
                    self.drawable,
                    self.gc,
                    tl.x,
                    tl.y,
                    wh.x as _,
                    wh.y as _,
                );
            } else {
                xlib::XDrawRectangle(
                    self.dpy,
                    self.drawable,
                    self.gc,
                    tl.x,
                    tl.y,
                    (wh.x - 1) as _,
                    (wh.y - 1) as _,
                );
            }
        }
    }

    /// Index of the first font in the chain containing the codepoint;
    /// falls back to the primary font.
    fn font_for_char(&self, ch: char) -> usize {
        unsafe {
            self.fonts
                .iter()
                .position(|f| xft::XftCharExists(self.dpy, f.xfont, ch as c_uint) != 0)
                .unwrap_or(0)
        }
    }

    /// Split text into runs renderable by a single font each; the run
    /// boundaries are where the responsible font changes.
    fn text_runs<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        let mut runs = Vec::new();
        let mut run_start = 0;
        let mut run_font = None;
        for (i, ch) in text.char_indices() {
            let f = self.font_for_char(ch);
            match run_font {
                Some(rf) if rf == f => {}
                Some(rf) => {
                    runs.push((rf, &text[run_start..i]));
                    run_start = i;
                    run_font = Some(f);
                }
                None => run_font = Some(f),
            }
        }
        if let Some(rf) = run_font {
            runs.push((rf, &text[run_start..]));
        }
        runs
    }

    fn run_width(&self, font_idx: usize, run: &str) -> u32 {
        unsafe {
            let mut ext = std::mem::zeroed();
            xft::XftTextExtentsUtf8(
                self.dpy,
                self.fonts[font_idx].xfont,
                run.as_ptr(),
                run.len() as c_int,
                &mut ext,
            );
            ext.xOff as u32
        }
    }

    /// Fill the cell with `bg`, then draw the text in `fg`, vertically
    /// centred, using per-codepoint font fallback.
    pub fn text(&mut self, fg: Colour, bg: Colour, tl: IVec2, wh: IVec2, lpad: u32, text: &str) {
        self.rect(bg, tl, wh, true);
        if self.fonts.is_empty() || text.is_empty() {
            return;
        }
        let mut x = tl.x + lpad as i32;
        let avail_end = tl.x + wh.x;
        for (font_idx, run) in self.text_runs(text) {
            if x >= avail_end {
                break;
            }
            // shorten the run rather than paint over the next cell
            let mut run = run;
            let mut w = self.run_width(font_idx, run) as i32;
            while x + w > avail_end && !run.is_empty() {
                let cut = run
                    .char_indices()
                    .next_back()
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                run = &run[..cut];
                w = self.run_width(font_idx, run) as i32;
            }
            if run.is_empty() {
                break;
            }
            unsafe {
                let font = &self.fonts[font_idx];
                let fh = ((*font.xfont).ascent + (*font.xfont).descent) as i32;
                let y = tl.y + (wh.y - fh) / 2 + (*font.xfont).ascent as i32;
                xft::XftDrawStringUtf8(
                    self.xftdraw,
                    &mut self.colors[fg as usize],
                    font.xfont,
                    x,
                    y,
                    run.as_ptr(),
                    run.len() as c_int,
                );
            }
            x += w;
        }
    }

    pub fn text_width(&self, text: &str) -> u32 {
        if self.fonts.is_empty() {
            return 0;
        }
        self.text_runs(text)
            .iter()
            .map(|(f, run)| self.run_width(*f, run))
            .sum()
    }

    pub fn map_drawable(&mut self, win: Window, x: i32, y: i32, w: u32, h: u32) {
        unsafe {
            xlib::XCopyArea(self.dpy, self.drawable, win.0, self.gc, x, y, w, h, x, y);
            xlib::XSync(self.dpy, 0);
        }
    }

    pub fn set_error_handler(
        &self,
        handler: Option<unsafe extern "C" fn(*mut xlib::Display, *mut xlib::XErrorEvent) -> c_int>,
    ) {
        unsafe {
            xlib::XSetErrorHandler(handler);
        }
    }

    pub fn set_default_error_handler(&self) {
        self.set_error_handler(Some(x_error));
    }

    pub fn set_ignore_error_handler(&self) {
        self.set_error_handler(Some(x_error_ignore));
    }

    /// Selecting SubstructureRedirect on the root errors out when another
    /// window manager already owns it.
    pub fn check_for_other_wm(&mut self) -> Result<(), TilemuxError> {
        unsafe {
            X_ERROR_OCCURRED = false;
            self.set_error_handler(Some(x_error_start));
            xlib::XSelectInput(self.dpy, self.root, xlib::SubstructureRedirectMask);
            self.sync(false);
            if X_ERROR_OCCURRED {
                return Err(TilemuxError::OtherWm);
            }
            self.set_default_error_handler();
            self.sync(false);
        }
        Ok(())
    }

    pub fn default_screen(&self) -> i32 {
        unsafe { xlib::XDefaultScreen(self.dpy) }
    }

    pub fn root_window(&self, screen_num: i32) -> Window {
        unsafe { Window(xlib::XRootWindow(self.dpy, screen_num)) }
    }

    pub fn display_width(&self, screen_num: i32) -> i32 {
        unsafe { xlib::XDisplayWidth(self.dpy, screen_num) }
    }

    pub fn display_height(&self, screen_num: i32) -> i32 {
        unsafe { xlib::XDisplayHeight(self.dpy, screen_num) }
    }

    pub fn default_depth(&self, screen_num: i32) -> c_int {
        unsafe { xlib::XDefaultDepth(self.dpy, screen_num) }
    }

    pub fn default_visual(&self, screen_num: i32) -> *mut xlib::Visual {
        unsafe { xlib::XDefaultVisual(self.dpy, screen_num) }
    }

    /// Unique monitor rectangles reported by Xinerama, or None when the
    /// extension is inactive.
    pub fn xinerama_screens(&self) -> Option<Vec<(i32, i32, i32, i32)>> {
        unsafe {
            if xinerama::XineramaIsActive(self.dpy) == 0 {
                return None;
            }
            let mut n: c_int = 0;
            let info = xinerama::XineramaQueryScreens(self.dpy, &mut n);
            if info.is_null() {
                return None;
            }
            let mut unique: Vec<(i32, i32, i32, i32)> = Vec::with_capacity(n as usize);
            for i in 0..n as usize {
                let s = &*info.add(i);
                let geom = (
                    s.x_org as i32,
                    s.y_org as i32,
                    s.width as i32,
                    s.height as i32,
                );
                if !unique.contains(&geom) {
                    unique.push(geom);
                }
            }
            xlib::XFree(info as *mut _);
            Some(unique)
        }
    }

    pub fn create_window(
        &self,
        parent: Window,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        border_width: u32,
        depth: i32,
        class: u32,
        visual: *mut xlib::Visual,
        valuemask: u64,
        attributes: &mut xlib::XSetWindowAttributes,
    ) -> Window {
        unsafe {
            Window(xlib::XCreateWindow(
                self.dpy,
                parent.0,
                x,
                y,
                width,
                height,
                border_width,
                depth,
                class,
                visual,
                valuemask,
                attributes,
            ))
        }
    }

    pub fn create_simple_window(&self, parent: Window) -> Window {
        unsafe { Window(xlib::XCreateSimpleWindow(self.dpy, parent.0, 0, 0, 1, 1, 0, 0, 0)) }
    }

    pub fn change_window_attributes(
        &self,
        win: Window,
        value_mask: u64,
        attributes: &mut xlib::XSetWindowAttributes,
    ) {
        unsafe {
            xlib::XChangeWindowAttributes(self.dpy, win.0, value_mask, attributes);
        }
    }

    pub fn create_font_cursor(&self, shape: u32) -> CursorId {
        CursorId(unsafe { xlib::XCreateFontCursor(self.dpy, shape) })
    }

    pub fn free_cursor(&self, cursor: CursorId) {
        unsafe {
            xlib::XFreeCursor(self.dpy, cursor.0);
        }
    }

    pub fn define_cursor(&self, win: Window, cursor: CursorId) {
        unsafe {
            xlib::XDefineCursor(self.dpy, win.0, cursor.0);
        }
    }

    pub fn set_class_hint(&self, win: Window, name: &str) {
        if let Ok(cname) = CString::new(name) {
            let mut ch = xlib::XClassHint {
                res_name: cname.as_ptr() as *mut c_char,
                res_class: cname.as_ptr() as *mut c_char,
            };
            unsafe {
                xlib::XSetClassHint(self.dpy, win.0, &mut ch);
            }
        }
    }

    pub fn map_window(&self, win: Window) {
        unsafe { xlib::XMapWindow(self.dpy, win.0) };
    }

    pub fn map_raised(&self, win: Window) {
        unsafe { xlib::XMapRaised(self.dpy, win.0) };
    }

    pub fn unmap_window(&self, win: Window) {
        unsafe { xlib::XUnmapWindow(self.dpy, win.0) };
    }

    pub fn destroy_window(&self, win: Window) {
        unsafe { xlib::XDestroyWindow(self.dpy, win.0) };
    }

    pub fn raise_window(&self, win: Window) {
        unsafe { xlib::XRaiseWindow(self.dpy, win.0) };
    }

    pub fn move_window(&self, win: Window, x: i32, y: i32) {
        unsafe {
            xlib::XMoveWindow(self.dpy, win.0, x, y);
        }
    }

    pub fn move_resize_window(&self, win: Window, x: i32, y: i32, w: i32, h: i32) {
        unsafe {
            xlib::XMoveResizeWindow(self.dpy, win.0, x, y, w.max(1) as u32, h.max(1) as u32);
        }
    }

    pub fn configure_window(&self, win: Window, x: i32, y: i32, w: i32, h: i32, bw: i32) {
        unsafe {
            let mut wc: xlib::XWindowChanges = std::mem::zeroed();
            wc.x = x;
            wc.y = y;
            wc.width = w;
            wc.height = h;
            wc.border_width = bw;
            let mask = xlib::CWX | xlib::CWY | xlib::CWWidth | xlib::CWHeight | xlib::CWBorderWidth;
            xlib::XConfigureWindow(self.dpy, win.0, mask as u32, &mut wc);
        }
    }

    pub fn configure_border_width(&self, win: Window, bw: i32) {
        unsafe {
            let mut wc: xlib::XWindowChanges = std::mem::zeroed();
            wc.border_width = bw;
            xlib::XConfigureWindow(self.dpy, win.0, xlib::CWBorderWidth as u32, &mut wc);
        }
    }

    /// Pass an unmanaged window's ConfigureRequest through unchanged.
    pub fn configure_passthrough(&self, ev: &xlib::XConfigureRequestEvent) {
        unsafe {
            let mut wc: xlib::XWindowChanges = std::mem::zeroed();
            wc.x = ev.x;
            wc.y = ev.y;
            wc.width = ev.width;
            wc.height = ev.height;
            wc.border_width = ev.border_width;
            wc.sibling = ev.above;
            wc.stack_mode = ev.detail;
            xlib::XConfigureWindow(self.dpy, ev.window, ev.value_mask as u32, &mut wc);
        }
    }

    /// Stack `win` directly below `sibling`.
    pub fn restack_below(&self, win: Window, sibling: Window) {
        unsafe {
            let mut wc: xlib::XWindowChanges = std::mem::zeroed();
            wc.stack_mode = xlib::Below;
            wc.sibling = sibling.0;
            xlib::XConfigureWindow(
                self.dpy,
                win.0,
                (xlib::CWSibling | xlib::CWStackMode) as u32,
                &mut wc,
            );
        }
    }

    /// Synthetic ConfigureNotify telling the client its current geometry.
    pub fn send_configure_notify(&self, win: Window, x: i32, y: i32, w: i32, h: i32, bw: i32) {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            ev.configure.type_ = xlib::ConfigureNotify;
            ev.configure.display = self.dpy;
            ev.configure.event = win.0;
            ev.configure.window = win.0;
            ev.configure.x = x;
            ev.configure.y = y;
            ev.configure.width = w;
            ev.configure.height = h;
            ev.configure.border_width = bw;
            ev.configure.above = 0;
            ev.configure.override_redirect = 0;
            xlib::XSendEvent(self.dpy, win.0, 0, xlib::StructureNotifyMask, &mut ev);
        }
    }

    pub fn change_property(
        &self,
        win: Window,
        property: xlib::Atom,
        type_: xlib::Atom,
        format: i32,
        mode: i32,
        data: *const u8,
        nelements: i32,
    ) {
        unsafe {
            xlib::XChangeProperty(self.dpy, win.0, property, type_, format, mode, data, nelements);
        }
    }

    pub fn append_window_property(&self, win: Window, property: xlib::Atom, value: Window) {
        let val = value.0;
        self.change_property(
            win,
            property,
            xlib::XA_WINDOW,
            32,
            xlib::PropModeAppend,
            &val as *const c_ulong as *const c_uchar,
            1,
        );
    }

    pub fn replace_window_property(&self, win: Window, property: xlib::Atom, value: Window) {
        let val = value.0;
        self.change_property(
            win,
            property,
            xlib::XA_WINDOW,
            32,
            xlib::PropModeReplace,
            &val as *const c_ulong as *const c_uchar,
            1,
        );
    }

    pub fn delete_property(&self, win: Window, property: xlib::Atom) {
        unsafe {
            xlib::XDeleteProperty(self.dpy, win.0, property);
        }
    }

    pub fn select_input(&self, win: Window, mask: i64) {
        unsafe {
            xlib::XSelectInput(self.dpy, win.0, mask);
        }
    }

    pub fn allow_events(&self, mode: i32) {
        unsafe {
            xlib::XAllowEvents(self.dpy, mode, xlib::CurrentTime);
        }
    }

    /// Grab each key combination on `win`, replicated across the lock
    /// modifier states so bindings survive NumLock/CapsLock.
    pub fn grab_keys(&self, win: Window, numlockmask: u32, keys: &[KeySpecification]) {
        unsafe {
            xlib::XUngrabKey(self.dpy, xlib::AnyKey, xlib::AnyModifier, win.0);
            let modifiers = [0, xlib::LockMask, numlockmask, numlockmask | xlib::LockMask];
            for key in keys {
                let code = xlib::XKeysymToKeycode(self.dpy, key.keysym as u64);
                if code == 0 {
                    continue;
                }
                for &m in &modifiers {
                    xlib::XGrabKey(
                        self.dpy,
                        code as c_int,
                        key.mask | m,
                        win.0,
                        1,
                        xlib::GrabModeAsync,
                        xlib::GrabModeAsync,
                    );
                }
            }
        }
    }

    pub fn ungrab_keys(&self, win: Window) {
        unsafe {
            xlib::XUngrabKey(self.dpy, xlib::AnyKey, xlib::AnyModifier, win.0);
        }
    }

    pub fn ungrab_buttons(&self, win: Window) {
        unsafe {
            xlib::XUngrabButton(self.dpy, xlib::AnyButton as u32, xlib::AnyModifier, win.0);
        }
    }

    /// Synchronous any-button grab for unfocused windows: the press is
    /// frozen until we focus and replay it.
    pub fn grab_button_any(&self, win: Window) {
        unsafe {
            xlib::XGrabButton(
                self.dpy,
                xlib::AnyButton as u32,
                xlib::AnyModifier,
                win.0,
                0,
                (xlib::ButtonPressMask | xlib::ButtonReleaseMask) as u32,
                xlib::GrabModeSync,
                xlib::GrabModeSync,
                0,
                0,
            );
        }
    }

    pub fn grab_button(&self, win: Window, button: u32, mask: u32, numlockmask: u32) {
        unsafe {
            let modifiers = [0, xlib::LockMask, numlockmask, numlockmask | xlib::LockMask];
            for &m in &modifiers {
                xlib::XGrabButton(
                    self.dpy,
                    button,
                    mask | m,
                    win.0,
                    0,
                    (xlib::ButtonPressMask | xlib::ButtonReleaseMask) as u32,
                    xlib::GrabModeAsync,
                    xlib::GrabModeSync,
                    0,
                    0,
                );
            }
        }
    }

    pub fn grab_pointer(&self, mask: i64, cursor: CursorId) -> bool {
        unsafe {
            xlib::XGrabPointer(
                self.dpy,
                self.root,
                0,
                mask as u32,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
                0,
                cursor.0,
                xlib::CurrentTime,
            ) == xlib::GrabSuccess
        }
    }

    pub fn ungrab_pointer(&self) {
        unsafe {
            xlib::XUngrabPointer(self.dpy, xlib::CurrentTime);
        }
    }

    pub fn warp_pointer(&self, win: Window, x: i32, y: i32) {
        unsafe {
            xlib::XWarpPointer(self.dpy, 0, win.0, 0, 0, 0, 0, x, y);
        }
    }

    pub fn query_pointer_position(&self) -> Option<(i32, i32)> {
        unsafe {
            let mut root_return = 0;
            let mut child_return = 0;
            let mut root_x = 0;
            let mut root_y = 0;
            let mut win_x = 0;
            let mut win_y = 0;
            let mut mask = 0;
            if xlib::XQueryPointer(
                self.dpy,
                self.root,
                &mut root_return,
                &mut child_return,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            ) != 0
            {
                Some((root_x, root_y))
            } else {
                None
            }
        }
    }

    /// Block for the next event of any kind.
    pub fn next_event(&self) -> xlib::XEvent {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            xlib::XNextEvent(self.dpy, &mut ev);
            ev
        }
    }

    /// Block for the next event matching `mask`.
    pub fn mask_event(&self, mask: i64) -> xlib::XEvent {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            xlib::XMaskEvent(self.dpy, mask, &mut ev);
            ev
        }
    }

    /// Drain one queued event matching `mask`, without blocking.
    pub fn check_mask_event(&self, mask: i64) -> Option<xlib::XEvent> {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            if xlib::XCheckMaskEvent(self.dpy, mask, &mut ev) != 0 {
                Some(ev)
            } else {
                None
            }
        }
    }

    pub fn refresh_keyboard_mapping(&self, ev: &mut xlib::XMappingEvent) {
        unsafe {
            xlib::XRefreshKeyboardMapping(ev);
        }
    }

    /// Group 0, shift level 0: the plain keysym the grab was set up with.
    pub fn keycode_to_keysym(&self, keycode: u32) -> u64 {
        unsafe { xlib::XKeycodeToKeysym(self.dpy, keycode as c_uchar, 0) }
    }

    pub fn get_numlock_mask(&self) -> u32 {
        unsafe {
            let mut numlockmask = 0;
            let modmap = xlib::XGetModifierMapping(self.dpy);
            if modmap.is_null() {
                return 0;
            }
            let max_keypermod = (*modmap).max_keypermod;
            let numlock_code = xlib::XKeysymToKeycode(self.dpy, x11::keysym::XK_Num_Lock.into());
            for i in 0..8 {
                for j in 0..max_keypermod {
                    let code = *(*modmap)
                        .modifiermap
                        .offset((i * max_keypermod + j) as isize);
                    if code != 0 && code == numlock_code {
                        numlockmask = 1 << i;
                    }
                }
            }
            xlib::XFreeModifiermap(modmap);
            numlockmask
        }
    }

    /// Strip lock modifiers and mask down to the seven real ones.
    pub fn clean_mask(&self, mask: u32, numlockmask: u32) -> u32 {
        mask & !(numlockmask | xlib::LockMask)
            & (xlib::ShiftMask
                | xlib::ControlMask
                | xlib::Mod1Mask
                | xlib::Mod2Mask
                | xlib::Mod3Mask
                | xlib::Mod4Mask
                | xlib::Mod5Mask)
    }

    pub fn get_window_attributes(&self, win: Window) -> Option<xlib::XWindowAttributes> {
        unsafe {
            let mut wa: xlib::XWindowAttributes = std::mem::zeroed();
            if xlib::XGetWindowAttributes(self.dpy, win.0, &mut wa) != 0 {
                Some(wa)
            } else {
                None
            }
        }
    }

    pub fn get_transient_for_hint(&self, win: Window) -> Option<Window> {
        unsafe {
            let mut transient_win: xlib::Window = 0;
            if xlib::XGetTransientForHint(self.dpy, win.0, &mut transient_win) != 0
                && transient_win != 0
            {
                Some(Window(transient_win))
            } else {
                None
            }
        }
    }

    /// Read a text property as UTF-8, converting legacy encodings through
    /// the locale text-list path.
    pub fn get_text_prop(&self, win: Window, atom: xlib::Atom) -> Option<String> {
        unsafe {
            let mut text_prop: xlib::XTextProperty = std::mem::zeroed();
            if xlib::XGetTextProperty(self.dpy, win.0, &mut text_prop, atom) == 0
                || text_prop.nitems == 0
                || text_prop.value.is_null()
            {
                return None;
            }
            let result = if text_prop.encoding == xlib::XA_STRING {
                Some(
                    CStr::from_ptr(text_prop.value as *const c_char)
                        .to_string_lossy()
                        .into_owned(),
                )
            } else {
                let mut list: *mut *mut c_char = null_mut();
                let mut count = 0;
                if xlib::Xutf8TextPropertyToTextList(
                    self.dpy,
                    &mut text_prop,
                    &mut list,
                    &mut count,
                ) >= xlib::Success as i32
                    && count > 0
                    && !list.is_null()
                    && !(*list).is_null()
                {
                    let s = CStr::from_ptr(*list).to_string_lossy().into_owned();
                    xlib::XFreeStringList(list);
                    Some(s)
                } else {
                    None
                }
            };
            xlib::XFree(text_prop.value as *mut _);
            result.filter(|s| !s.is_empty())
        }
    }

    /// First atom stored in an XA_ATOM property, e.g. the window type.
    pub fn get_atom_prop(&self, win: Window, prop: xlib::Atom) -> Option<xlib::Atom> {
        unsafe {
            let mut actual_type: xlib::Atom = 0;
            let mut actual_format: c_int = 0;
            let mut nitems: c_ulong = 0;
            let mut bytes_after: c_ulong = 0;
            let mut data: *mut c_uchar = null_mut();
            let status = xlib::XGetWindowProperty(
                self.dpy,
                win.0,
                prop,
                0,
                std::mem::size_of::<xlib::Atom>() as c_long,
                0,
                xlib::XA_ATOM,
                &mut actual_type,
                &mut actual_format,
                &mut nitems,
                &mut bytes_after,
                &mut data,
            );
            if status == xlib::Success as i32 && !data.is_null() {
                let atom = if nitems > 0 {
                    Some(*(data as *const xlib::Atom))
                } else {
                    None
                };
                xlib::XFree(data as *mut _);
                atom
            } else {
                None
            }
        }
    }

    /// The WM_STATE value (Withdrawn/Normal/Iconic) a window carries.
    pub fn get_wm_state(&self, win: Window) -> Option<i64> {
        unsafe {
            let wm_state = self.atoms.get(Atom::Wm(WM::State));
            let mut actual_type: xlib::Atom = 0;
            let mut actual_format: c_int = 0;
            let mut nitems: c_ulong = 0;
            let mut bytes_after: c_ulong = 0;
            let mut data: *mut c_uchar = null_mut();
            let status = xlib::XGetWindowProperty(
                self.dpy,
                win.0,
                wm_state,
                0,
                2,
                0,
                wm_state,
                &mut actual_type,
                &mut actual_format,
                &mut nitems,
                &mut bytes_after,
                &mut data,
            );
            if status != xlib::Success as i32 || data.is_null() {
                return None;
            }
            let result = if nitems > 0 {
                Some(*(data as *const c_long) as i64)
            } else {
                None
            };
            xlib::XFree(data as *mut _);
            result
        }
    }

    pub fn get_wm_normal_hints(&self, win: Window) -> Option<xlib::XSizeHints> {
        unsafe {
            let mut hints: xlib::XSizeHints = std::mem::zeroed();
            let mut supplied: c_long = 0;
            if xlib::XGetWMNormalHints(self.dpy, win.0, &mut hints, &mut supplied) != 0 {
                Some(hints)
            } else {
                None
            }
        }
    }

    pub fn get_wm_hints_info(&self, win: Window) -> Option<WmHintsInfo> {
        unsafe {
            let wmh = xlib::XGetWMHints(self.dpy, win.0);
            if wmh.is_null() {
                return None;
            }
            let info = WmHintsInfo {
                urgent: (*wmh).flags & xlib::XUrgencyHint != 0,
                input: if (*wmh).flags & xlib::InputHint != 0 {
                    Some((*wmh).input != 0)
                } else {
                    None
                },
            };
            xlib::XFree(wmh as *mut _);
            Some(info)
        }
    }

    /// Read-modify-write the urgency bit of a window's WM_HINTS.
    pub fn set_urgency_hint(&self, win: Window, urgent: bool) {
        unsafe {
            let wmh = xlib::XGetWMHints(self.dpy, win.0);
            if wmh.is_null() {
                return;
            }
            (*wmh).flags = if urgent {
                (*wmh).flags | xlib::XUrgencyHint
            } else {
                (*wmh).flags & !xlib::XUrgencyHint
            };
            xlib::XSetWMHints(self.dpy, win.0, wmh);
            xlib::XFree(wmh as *mut _);
        }
    }

    /// WM_CLASS as (instance, class).
    pub fn get_window_class(&self, win: Window) -> (Option<String>, Option<String>) {
        unsafe {
            let mut ch = xlib::XClassHint {
                res_name: null_mut(),
                res_class: null_mut(),
            };
            if xlib::XGetClassHint(self.dpy, win.0, &mut ch) == 0 {
                return (None, None);
            }
            let take = |p: *mut c_char| {
                if p.is_null() {
                    None
                } else {
                    let s = CStr::from_ptr(p).to_string_lossy().into_owned();
                    xlib::XFree(p as *mut _);
                    Some(s)
                }
            };
            (take(ch.res_name), take(ch.res_class))
        }
    }

    pub fn get_wm_protocols(&self, win: Window) -> Vec<xlib::Atom> {
        unsafe {
            let mut protocols_ptr: *mut xlib::Atom = null_mut();
            let mut count = 0;
            let status = xlib::XGetWMProtocols(self.dpy, win.0, &mut protocols_ptr, &mut count);
            if status != 0 && count > 0 && !protocols_ptr.is_null() {
                let protocols =
                    std::slice::from_raw_parts(protocols_ptr, count as usize).to_vec();
                xlib::XFree(protocols_ptr as *mut _);
                protocols
            } else {
                Vec::new()
            }
        }
    }

    pub fn send_client_message(&self, win: Window, message_type: xlib::Atom, data: [i64; 5]) {
        unsafe {
            let mut ev: xlib::XEvent = std::mem::zeroed();
            ev.client_message.type_ = xlib::ClientMessage;
            ev.client_message.window = win.0;
            ev.client_message.message_type = message_type;
            ev.client_message.format = 32;
            for (i, &d) in data.iter().enumerate() {
                ev.client_message.data.set_long(i, d);
            }
            xlib::XSendEvent(self.dpy, win.0, 0, xlib::NoEventMask, &mut ev);
        }
    }

    /// Deliver `proto` through WM_PROTOCOLS if the window advertises it;
    /// returns whether it was sent.
    pub fn send_protocol_event(&self, win: Window, proto: xlib::Atom) -> bool {
        if self.get_wm_protocols(win).contains(&proto) {
            let mut data = [0i64; 5];
            data[0] = proto as i64;
            data[1] = xlib::CurrentTime as i64;
            self.send_client_message(win, self.atoms.get(Atom::Wm(WM::Protocols)), data);
            true
        } else {
            false
        }
    }

    pub fn query_tree(&self, win: Window) -> Vec<Window> {
        unsafe {
            let mut root_return: xlib::Window = 0;
            let mut parent_return: xlib::Window = 0;
            let mut children: *mut xlib::Window = null_mut();
            let mut nchildren: u32 = 0;
            if xlib::XQueryTree(
                self.dpy,
                win.0,
                &mut root_return,
                &mut parent_return,
                &mut children,
                &mut nchildren,
            ) == 0
            {
                return Vec::new();
            }
            let wins = if nchildren > 0 {
                std::slice::from_raw_parts(children, nchildren as usize)
                    .iter()
                    .map(|&w| Window(w))
                    .collect()
            } else {
                Vec::new()
            };
            if !children.is_null() {
                xlib::XFree(children as *mut _);
            }
            wins
        }
    }

    pub fn set_input_focus(&self, win: Window, revert_to: i32) {
        unsafe {
            xlib::XSetInputFocus(self.dpy, win.0, revert_to, xlib::CurrentTime);
        }
    }

    pub fn set_window_border_colour(&self, win: Window, colour: Colour) {
        unsafe {
            xlib::XSetWindowBorder(self.dpy, win.0, self.colors[colour as usize].pixel);
        }
    }

    pub fn grab_server(&self) {
        unsafe { xlib::XGrabServer(self.dpy) };
    }

    pub fn ungrab_server(&self) {
        unsafe { xlib::XUngrabServer(self.dpy) };
    }

    pub fn set_close_down_mode(&self, mode: i32) {
        unsafe { xlib::XSetCloseDownMode(self.dpy, mode) };
    }

    pub fn kill_client(&self, win: Window) {
        unsafe { xlib::XKillClient(self.dpy, win.0) };
    }

    pub fn sync(&self, discard: bool) {
        unsafe { xlib::XSync(self.dpy, discard as c_int) };
    }

    pub fn supports_locale(&self) -> bool {
        unsafe { xlib::XSupportsLocale() != 0 }
    }
}

impl Drop for XWrapper {
    fn drop(&mut self) {
        unsafe {
            self.fonts.clear();
            if !self.xftdraw.is_null() {
                xft::XftDrawDestroy(self.xftdraw);
            }
            xlib::XFreePixmap(self.dpy, self.drawable);
            xlib::XFreeGC(self.dpy, self.gc);
            xlib::XCloseDisplay(self.dpy);
        }
    }
}

pub struct Atoms {
    wmatom: [xlib::Atom; WM::Last as usize],
    netatom: [xlib::Atom; Net::Last as usize],
    pub utf8_string: xlib::Atom,
}

impl Atoms {
    fn new(dpy: *mut xlib::Display) -> Self {
        let intern = |name: &str| -> xlib::Atom {
            let c_str = CString::new(name).unwrap();
            unsafe { xlib::XInternAtom(dpy, c_str.as_ptr(), 0) }
        };

        let mut atoms = Self {
            wmatom: [0; WM::Last as usize],
            netatom: [0; Net::Last as usize],
            utf8_string: intern("UTF8_STRING"),
        };

        atoms.wmatom[WM::Protocols as usize] = intern("WM_PROTOCOLS");
        atoms.wmatom[WM::Delete as usize] = intern("WM_DELETE_WINDOW");
        atoms.wmatom[WM::State as usize] = intern("WM_STATE");
        atoms.wmatom[WM::TakeFocus as usize] = intern("WM_TAKE_FOCUS");
        atoms.netatom[Net::ActiveWindow as usize] = intern("_NET_ACTIVE_WINDOW");
        atoms.netatom[Net::Supported as usize] = intern("_NET_SUPPORTED");
        atoms.netatom[Net::WMName as usize] = intern("_NET_WM_NAME");
        atoms.netatom[Net::WMState as usize] = intern("_NET_WM_STATE");
        atoms.netatom[Net::WMCheck as usize] = intern("_NET_SUPPORTING_WM_CHECK");
        atoms.netatom[Net::WMFullscreen as usize] = intern("_NET_WM_STATE_FULLSCREEN");
        atoms.netatom[Net::WMWindowType as usize] = intern("_NET_WM_WINDOW_TYPE");
        atoms.netatom[Net::WMWindowTypeDialog as usize] = intern("_NET_WM_WINDOW_TYPE_DIALOG");
        atoms.netatom[Net::ClientList as usize] = intern("_NET_CLIENT_LIST");

        atoms
    }

    pub fn get(&self, atom: Atom) -> xlib::Atom {
        match atom {
            Atom::Net(net_atom) => self.netatom[net_atom as usize],
            Atom::Wm(wm_atom) => self.wmatom[wm_atom as usize],
        }
    }

    pub fn net_atom_ptr(&self) -> *const xlib::Atom {
        self.netatom.as_ptr()
    }
}
