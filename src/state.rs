use std::collections::HashMap;
use std::os::raw::{c_int, c_long, c_uchar, c_ulong};

use x11::xlib;

use crate::client::{Client, ClientHandle};
use crate::config::{self, TAG_MASK};
use crate::error::TilemuxError;
use crate::events;
use crate::monitor::Monitor;
use crate::xwrapper::{Atom, CursorId, KeySpecification, Net, Window, XWrapper, WM};

#[derive(PartialEq, Copy, Clone)]
pub enum CursorType {
    Normal,
    Resize,
    Move,
    Last,
}

/// ICCCM WM_STATE values.
#[derive(PartialEq, Copy, Clone)]
pub enum WmState {
    Withdrawn = 0,
    Normal = 1,
    Iconic = 3,
}

const STATUS_MAX: usize = 255;

fn truncated(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
    s
}

// Global state
pub struct Tilemux {
    pub status_text: String,
    pub screen: c_int,
    pub screen_width: i32,
    pub screen_height: i32,
    pub bar_height: i32,
    pub lr_padding: i32,
    pub numlock_mask: u32,
    pub running: bool,
    pub cursor: [CursorId; CursorType::Last as usize],
    pub xwrapper: XWrapper,
    pub mons: Vec<Monitor>,
    pub selected_monitor: usize,
    pub root: Window,
    pub wm_check_window: Window,
    pub clients: HashMap<ClientHandle, Client>,
    /// Last monitor the pointer was seen on, for boundary crossings.
    pub motion_mon: Option<usize>,
}

impl Tilemux {
    pub fn new() -> Result<Tilemux, TilemuxError> {
        let mut xwrapper = XWrapper::connect()?;
        xwrapper.check_for_other_wm()?;

        let mut state = Tilemux {
            status_text: String::new(),
            screen: 0,
            screen_width: 0,
            screen_height: 0,
            bar_height: 0,
            lr_padding: 0,
            numlock_mask: 0,
            running: true,
            cursor: [CursorId(0); CursorType::Last as usize],
            xwrapper,
            mons: Vec::new(),
            selected_monitor: 0,
            root: Window(0),
            wm_check_window: Window(0),
            clients: HashMap::new(),
            motion_mon: None,
        };
        state.setup()?;
        Ok(state)
    }

    fn setup(&mut self) -> Result<(), TilemuxError> {
        self.screen = self.xwrapper.default_screen();
        self.screen_width = self.xwrapper.display_width(self.screen);
        self.screen_height = self.xwrapper.display_height(self.screen);
        self.root = self.xwrapper.root_window(self.screen);

        if !self.xwrapper.fontset_create(&config::FONTS) {
            return Err(TilemuxError::NoFonts);
        }
        let fh = self.xwrapper.get_font_height() as i32;
        self.lr_padding = fh;
        self.bar_height = fh + 2;

        self.update_geometry();

        self.cursor[CursorType::Normal as usize] =
            self.xwrapper.create_font_cursor(68 /* XC_left_ptr */);
        self.cursor[CursorType::Resize as usize] =
            self.xwrapper.create_font_cursor(120 /* XC_sizing */);
        self.cursor[CursorType::Move as usize] =
            self.xwrapper.create_font_cursor(52 /* XC_fleur */);

        self.update_bars();
        self.update_status();

        // dummy window advertising a compliant WM is running
        self.wm_check_window = self.xwrapper.create_simple_window(self.root);
        let check_atom = self.xwrapper.atoms.get(Atom::Net(Net::WMCheck));
        self.xwrapper
            .replace_window_property(self.wm_check_window, check_atom, self.wm_check_window);
        let name = env!("CARGO_PKG_NAME");
        self.xwrapper.change_property(
            self.wm_check_window,
            self.xwrapper.atoms.get(Atom::Net(Net::WMName)),
            self.xwrapper.atoms.utf8_string,
            8,
            xlib::PropModeReplace,
            name.as_ptr(),
            name.len() as i32,
        );
        self.xwrapper
            .replace_window_property(self.root, check_atom, self.wm_check_window);

        self.xwrapper.change_property(
            self.root,
            self.xwrapper.atoms.get(Atom::Net(Net::Supported)),
            xlib::XA_ATOM,
            32,
            xlib::PropModeReplace,
            self.xwrapper.atoms.net_atom_ptr() as *const c_uchar,
            Net::Last as i32,
        );
        self.xwrapper
            .delete_property(self.root, self.xwrapper.atoms.get(Atom::Net(Net::ClientList)));

        unsafe {
            let mut wa: xlib::XSetWindowAttributes = std::mem::zeroed();
            wa.cursor = self.cursor[CursorType::Normal as usize].0;
            wa.event_mask = xlib::SubstructureRedirectMask
                | xlib::SubstructureNotifyMask
                | xlib::ButtonPressMask
                | xlib::PointerMotionMask
                | xlib::EnterWindowMask
                | xlib::LeaveWindowMask
                | xlib::StructureNotifyMask
                | xlib::PropertyChangeMask;
            self.xwrapper.change_window_attributes(
                self.root,
                xlib::CWEventMask | xlib::CWCursor,
                &mut wa,
            );
            self.xwrapper.select_input(self.root, wa.event_mask);
        }

        self.grab_keys();
        self.focus(None);
        Ok(())
    }

    /// Adopt windows that already exist: visible or iconic ones first,
    /// transients afterwards so their owners are managed before them.
    pub fn scan(&mut self) {
        let wins = self.xwrapper.query_tree(self.root);
        for &win in &wins {
            let wa = match self.xwrapper.get_window_attributes(win) {
                Some(wa) => wa,
                None => continue,
            };
            if wa.override_redirect != 0 || self.xwrapper.get_transient_for_hint(win).is_some() {
                continue;
            }
            if wa.map_state == xlib::IsViewable
                || self.xwrapper.get_wm_state(win) == Some(WmState::Iconic as i64)
            {
                self.manage(win.0, &wa);
            }
        }
        for &win in &wins {
            let wa = match self.xwrapper.get_window_attributes(win) {
                Some(wa) => wa,
                None => continue,
            };
            if wa.override_redirect != 0 || self.xwrapper.get_transient_for_hint(win).is_none() {
                continue;
            }
            if (wa.map_state == xlib::IsViewable
                || self.xwrapper.get_wm_state(win) == Some(WmState::Iconic as i64))
                && self.window_to_client_handle(win.0).is_none()
            {
                self.manage(win.0, &wa);
            }
        }
    }

    /// Main event loop: block on the next X event and dispatch it.
    pub fn run(&mut self) {
        self.xwrapper.sync(false);
        while self.running {
            let mut ev = self.xwrapper.next_event();
            events::handle(self, &mut ev);
        }
    }

    pub fn window_to_client_handle(&self, w: xlib::Window) -> Option<ClientHandle> {
        let handle = ClientHandle(w);
        self.clients.contains_key(&handle).then_some(handle)
    }

    /// Whether the client is visible on its own monitor.
    pub fn client_visible(&self, h: ClientHandle) -> bool {
        self.clients
            .get(&h)
            .map_or(false, |c| c.is_visible_on(&self.mons[c.monitor_idx]))
    }

    pub fn window_to_monitor(&self, w: xlib::Window) -> usize {
        if w == self.root.0 {
            if let Some((x, y)) = self.xwrapper.query_pointer_position() {
                return self.rect_to_monitor(x, y, 1, 1);
            }
        }
        for (i, m) in self.mons.iter().enumerate() {
            if m.bar_window.0 == w {
                return i;
            }
        }
        if let Some(c) = self.window_to_client_handle(w).and_then(|h| self.clients.get(&h)) {
            return c.monitor_idx;
        }
        self.selected_monitor
    }

    /// The monitor overlapping the rectangle the most; ties go to list
    /// order and no overlap falls back to the selected monitor.
    pub fn rect_to_monitor(&self, x: i32, y: i32, w: i32, h: i32) -> usize {
        let mut r = self.selected_monitor;
        let mut area = 0;
        for (i, m) in self.mons.iter().enumerate() {
            let a = m.intersect_area(x, y, w, h);
            if a > area {
                area = a;
                r = i;
            }
        }
        r
    }

    /// Next (positive) or previous monitor, wrapping around.
    pub fn dir_to_monitor(&self, dir: i32) -> usize {
        if dir > 0 {
            (self.selected_monitor + 1) % self.mons.len()
        } else {
            (self.selected_monitor + self.mons.len() - 1) % self.mons.len()
        }
    }

    pub fn grab_keys(&mut self) {
        self.numlock_mask = self.xwrapper.get_numlock_mask();
        let specs: Vec<KeySpecification> = config::keys()
            .iter()
            .map(|k| KeySpecification {
                mask: k.mask,
                keysym: k.keysym,
            })
            .collect();
        self.xwrapper.grab_keys(self.root, self.numlock_mask, &specs);
    }

    /// For a focused window only the configured combinations are grabbed;
    /// for unfocused ones every button is grabbed synchronously so the
    /// click can be replayed after focusing.
    pub fn grab_buttons(&mut self, h: ClientHandle, focused: bool) {
        let win = match self.clients.get(&h) {
            Some(c) => c.win,
            None => return,
        };
        self.numlock_mask = self.xwrapper.get_numlock_mask();
        self.xwrapper.ungrab_buttons(win);
        if !focused {
            self.xwrapper.grab_button_any(win);
        }
        for b in config::buttons() {
            if b.click == crate::actions::ClickKind::ClientWin {
                self.xwrapper.grab_button(win, b.button, b.mask, self.numlock_mask);
            }
        }
    }

    /// Bring a window under management: assign monitor and tags, clamp its
    /// geometry onto the monitor, attach it to both lists and map it.
    pub fn manage(&mut self, w: xlib::Window, wa: &xlib::XWindowAttributes) {
        let win = Window(w);
        let handle = ClientHandle::from(win);
        let mut c = Client::new(win, wa.x, wa.y, wa.width, wa.height, wa.border_width, self.selected_monitor);
        c.name = self.fetch_title(win);

        let trans = self.xwrapper.get_transient_for_hint(win);
        let trans_client = trans.and_then(|t| self.window_to_client_handle(t.0));
        if let Some(t) = trans_client.and_then(|th| self.clients.get(&th)) {
            c.monitor_idx = t.monitor_idx;
            c.tags = t.tags;
        } else {
            self.apply_rules(&mut c);
        }

        {
            let m = &self.mons[c.monitor_idx];
            if c.x + c.width() > m.mx + m.mw {
                c.x = m.mx + m.mw - c.width();
            }
            if c.y + c.height() > m.my + m.mh {
                c.y = m.my + m.mh - c.height();
            }
            c.x = c.x.max(m.mx);
            // only fix the y-offset when the window's centre could cover a
            // top bar
            let over_bar = m.by == m.my && c.x + c.w / 2 >= m.wx && c.x + c.w / 2 < m.wx + m.ww;
            c.y = c.y.max(if over_bar { self.bar_height } else { m.my });
        }
        c.bw = config::BORDER_PX;
        let mon_idx = c.monitor_idx;

        self.xwrapper.configure_border_width(win, c.bw);
        self.xwrapper
            .set_window_border_colour(win, crate::colour::Colour::NormBorder);
        // propagate the border width even when the size does not change
        self.xwrapper
            .send_configure_notify(win, c.x, c.y, c.w, c.h, c.bw);

        self.clients.insert(handle, c);
        self.update_window_type(handle);
        self.update_size_hints(handle);
        self.update_wm_hints(handle);
        self.xwrapper.select_input(
            win,
            xlib::EnterWindowMask
                | xlib::FocusChangeMask
                | xlib::PropertyChangeMask
                | xlib::StructureNotifyMask,
        );
        self.grab_buttons(handle, false);

        let floating = {
            let c = self.clients.get_mut(&handle).unwrap();
            if !c.is_floating {
                c.is_floating = trans.is_some() || c.is_fixed;
                c.old_state = c.is_floating;
            }
            c.is_floating
        };
        if floating {
            self.xwrapper.raise_window(win);
        }

        self.mons[mon_idx].attach(handle);
        self.mons[mon_idx].attach_stack(handle);
        self.xwrapper.append_window_property(
            self.root,
            self.xwrapper.atoms.get(Atom::Net(Net::ClientList)),
            win,
        );
        // some clients need to see themselves moved before the final
        // arrange; park the window offscreen until then
        {
            let c = &self.clients[&handle];
            self.xwrapper
                .move_resize_window(win, c.x + 2 * self.screen_width, c.y, c.w, c.h);
        }
        self.set_client_state(win, WmState::Normal);
        if mon_idx == self.selected_monitor {
            if let Some(prev) = self.mons[mon_idx].sel {
                self.unfocus(prev, false);
            }
        }
        self.mons[mon_idx].sel = Some(handle);
        self.arrange(Some(mon_idx));
        self.xwrapper.map_window(win);
        self.focus(None);
        log::info!(
            "managed window {:#x} on monitor {} tags {:b}",
            w,
            mon_idx,
            self.clients[&handle].tags
        );
    }

    /// Forget a client. Unless its window is already gone, the original
    /// border is restored and the window is put into the Withdrawn state
    /// under a server grab.
    pub fn unmanage(&mut self, h: ClientHandle, destroyed: bool) {
        let (mon_idx, win, old_bw) = match self.clients.get(&h) {
            Some(c) => (c.monitor_idx, c.win, c.old_bw),
            None => return,
        };
        self.mons[mon_idx].detach(h);
        self.detach_stack(h, mon_idx);
        if !destroyed {
            self.xwrapper.grab_server();
            self.xwrapper.set_ignore_error_handler();
            self.xwrapper.configure_border_width(win, old_bw);
            self.xwrapper.ungrab_buttons(win);
            self.set_client_state(win, WmState::Withdrawn);
            self.xwrapper.sync(false);
            self.xwrapper.set_default_error_handler();
            self.xwrapper.ungrab_server();
        }
        self.clients.remove(&h);
        self.focus(None);
        self.update_client_list();
        self.arrange(Some(mon_idx));
    }

    /// Remove from the focus stack; a removed selection passes to the
    /// first visible client remaining in stack order.
    pub fn detach_stack(&mut self, h: ClientHandle, mon_idx: usize) {
        self.mons[mon_idx].detach_stack(h);
        if self.mons[mon_idx].sel == Some(h) {
            let next = self.mons[mon_idx]
                .stack
                .iter()
                .copied()
                .find(|&s| self.client_visible(s));
            self.mons[mon_idx].sel = next;
        }
    }

    /// Focus a client, or the first visible one on the selected monitor.
    /// Moves it to the head of the focus stack, transfers X input focus
    /// and repaints borders and bars.
    pub fn focus(&mut self, c: Option<ClientHandle>) {
        let mut target = c.filter(|&h| self.client_visible(h));
        if target.is_none() {
            target = self.mons[self.selected_monitor]
                .stack
                .iter()
                .copied()
                .find(|&h| self.client_visible(h));
        }
        let prev = self.mons[self.selected_monitor].sel;
        if let Some(p) = prev {
            if target != Some(p) {
                self.unfocus(p, false);
            }
        }
        if let Some(h) = target {
            let mon_idx = self.clients[&h].monitor_idx;
            if mon_idx != self.selected_monitor {
                self.selected_monitor = mon_idx;
            }
            if self.clients[&h].is_urgent {
                self.set_urgent(h, false);
            }
            let m = &mut self.mons[mon_idx];
            m.detach_stack(h);
            m.attach_stack(h);
            self.grab_buttons(h, true);
            let win = self.clients[&h].win;
            self.xwrapper
                .set_window_border_colour(win, crate::colour::Colour::SelBorder);
            self.set_focus(h);
        } else {
            self.xwrapper
                .set_input_focus(self.root, xlib::RevertToPointerRoot);
            self.xwrapper.delete_property(
                self.root,
                self.xwrapper.atoms.get(Atom::Net(Net::ActiveWindow)),
            );
        }
        self.mons[self.selected_monitor].sel = target;
        self.draw_bars();
    }

    /// Give a client the X input focus, unless it opted out via WM_HINTS;
    /// WM_TAKE_FOCUS is offered either way.
    pub fn set_focus(&mut self, h: ClientHandle) {
        let (win, never_focus) = match self.clients.get(&h) {
            Some(c) => (c.win, c.never_focus),
            None => return,
        };
        if !never_focus {
            self.xwrapper.set_input_focus(win, xlib::RevertToPointerRoot);
            self.xwrapper.replace_window_property(
                self.root,
                self.xwrapper.atoms.get(Atom::Net(Net::ActiveWindow)),
                win,
            );
        }
        let take_focus = self.xwrapper.atoms.get(Atom::Wm(WM::TakeFocus));
        self.xwrapper.send_protocol_event(win, take_focus);
    }

    pub fn unfocus(&mut self, h: ClientHandle, setfocus: bool) {
        let win = match self.clients.get(&h) {
            Some(c) => c.win,
            None => return,
        };
        self.grab_buttons(h, false);
        self.xwrapper
            .set_window_border_colour(win, crate::colour::Colour::NormBorder);
        if setfocus {
            self.xwrapper
                .set_input_focus(self.root, xlib::RevertToPointerRoot);
            self.xwrapper.delete_property(
                self.root,
                self.xwrapper.atoms.get(Atom::Net(Net::ActiveWindow)),
            );
        }
    }

    /// Move a client to another monitor, giving it that monitor's active
    /// tags.
    pub fn send_mon(&mut self, h: ClientHandle, target: usize) {
        let mon_idx = match self.clients.get(&h) {
            Some(c) => c.monitor_idx,
            None => return,
        };
        if mon_idx == target {
            return;
        }
        self.unfocus(h, true);
        self.mons[mon_idx].detach(h);
        self.detach_stack(h, mon_idx);
        let tags = self.mons[target].active_tagset();
        {
            let c = self.clients.get_mut(&h).unwrap();
            c.monitor_idx = target;
            c.tags = tags;
        }
        self.mons[target].attach(h);
        self.mons[target].attach_stack(h);
        self.focus(None);
        self.arrange(None);
    }

    /// Apply visibility: visible clients move to their position top-down,
    /// hidden ones are parked offscreen bottom-up.
    pub fn show_hide(&mut self, mon_idx: usize) {
        let stack = self.mons[mon_idx].stack.clone();
        for &h in &stack {
            if !self.client_visible(h) {
                continue;
            }
            let (win, x, y, w, hgt, floating, fullscreen) = {
                let c = &self.clients[&h];
                (c.win, c.x, c.y, c.w, c.h, c.is_floating, c.is_fullscreen)
            };
            self.xwrapper.move_window(win, x, y);
            let layout_floating = {
                let m = &self.mons[self.clients[&h].monitor_idx];
                m.layout().arrange.is_none()
            };
            if (layout_floating || floating) && !fullscreen {
                self.resize(h, x, y, w, hgt, false);
            }
        }
        for &h in stack.iter().rev() {
            if self.client_visible(h) {
                continue;
            }
            if let Some(c) = self.clients.get(&h) {
                self.xwrapper.move_window(c.win, -2 * c.width(), c.y);
            }
        }
    }

    /// Rearrange one monitor (visibility, layout, X stacking order), or
    /// every monitor without touching the stacking order.
    pub fn arrange(&mut self, mon_idx: Option<usize>) {
        match mon_idx {
            Some(i) => {
                self.show_hide(i);
                self.arrange_monitor(i);
                self.restack(i);
            }
            None => {
                for i in 0..self.mons.len() {
                    self.show_hide(i);
                }
                for i in 0..self.mons.len() {
                    self.arrange_monitor(i);
                }
            }
        }
    }

    pub fn arrange_monitor(&mut self, mon_idx: usize) {
        let layout = self.mons[mon_idx].layout();
        self.mons[mon_idx].lt_symbol = layout.symbol.to_string();
        if let Some(arrange_fn) = layout.arrange {
            arrange_fn(self, mon_idx);
        }
    }

    /// Make the server's stacking order match ours: the selected floating
    /// window on top, then the bar, then the tiled windows in focus-stack
    /// order. Queued EnterNotify events from the restack are discarded.
    pub fn restack(&mut self, mon_idx: usize) {
        self.draw_bar(mon_idx);
        let (sel, barwin, has_arrange) = {
            let m = &self.mons[mon_idx];
            (m.sel, m.bar_window, m.layout().arrange.is_some())
        };
        let sel = match sel {
            Some(s) => s,
            None => return,
        };
        if let Some(c) = self.clients.get(&sel) {
            if c.is_floating || !has_arrange {
                self.xwrapper.raise_window(c.win);
            }
        }
        if has_arrange {
            let mut sibling = barwin;
            let stack = self.mons[mon_idx].stack.clone();
            for h in stack {
                if let Some(c) = self.clients.get(&h) {
                    if !c.is_floating && self.client_visible(h) {
                        self.xwrapper.restack_below(c.win, sibling);
                        sibling = c.win;
                    }
                }
            }
        }
        self.xwrapper.sync(false);
        while self
            .xwrapper
            .check_mask_event(xlib::EnterWindowMask)
            .is_some()
        {}
    }

    /// Resize through the size-hint path; the X request is only issued
    /// when the constrained geometry differs from the current one.
    pub fn resize(&mut self, h: ClientHandle, x: i32, y: i32, w: i32, hgt: i32, interact: bool) {
        let (nx, ny, nw, nh, changed) = {
            let c = match self.clients.get(&h) {
                Some(c) => c,
                None => return,
            };
            let m = &self.mons[c.monitor_idx];
            let respect_hints =
                config::RESIZE_HINTS || c.is_floating || m.layout().arrange.is_none();
            c.apply_size_hints(
                x,
                y,
                w,
                hgt,
                interact,
                (self.screen_width, self.screen_height),
                (m.wx, m.wy, m.ww, m.wh),
                self.bar_height,
                respect_hints,
            )
        };
        if changed {
            self.resize_client(h, nx, ny, nw, nh);
        }
    }

    /// Apply a geometry unconditionally, shadowing the previous one in the
    /// `old*` fields and notifying the client.
    pub fn resize_client(&mut self, h: ClientHandle, x: i32, y: i32, w: i32, hgt: i32) {
        let (win, bw) = {
            let c = match self.clients.get_mut(&h) {
                Some(c) => c,
                None => return,
            };
            c.oldx = c.x;
            c.x = x;
            c.oldy = c.y;
            c.y = y;
            c.oldw = c.w;
            c.w = w;
            c.oldh = c.h;
            c.h = hgt;
            (c.win, c.bw)
        };
        self.xwrapper.configure_window(win, x, y, w, hgt, bw);
        self.xwrapper.send_configure_notify(win, x, y, w, hgt, bw);
        self.xwrapper.sync(false);
    }

    /// Enter or leave fullscreen. Going in saves the floating state,
    /// border and geometry; coming out restores them exactly.
    pub fn set_fullscreen(&mut self, h: ClientHandle, fullscreen: bool) {
        let (win, is_fullscreen, mon_idx) = match self.clients.get(&h) {
            Some(c) => (c.win, c.is_fullscreen, c.monitor_idx),
            None => return,
        };
        let net_wm_state = self.xwrapper.atoms.get(Atom::Net(Net::WMState));
        let net_fullscreen = self.xwrapper.atoms.get(Atom::Net(Net::WMFullscreen));
        if fullscreen && !is_fullscreen {
            self.xwrapper.change_property(
                win,
                net_wm_state,
                xlib::XA_ATOM,
                32,
                xlib::PropModeReplace,
                &net_fullscreen as *const c_ulong as *const c_uchar,
                1,
            );
            let (mx, my, mw, mh) = {
                let m = &self.mons[mon_idx];
                (m.mx, m.my, m.mw, m.mh)
            };
            {
                let c = self.clients.get_mut(&h).unwrap();
                c.is_fullscreen = true;
                c.old_state = c.is_floating;
                c.old_bw = c.bw;
                c.bw = 0;
                c.is_floating = true;
            }
            self.resize_client(h, mx, my, mw, mh);
            self.xwrapper.raise_window(win);
        } else if !fullscreen && is_fullscreen {
            self.xwrapper.change_property(
                win,
                net_wm_state,
                xlib::XA_ATOM,
                32,
                xlib::PropModeReplace,
                std::ptr::null(),
                0,
            );
            let (x, y, w, hgt) = {
                let c = self.clients.get_mut(&h).unwrap();
                c.is_fullscreen = false;
                c.is_floating = c.old_state;
                c.bw = c.old_bw;
                c.x = c.oldx;
                c.y = c.oldy;
                c.w = c.oldw;
                c.h = c.oldh;
                (c.x, c.y, c.w, c.h)
            };
            self.resize_client(h, x, y, w, hgt);
            self.arrange(Some(mon_idx));
        }
    }

    /// Re-fit a fullscreen client after its monitor changed size. The
    /// geometry shadow is left untouched so leaving fullscreen still
    /// restores the pre-fullscreen frame.
    pub fn refit_fullscreen_client(&mut self, h: ClientHandle) {
        let mon_idx = match self.clients.get(&h) {
            Some(c) => c.monitor_idx,
            None => return,
        };
        let (mx, my, mw, mh) = {
            let m = &self.mons[mon_idx];
            (m.mx, m.my, m.mw, m.mh)
        };
        let (win, bw) = {
            let c = self.clients.get_mut(&h).unwrap();
            c.x = mx;
            c.y = my;
            c.w = mw;
            c.h = mh;
            (c.win, c.bw)
        };
        self.xwrapper.configure_window(win, mx, my, mw, mh, bw);
        self.xwrapper.send_configure_notify(win, mx, my, mw, mh, bw);
        self.xwrapper.sync(false);
    }

    pub fn set_urgent(&mut self, h: ClientHandle, urgent: bool) {
        if let Some(c) = self.clients.get_mut(&h) {
            c.is_urgent = urgent;
            let win = c.win;
            self.xwrapper.set_urgency_hint(win, urgent);
        }
    }

    pub fn set_client_state(&mut self, win: Window, state: WmState) {
        let data: [c_long; 2] = [state as c_long, 0];
        self.xwrapper.change_property(
            win,
            self.xwrapper.atoms.get(Atom::Wm(WM::State)),
            self.xwrapper.atoms.get(Atom::Wm(WM::State)),
            32,
            xlib::PropModeReplace,
            data.as_ptr() as *const c_uchar,
            2,
        );
    }

    /// Match the rule table on class, instance and title substrings; every
    /// matching rule contributes. Tags fall back to the monitor's active
    /// tagset when no rule set any.
    pub fn apply_rules(&mut self, c: &mut Client) {
        c.is_floating = false;
        c.tags = 0;
        let (instance, class) = self.xwrapper.get_window_class(c.win);
        let class = class.unwrap_or_else(|| "broken".to_string());
        let instance = instance.unwrap_or_else(|| "broken".to_string());

        for r in config::RULES {
            if r.matches(&class, &instance, &c.name) {
                c.is_floating = r.is_floating;
                c.tags |= r.tags;
                if r.monitor >= 0 && (r.monitor as usize) < self.mons.len() {
                    c.monitor_idx = r.monitor as usize;
                }
            }
        }
        c.tags = if c.tags & TAG_MASK != 0 {
            c.tags & TAG_MASK
        } else {
            self.mons[c.monitor_idx].active_tagset()
        };
    }

    fn fetch_title(&self, win: Window) -> String {
        let name = self
            .xwrapper
            .get_text_prop(win, self.xwrapper.atoms.get(Atom::Net(Net::WMName)))
            .or_else(|| self.xwrapper.get_text_prop(win, xlib::XA_WM_NAME))
            .unwrap_or_else(|| "broken".to_string());
        truncated(name, STATUS_MAX)
    }

    pub fn update_title(&mut self, h: ClientHandle) {
        let win = match self.clients.get(&h) {
            Some(c) => c.win,
            None => return,
        };
        let name = self.fetch_title(win);
        if let Some(c) = self.clients.get_mut(&h) {
            c.name = name;
        }
    }

    /// The status text mirrors the root window's WM_NAME; external status
    /// programs write it there.
    pub fn update_status(&mut self) {
        let text = self
            .xwrapper
            .get_text_prop(self.root, xlib::XA_WM_NAME)
            .unwrap_or_else(|| {
                concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION")).to_string()
            });
        self.status_text = truncated(text, STATUS_MAX);
        self.draw_bar(self.selected_monitor);
    }

    /// Pre-set fullscreen state and dialog window types force the
    /// corresponding client state.
    pub fn update_window_type(&mut self, h: ClientHandle) {
        let win = match self.clients.get(&h) {
            Some(c) => c.win,
            None => return,
        };
        let state = self
            .xwrapper
            .get_atom_prop(win, self.xwrapper.atoms.get(Atom::Net(Net::WMState)));
        let wtype = self
            .xwrapper
            .get_atom_prop(win, self.xwrapper.atoms.get(Atom::Net(Net::WMWindowType)));
        if state == Some(self.xwrapper.atoms.get(Atom::Net(Net::WMFullscreen))) {
            self.set_fullscreen(h, true);
        }
        if wtype == Some(self.xwrapper.atoms.get(Atom::Net(Net::WMWindowTypeDialog))) {
            if let Some(c) = self.clients.get_mut(&h) {
                c.is_floating = true;
            }
        }
    }

    /// Refresh the cached size hints from WM_NORMAL_HINTS. A failed read
    /// behaves as if only PSize were set, zeroing every hint.
    pub fn update_size_hints(&mut self, h: ClientHandle) {
        let win = match self.clients.get(&h) {
            Some(c) => c.win,
            None => return,
        };
        let size = self.xwrapper.get_wm_normal_hints(win).unwrap_or_else(|| {
            let mut s: xlib::XSizeHints = unsafe { std::mem::zeroed() };
            s.flags = xlib::PSize;
            s
        });
        let c = match self.clients.get_mut(&h) {
            Some(c) => c,
            None => return,
        };
        if size.flags & xlib::PBaseSize != 0 {
            c.base_w = size.base_width;
            c.base_h = size.base_height;
        } else if size.flags & xlib::PMinSize != 0 {
            c.base_w = size.min_width;
            c.base_h = size.min_height;
        } else {
            c.base_w = 0;
            c.base_h = 0;
        }
        if size.flags & xlib::PResizeInc != 0 {
            c.inc_w = size.width_inc;
            c.inc_h = size.height_inc;
        } else {
            c.inc_w = 0;
            c.inc_h = 0;
        }
        if size.flags & xlib::PMaxSize != 0 {
            c.max_w = size.max_width;
            c.max_h = size.max_height;
        } else {
            c.max_w = 0;
            c.max_h = 0;
        }
        if size.flags & xlib::PMinSize != 0 {
            c.min_w = size.min_width;
            c.min_h = size.min_height;
        } else if size.flags & xlib::PBaseSize != 0 {
            c.min_w = size.base_width;
            c.min_h = size.base_height;
        } else {
            c.min_w = 0;
            c.min_h = 0;
        }
        if size.flags & xlib::PAspect != 0 {
            c.min_aspect = size.min_aspect.y as f32 / size.min_aspect.x as f32;
            c.max_aspect = size.max_aspect.x as f32 / size.max_aspect.y as f32;
        } else {
            c.min_aspect = 0.0;
            c.max_aspect = 0.0;
        }
        c.is_fixed =
            c.max_w > 0 && c.max_h > 0 && c.max_w == c.min_w && c.max_h == c.min_h;
    }

    /// Refresh urgency and focus policy from WM_HINTS. An urgency hint on
    /// the already selected client is cleared instead of recorded.
    pub fn update_wm_hints(&mut self, h: ClientHandle) {
        let win = match self.clients.get(&h) {
            Some(c) => c.win,
            None => return,
        };
        let info = match self.xwrapper.get_wm_hints_info(win) {
            Some(i) => i,
            None => return,
        };
        let is_selected = self.mons[self.selected_monitor].sel == Some(h);
        if is_selected && info.urgent {
            self.xwrapper.set_urgency_hint(win, false);
        } else if let Some(c) = self.clients.get_mut(&h) {
            c.is_urgent = info.urgent;
        }
        if let Some(c) = self.clients.get_mut(&h) {
            c.never_focus = info.input.map_or(false, |input| !input);
        }
    }

    /// Rewrite _NET_CLIENT_LIST as the concatenation of the per-monitor
    /// client lists in monitor order.
    pub fn update_client_list(&mut self) {
        let client_list = self.xwrapper.atoms.get(Atom::Net(Net::ClientList));
        self.xwrapper.delete_property(self.root, client_list);
        for m in &self.mons {
            for h in &m.clients {
                if let Some(c) = self.clients.get(h) {
                    self.xwrapper
                        .append_window_property(self.root, client_list, c.win);
                }
            }
        }
    }

    /// Reconcile the monitor list with the Xinerama screen set (or the
    /// whole display without Xinerama). Returns whether anything moved.
    pub fn update_geometry(&mut self) -> bool {
        let mut dirty = false;
        match self.xwrapper.xinerama_screens() {
            Some(unique) => {
                let n = self.mons.len();
                let nn = unique.len();
                if n <= nn {
                    for _ in n..nn {
                        self.mons.push(Monitor::new());
                    }
                    for (i, &(x, y, w, h)) in unique.iter().enumerate() {
                        let m = &mut self.mons[i];
                        if i >= n || x != m.mx || y != m.my || w != m.mw || h != m.mh {
                            dirty = true;
                            m.num = i as i32;
                            m.mx = x;
                            m.wx = x;
                            m.my = y;
                            m.wy = y;
                            m.mw = w;
                            m.ww = w;
                            m.mh = h;
                            m.wh = h;
                            m.update_bar_pos(self.bar_height);
                        }
                    }
                } else {
                    // fewer screens: retire monitors from the tail and
                    // migrate their clients to the first one
                    for _ in nn..n {
                        dirty = true;
                        let retired = self.mons.pop().unwrap();
                        for &h in retired.clients.iter() {
                            if let Some(c) = self.clients.get_mut(&h) {
                                c.monitor_idx = 0;
                            }
                            self.mons[0].attach(h);
                            self.mons[0].attach_stack(h);
                        }
                        if retired.bar_window.0 != 0 {
                            self.xwrapper.unmap_window(retired.bar_window);
                            self.xwrapper.destroy_window(retired.bar_window);
                        }
                    }
                    if self.selected_monitor >= self.mons.len() {
                        self.selected_monitor = 0;
                    }
                    // geometry of the survivors may have changed as well
                    for (i, &(x, y, w, h)) in unique.iter().enumerate() {
                        let m = &mut self.mons[i];
                        if x != m.mx || y != m.my || w != m.mw || h != m.mh {
                            m.num = i as i32;
                            m.mx = x;
                            m.wx = x;
                            m.my = y;
                            m.wy = y;
                            m.mw = w;
                            m.ww = w;
                            m.mh = h;
                            m.wh = h;
                            m.update_bar_pos(self.bar_height);
                        }
                    }
                }
            }
            None => {
                if self.mons.is_empty() {
                    self.mons.push(Monitor::new());
                }
                if self.mons[0].mw != self.screen_width || self.mons[0].mh != self.screen_height {
                    dirty = true;
                    let m = &mut self.mons[0];
                    m.mw = self.screen_width;
                    m.ww = self.screen_width;
                    m.mh = self.screen_height;
                    m.wh = self.screen_height;
                    m.update_bar_pos(self.bar_height);
                }
            }
        }
        if dirty {
            self.selected_monitor = 0;
            self.selected_monitor = self.window_to_monitor(self.root.0);
        }
        dirty
    }

    /// Create a bar window for every monitor that lacks one.
    pub fn update_bars(&mut self) {
        for i in 0..self.mons.len() {
            if self.mons[i].bar_window.0 != 0 {
                continue;
            }
            let (wx, by, ww) = {
                let m = &self.mons[i];
                (m.wx, m.by, m.ww)
            };
            let barwin = unsafe {
                let mut wa: xlib::XSetWindowAttributes = std::mem::zeroed();
                wa.override_redirect = 1;
                wa.background_pixmap = xlib::ParentRelative as c_ulong;
                wa.event_mask = xlib::ButtonPressMask | xlib::ExposureMask;
                self.xwrapper.create_window(
                    self.root,
                    wx,
                    by,
                    ww as u32,
                    self.bar_height as u32,
                    0,
                    self.xwrapper.default_depth(self.screen),
                    xlib::InputOutput as u32,
                    self.xwrapper.default_visual(self.screen),
                    (xlib::CWOverrideRedirect | xlib::CWBackPixmap | xlib::CWEventMask) as u64,
                    &mut wa,
                )
            };
            self.xwrapper
                .define_cursor(barwin, self.cursor[CursorType::Normal as usize]);
            self.xwrapper.map_raised(barwin);
            self.xwrapper.set_class_hint(barwin, env!("CARGO_PKG_NAME"));
            self.mons[i].bar_window = barwin;
        }
    }
}

impl Drop for Tilemux {
    /// Teardown: make every client visible, hand the windows back
    /// unharmed, then drop our decorations and properties.
    fn drop(&mut self) {
        let selmon = self.selected_monitor;
        self.mons[selmon].view(!0);
        for i in 0..self.mons.len() {
            while let Some(&h) = self.mons[i].stack.first() {
                self.unmanage(h, false);
            }
        }
        self.xwrapper.ungrab_keys(self.root);
        for i in 0..self.mons.len() {
            let barwin = self.mons[i].bar_window;
            if barwin.0 != 0 {
                self.xwrapper.unmap_window(barwin);
                self.xwrapper.destroy_window(barwin);
            }
        }
        for cur in self.cursor {
            if cur.0 != 0 {
                self.xwrapper.free_cursor(cur);
            }
        }
        if self.wm_check_window.0 != 0 {
            self.xwrapper.destroy_window(self.wm_check_window);
        }
        self.xwrapper.sync(false);
        self.xwrapper
            .set_input_focus(self.root, xlib::RevertToPointerRoot);
        self.xwrapper.delete_property(
            self.root,
            self.xwrapper.atoms.get(Atom::Net(Net::ActiveWindow)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_utf8_boundaries() {
        let s = "é".repeat(200); // 400 bytes
        let t = truncated(s, STATUS_MAX);
        assert!(t.len() <= STATUS_MAX);
        assert!(t.chars().all(|c| c == 'é'));
    }

    #[test]
    fn short_strings_are_untouched() {
        assert_eq!(truncated("status".to_string(), STATUS_MAX), "status");
    }
}
