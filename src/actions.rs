use crate::command::Command;
use crate::config::TAG_MASK;
use crate::events;
use crate::layouts::Layout;
use crate::state::Tilemux;
use crate::utils;

/// Region of the screen a button press landed on; bindings are matched on
/// the pair (region, button, cleaned modifiers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    TagBar,
    LtSymbol,
    StatusText,
    WinTitle,
    ClientWin,
    RootWin,
}

/// A user command bound to a key or button.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    Spawn(Command),
    ToggleBar,
    FocusStack(i32),
    IncNMaster(i32),
    SetMFact(f32),
    Zoom,
    View(u32),
    ToggleView(u32),
    Tag(u32),
    ToggleTag(u32),
    FocusMon(i32),
    TagMon(i32),
    KillClient,
    SetLayout(Option<&'static Layout>),
    ToggleFloating,
    MoveMouse,
    ResizeMouse,
    Quit,
}

impl Action {
    pub fn execute(&self, state: &mut Tilemux) {
        match *self {
            Action::Spawn(cmd) => {
                utils::spawn(cmd, state.xwrapper.connection_fd());
            }
            Action::ToggleBar => {
                let selmon_idx = state.selected_monitor;
                let bh = state.bar_height;
                let m = &mut state.mons[selmon_idx];
                m.show_bar = !m.show_bar;
                m.update_bar_pos(bh);
                let (barwin, wx, by, ww) = (m.bar_window, m.wx, m.by, m.ww);
                state.xwrapper.move_resize_window(barwin, wx, by, ww, bh);
                state.arrange(Some(selmon_idx));
            }
            Action::FocusStack(dir) => state.focus_stack(dir),
            Action::IncNMaster(i) => {
                let selmon_idx = state.selected_monitor;
                let m = &mut state.mons[selmon_idx];
                m.nmaster = (m.nmaster + i).max(0);
                state.arrange(Some(selmon_idx));
            }
            Action::SetMFact(f) => {
                let selmon_idx = state.selected_monitor;
                let m = &mut state.mons[selmon_idx];
                if m.layout().arrange.is_none() {
                    return;
                }
                // values above 1.0 set the factor absolutely
                let f = if f < 1.0 { f + m.mfact } else { f - 1.0 };
                if !(0.1..=0.9).contains(&f) {
                    return;
                }
                m.mfact = f;
                state.arrange(Some(selmon_idx));
            }
            Action::Zoom => state.zoom(),
            Action::View(mask) => {
                let selmon_idx = state.selected_monitor;
                if state.mons[selmon_idx].view(mask) {
                    state.focus(None);
                    state.arrange(Some(selmon_idx));
                }
            }
            Action::ToggleView(mask) => {
                let selmon_idx = state.selected_monitor;
                if state.mons[selmon_idx].toggle_view(mask) {
                    state.focus(None);
                    state.arrange(Some(selmon_idx));
                }
            }
            Action::Tag(mask) => {
                let selmon_idx = state.selected_monitor;
                let sel = state.mons[selmon_idx].sel;
                if let Some(h) = sel {
                    if mask & TAG_MASK != 0 {
                        if let Some(c) = state.clients.get_mut(&h) {
                            c.tags = mask & TAG_MASK;
                        }
                        state.focus(None);
                        state.arrange(Some(selmon_idx));
                    }
                }
            }
            Action::ToggleTag(mask) => {
                let selmon_idx = state.selected_monitor;
                let sel = state.mons[selmon_idx].sel;
                if let Some(h) = sel {
                    let newtags = state
                        .clients
                        .get(&h)
                        .map(|c| c.tags ^ (mask & TAG_MASK));
                    if let Some(newtags) = newtags {
                        if newtags != 0 {
                            state.clients.get_mut(&h).unwrap().tags = newtags;
                            state.focus(None);
                            state.arrange(Some(selmon_idx));
                        }
                    }
                }
            }
            Action::FocusMon(dir) => {
                if state.mons.len() <= 1 {
                    return;
                }
                let m = state.dir_to_monitor(dir);
                if m == state.selected_monitor {
                    return;
                }
                let sel = state.mons[state.selected_monitor].sel;
                if let Some(h) = sel {
                    state.unfocus(h, false);
                }
                state.selected_monitor = m;
                state.focus(None);
            }
            Action::TagMon(dir) => {
                if state.mons.len() <= 1 {
                    return;
                }
                let sel = state.mons[state.selected_monitor].sel;
                if let Some(h) = sel {
                    let target = state.dir_to_monitor(dir);
                    state.send_mon(h, target);
                }
            }
            Action::KillClient => state.kill_client(),
            Action::SetLayout(layout) => {
                let selmon_idx = state.selected_monitor;
                {
                    let m = &mut state.mons[selmon_idx];
                    let keep = match layout {
                        Some(l) => std::ptr::eq(l, m.layout()),
                        None => false,
                    };
                    if !keep {
                        m.selected_lt ^= 1;
                    }
                    if let Some(l) = layout {
                        m.lt[m.selected_lt as usize] = l;
                    }
                    m.lt_symbol = m.layout().symbol.to_string();
                }
                if state.mons[selmon_idx].sel.is_some() {
                    state.arrange(Some(selmon_idx));
                } else {
                    state.draw_bar(selmon_idx);
                }
            }
            Action::ToggleFloating => state.toggle_floating(),
            Action::MoveMouse => events::move_mouse(state),
            Action::ResizeMouse => events::resize_mouse(state),
            Action::Quit => {
                state.running = false;
            }
        }
    }
}

impl Tilemux {
    /// Cycle focus over the visible clients of the selected monitor in
    /// client-list order, wrapping at either end.
    fn focus_stack(&mut self, dir: i32) {
        let selmon_idx = self.selected_monitor;
        let sel = match self.mons[selmon_idx].sel {
            Some(s) => s,
            None => return,
        };
        let visible: Vec<_> = {
            let m = &self.mons[selmon_idx];
            m.clients
                .iter()
                .filter(|&&h| self.clients.get(&h).map_or(false, |c| c.is_visible_on(m)))
                .copied()
                .collect()
        };
        if visible.is_empty() {
            return;
        }
        let next = match visible.iter().position(|&h| h == sel) {
            Some(pos) => {
                let len = visible.len() as i32;
                visible[((pos as i32 + dir + len) % len) as usize]
            }
            None => visible[0],
        };
        self.focus(Some(next));
        self.restack(selmon_idx);
    }

    /// Swap the selected client into the master slot; when it already is
    /// the master, promote the next tiled client instead.
    fn zoom(&mut self) {
        let selmon_idx = self.selected_monitor;
        let sel = match self.mons[selmon_idx].sel {
            Some(s) => s,
            None => return,
        };
        if self.mons[selmon_idx].layout().arrange.is_none()
            || self.clients.get(&sel).map_or(true, |c| c.is_floating)
        {
            return;
        }
        let tiled: Vec<_> = {
            let m = &self.mons[selmon_idx];
            m.clients
                .iter()
                .filter(|&&h| {
                    self.clients
                        .get(&h)
                        .map_or(false, |c| !c.is_floating && c.is_visible_on(m))
                })
                .copied()
                .collect()
        };
        let target = if tiled.first() == Some(&sel) {
            match tiled.get(1) {
                Some(&next) => next,
                None => return,
            }
        } else {
            sel
        };
        let m = &mut self.mons[selmon_idx];
        m.detach(target);
        m.attach(target);
        self.focus(Some(target));
        self.arrange(Some(selmon_idx));
    }

    /// Politely ask the selected client to close; clients ignoring
    /// WM_DELETE_WINDOW are killed under a server grab.
    fn kill_client(&mut self) {
        let sel = match self.mons[self.selected_monitor].sel {
            Some(s) => s,
            None => return,
        };
        let win = match self.clients.get(&sel) {
            Some(c) => c.win,
            None => return,
        };
        let delete = self.xwrapper.atoms.get(crate::xwrapper::Atom::Wm(crate::xwrapper::WM::Delete));
        if !self.xwrapper.send_protocol_event(win, delete) {
            self.xwrapper.grab_server();
            self.xwrapper.set_ignore_error_handler();
            self.xwrapper.set_close_down_mode(x11::xlib::DestroyAll);
            self.xwrapper.kill_client(win);
            self.xwrapper.sync(false);
            self.xwrapper.set_default_error_handler();
            self.xwrapper.ungrab_server();
        }
    }

    fn toggle_floating(&mut self) {
        let selmon_idx = self.selected_monitor;
        let sel = match self.mons[selmon_idx].sel {
            Some(s) => s,
            None => return,
        };
        let (floating, geom) = match self.clients.get_mut(&sel) {
            Some(c) => {
                if c.is_fullscreen {
                    return;
                }
                c.is_floating = !c.is_floating || c.is_fixed;
                (c.is_floating, (c.x, c.y, c.w, c.h))
            }
            None => return,
        };
        if floating {
            // restore the hinted size the client really wants
            let (x, y, w, h) = geom;
            self.resize(sel, x, y, w, h, false);
        }
        self.arrange(Some(selmon_idx));
    }
}
