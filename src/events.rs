use x11::xlib;

use crate::actions::{Action, ClickKind};
use crate::config::{self, SNAP};
use crate::state::{CursorType, Tilemux, WmState};

const MOUSEMASK: i64 =
    xlib::ButtonPressMask | xlib::ButtonReleaseMask | xlib::PointerMotionMask;

/// Dispatch one X event to its handler. The match compiles to a jump on
/// the event type, so dispatch stays constant-time; every type outside
/// the fourteen we consume is dropped here.
pub fn handle(state: &mut Tilemux, ev: &mut xlib::XEvent) {
    match ev.get_type() {
        xlib::ButtonPress => button_press(state, unsafe { &ev.button }),
        xlib::ClientMessage => client_message(state, unsafe { &ev.client_message }),
        xlib::ConfigureRequest => configure_request(state, unsafe { &ev.configure_request }),
        xlib::ConfigureNotify => configure_notify(state, unsafe { &ev.configure }),
        xlib::DestroyNotify => destroy_notify(state, unsafe { &ev.destroy_window }),
        xlib::EnterNotify => enter_notify(state, unsafe { &ev.crossing }),
        xlib::Expose => expose(state, unsafe { &ev.expose }),
        xlib::FocusIn => focus_in(state, unsafe { &ev.focus_change }),
        xlib::KeyPress => key_press(state, unsafe { &ev.key }),
        xlib::MappingNotify => mapping_notify(state, unsafe { &mut ev.mapping }),
        xlib::MapRequest => map_request(state, unsafe { &ev.map_request }),
        xlib::MotionNotify => motion_notify(state, unsafe { &ev.motion }),
        xlib::PropertyNotify => property_notify(state, unsafe { &ev.property }),
        xlib::UnmapNotify => unmap_notify(state, unsafe { &ev.unmap }),
        _ => {}
    }
}

/// Tag-region bindings carry a zero mask meaning "the clicked cell".
fn with_tag_arg(action: Action, arg: u32) -> Action {
    match action {
        Action::View(0) => Action::View(arg),
        Action::ToggleView(0) => Action::ToggleView(arg),
        Action::Tag(0) => Action::Tag(arg),
        Action::ToggleTag(0) => Action::ToggleTag(arg),
        other => other,
    }
}

fn button_press(state: &mut Tilemux, ev: &xlib::XButtonEvent) {
    let mut click = ClickKind::RootWin;
    let mut click_arg = 0u32;

    // focus the monitor under the click first
    let m = state.window_to_monitor(ev.window);
    if m != state.selected_monitor {
        if let Some(sel) = state.mons[state.selected_monitor].sel {
            state.unfocus(sel, true);
        }
        state.selected_monitor = m;
        state.focus(None);
    }

    if ev.window == state.mons[state.selected_monitor].bar_window.0 {
        for cl in &state.mons[state.selected_monitor].clickables {
            if ev.x >= cl.pos.x && ev.x < cl.pos.x + cl.size.x {
                click = cl.kind;
                click_arg = cl.arg;
                break;
            }
        }
    } else if let Some(h) = state.window_to_client_handle(ev.window) {
        state.focus(Some(h));
        state.restack(state.selected_monitor);
        // pass the click on to the application as well
        state.xwrapper.allow_events(xlib::ReplayPointer);
        click = ClickKind::ClientWin;
    }

    for b in config::buttons() {
        if b.click == click
            && b.button == ev.button
            && state.xwrapper.clean_mask(b.mask, state.numlock_mask)
                == state.xwrapper.clean_mask(ev.state, state.numlock_mask)
        {
            let action = if click == ClickKind::TagBar {
                with_tag_arg(b.action, click_arg)
            } else {
                b.action
            };
            action.execute(state);
        }
    }
}

fn client_message(state: &mut Tilemux, ev: &xlib::XClientMessageEvent) {
    let h = match state.window_to_client_handle(ev.window) {
        Some(h) => h,
        None => return,
    };
    let atoms = &state.xwrapper.atoms;
    let net_wm_state = atoms.get(crate::xwrapper::Atom::Net(crate::xwrapper::Net::WMState));
    let net_fullscreen = atoms.get(crate::xwrapper::Atom::Net(crate::xwrapper::Net::WMFullscreen));
    let net_active = atoms.get(crate::xwrapper::Atom::Net(crate::xwrapper::Net::ActiveWindow));

    if ev.message_type == net_wm_state {
        if ev.data.get_long(1) as u64 == net_fullscreen
            || ev.data.get_long(2) as u64 == net_fullscreen
        {
            // data[0]: 0 = remove, 1 = add, 2 = toggle
            let verb = ev.data.get_long(0);
            let currently = state.clients.get(&h).map_or(false, |c| c.is_fullscreen);
            state.set_fullscreen(h, verb == 1 || (verb == 2 && !currently));
        }
    } else if ev.message_type == net_active {
        let is_selected = state.mons[state.selected_monitor].sel == Some(h);
        let urgent = state.clients.get(&h).map_or(true, |c| c.is_urgent);
        if !is_selected && !urgent {
            state.set_urgent(h, true);
        }
    }
}

fn configure_request(state: &mut Tilemux, ev: &xlib::XConfigureRequestEvent) {
    if let Some(h) = state.window_to_client_handle(ev.window) {
        if ev.value_mask & xlib::CWBorderWidth as u64 != 0 {
            if let Some(c) = state.clients.get_mut(&h) {
                c.bw = ev.border_width;
            }
        } else {
            let floating = state.clients[&h].is_floating
                || state.mons[state.selected_monitor].layout().arrange.is_none();
            if floating {
                let (win, geom, notify_only) = {
                    let mon_idx = state.clients[&h].monitor_idx;
                    let (mx, my, mw, mh) = {
                        let m = &state.mons[mon_idx];
                        (m.mx, m.my, m.mw, m.mh)
                    };
                    let c = state.clients.get_mut(&h).unwrap();
                    if ev.value_mask & xlib::CWX as u64 != 0 {
                        c.oldx = c.x;
                        c.x = mx + ev.x;
                    }
                    if ev.value_mask & xlib::CWY as u64 != 0 {
                        c.oldy = c.y;
                        c.y = my + ev.y;
                    }
                    if ev.value_mask & xlib::CWWidth as u64 != 0 {
                        c.oldw = c.w;
                        c.w = ev.width;
                    }
                    if ev.value_mask & xlib::CWHeight as u64 != 0 {
                        c.oldh = c.h;
                        c.h = ev.height;
                    }
                    // a floating window pushed over the far edge is
                    // re-centred on that axis
                    if c.x + c.w > mx + mw && c.is_floating {
                        c.x = mx + (mw / 2 - c.width() / 2);
                    }
                    if c.y + c.h > my + mh && c.is_floating {
                        c.y = my + (mh / 2 - c.height() / 2);
                    }
                    let moved = ev.value_mask & (xlib::CWX | xlib::CWY) as u64 != 0;
                    let sized = ev.value_mask & (xlib::CWWidth | xlib::CWHeight) as u64 != 0;
                    (c.win, (c.x, c.y, c.w, c.h), moved && !sized)
                };
                if notify_only {
                    let (x, y, w, hgt) = geom;
                    let bw = state.clients[&h].bw;
                    state.xwrapper.send_configure_notify(win, x, y, w, hgt, bw);
                }
                if state.client_visible(h) {
                    let (x, y, w, hgt) = geom;
                    state.xwrapper.move_resize_window(win, x, y, w, hgt);
                }
            } else {
                // tiled clients keep our geometry; just tell them so
                let c = &state.clients[&h];
                state
                    .xwrapper
                    .send_configure_notify(c.win, c.x, c.y, c.w, c.h, c.bw);
            }
        }
    } else {
        state.xwrapper.configure_passthrough(ev);
    }
    state.xwrapper.sync(false);
}

/// Root geometry changes (output hotplug, resolution change): re-query
/// monitors, re-fit fullscreen clients and bars, rearrange everything.
fn configure_notify(state: &mut Tilemux, ev: &xlib::XConfigureEvent) {
    if ev.window != state.root.0 {
        return;
    }
    let dirty = state.screen_width != ev.width || state.screen_height != ev.height;
    state.screen_width = ev.width;
    state.screen_height = ev.height;
    if state.update_geometry() || dirty {
        state
            .xwrapper
            .resize_drawable(state.screen_width as u32, state.bar_height as u32);
        state.update_bars();
        for i in 0..state.mons.len() {
            let handles = state.mons[i].clients.clone();
            for h in handles {
                if state.clients.get(&h).map_or(false, |c| c.is_fullscreen) {
                    state.refit_fullscreen_client(h);
                }
            }
            let (barwin, wx, by, ww) = {
                let m = &state.mons[i];
                (m.bar_window, m.wx, m.by, m.ww)
            };
            state
                .xwrapper
                .move_resize_window(barwin, wx, by, ww, state.bar_height);
        }
        state.focus(None);
        state.arrange(None);
    }
}

fn destroy_notify(state: &mut Tilemux, ev: &xlib::XDestroyWindowEvent) {
    if let Some(h) = state.window_to_client_handle(ev.window) {
        state.unmanage(h, true);
    }
}

fn enter_notify(state: &mut Tilemux, ev: &xlib::XCrossingEvent) {
    // ignore pseudo-motion crossings and child-to-parent transitions
    if (ev.mode != xlib::NotifyNormal || ev.detail == xlib::NotifyInferior)
        && ev.window != state.root.0
    {
        return;
    }
    let c = state.window_to_client_handle(ev.window);
    let m = match c.and_then(|h| state.clients.get(&h)) {
        Some(client) => client.monitor_idx,
        None => state.window_to_monitor(ev.window),
    };
    if m != state.selected_monitor {
        if let Some(sel) = state.mons[state.selected_monitor].sel {
            state.unfocus(sel, true);
        }
        state.selected_monitor = m;
    } else if c.is_none() || c == state.mons[state.selected_monitor].sel {
        return;
    }
    state.focus(c);
}

fn expose(state: &mut Tilemux, ev: &xlib::XExposeEvent) {
    if ev.count == 0 {
        let m = state.window_to_monitor(ev.window);
        state.draw_bar(m);
    }
}

/// Some clients steal the input focus; pull it back to the selection.
fn focus_in(state: &mut Tilemux, ev: &xlib::XFocusChangeEvent) {
    if let Some(sel) = state.mons[state.selected_monitor].sel {
        let win = state.clients.get(&sel).map(|c| c.win.0);
        if win != Some(ev.window) {
            state.set_focus(sel);
        }
    }
}

fn key_press(state: &mut Tilemux, ev: &xlib::XKeyEvent) {
    let keysym = state.xwrapper.keycode_to_keysym(ev.keycode);
    for key in config::keys() {
        if keysym == key.keysym as u64
            && state.xwrapper.clean_mask(key.mask, state.numlock_mask)
                == state.xwrapper.clean_mask(ev.state, state.numlock_mask)
        {
            key.action.execute(state);
        }
    }
}

fn mapping_notify(state: &mut Tilemux, ev: &mut xlib::XMappingEvent) {
    state.xwrapper.refresh_keyboard_mapping(ev);
    if ev.request == xlib::MappingKeyboard {
        state.grab_keys();
    }
}

fn map_request(state: &mut Tilemux, ev: &xlib::XMapRequestEvent) {
    let wa = match state.xwrapper.get_window_attributes(crate::xwrapper::Window(ev.window)) {
        Some(wa) => wa,
        None => return,
    };
    if wa.override_redirect != 0 {
        return;
    }
    if state.window_to_client_handle(ev.window).is_none() {
        state.manage(ev.window, &wa);
    }
}

/// Pointer crossings between monitors on the root window move the
/// selection.
fn motion_notify(state: &mut Tilemux, ev: &xlib::XMotionEvent) {
    if ev.window != state.root.0 {
        return;
    }
    let m = state.rect_to_monitor(ev.x_root, ev.y_root, 1, 1);
    if state.motion_mon.is_some() && state.motion_mon != Some(m) {
        if let Some(sel) = state.mons[state.selected_monitor].sel {
            state.unfocus(sel, true);
        }
        state.selected_monitor = m;
        state.focus(None);
    }
    state.motion_mon = Some(m);
}

fn property_notify(state: &mut Tilemux, ev: &xlib::XPropertyEvent) {
    if ev.window == state.root.0 && ev.atom == xlib::XA_WM_NAME {
        state.update_status();
        return;
    }
    if ev.state == xlib::PropertyDelete {
        return;
    }
    let h = match state.window_to_client_handle(ev.window) {
        Some(h) => h,
        None => return,
    };
    let net_wm_name = state
        .xwrapper
        .atoms
        .get(crate::xwrapper::Atom::Net(crate::xwrapper::Net::WMName));
    let net_window_type = state
        .xwrapper
        .atoms
        .get(crate::xwrapper::Atom::Net(crate::xwrapper::Net::WMWindowType));

    match ev.atom {
        xlib::XA_WM_TRANSIENT_FOR => {
            let (win, floating, mon_idx) = {
                let c = &state.clients[&h];
                (c.win, c.is_floating, c.monitor_idx)
            };
            if !floating {
                let trans = state.xwrapper.get_transient_for_hint(win);
                if trans.map_or(false, |t| state.window_to_client_handle(t.0).is_some()) {
                    state.clients.get_mut(&h).unwrap().is_floating = true;
                    state.arrange(Some(mon_idx));
                }
            }
        }
        xlib::XA_WM_NORMAL_HINTS => state.update_size_hints(h),
        xlib::XA_WM_HINTS => {
            state.update_wm_hints(h);
            state.draw_bars();
        }
        _ => {}
    }
    if ev.atom == xlib::XA_WM_NAME || ev.atom == net_wm_name {
        state.update_title(h);
        let mon_idx = state.clients[&h].monitor_idx;
        if state.mons[mon_idx].sel == Some(h) {
            state.draw_bar(mon_idx);
        }
    }
    if ev.atom == net_window_type {
        state.update_window_type(h);
    }
}

fn unmap_notify(state: &mut Tilemux, ev: &xlib::XUnmapEvent) {
    if let Some(h) = state.window_to_client_handle(ev.window) {
        if ev.send_event != 0 {
            let win = state.clients[&h].win;
            state.set_client_state(win, WmState::Withdrawn);
        } else {
            state.unmanage(h, false);
        }
    }
}

/// Drag the selected window with the pointer. Runs a nested blocking loop
/// on the same connection until the button is released, forwarding the
/// events other windows still need. Motion is throttled to 60 Hz, edges
/// snap, and dragging a tiled window far enough floats it.
pub fn move_mouse(state: &mut Tilemux) {
    let h = match state.mons[state.selected_monitor].sel {
        Some(h) => h,
        None => return,
    };
    if state.clients[&h].is_fullscreen {
        // no moving fullscreen windows with the mouse
        return;
    }
    state.restack(state.selected_monitor);
    let (ocx, ocy) = {
        let c = &state.clients[&h];
        (c.x, c.y)
    };
    if !state.xwrapper.grab_pointer(
        MOUSEMASK,
        state.cursor[CursorType::Move as usize],
    ) {
        return;
    }
    let (px, py) = match state.xwrapper.query_pointer_position() {
        Some(p) => p,
        None => {
            state.xwrapper.ungrab_pointer();
            return;
        }
    };
    let mut lasttime: xlib::Time = 0;
    loop {
        let mut ev = state
            .xwrapper
            .mask_event(MOUSEMASK | xlib::ExposureMask | xlib::SubstructureRedirectMask);
        match ev.get_type() {
            xlib::ConfigureRequest | xlib::Expose | xlib::MapRequest => {
                handle(state, &mut ev);
            }
            xlib::MotionNotify => {
                let mev = unsafe { ev.motion };
                if mev.time - lasttime <= 1000 / 60 {
                    continue;
                }
                lasttime = mev.time;
                if state.clients.get(&h).is_none() {
                    break;
                }
                let (wx, wy, ww, wh, has_arrange) = {
                    let m = &state.mons[state.selected_monitor];
                    (m.wx, m.wy, m.ww, m.wh, m.layout().arrange.is_some())
                };
                let (width, height, cx, cy, floating) = {
                    let c = &state.clients[&h];
                    (c.width(), c.height(), c.x, c.y, c.is_floating)
                };
                let mut nx = ocx + mev.x - px;
                let mut ny = ocy + mev.y - py;
                if (wx - nx).abs() < SNAP {
                    nx = wx;
                } else if ((wx + ww) - (nx + width)).abs() < SNAP {
                    nx = wx + ww - width;
                }
                if (wy - ny).abs() < SNAP {
                    ny = wy;
                } else if ((wy + wh) - (ny + height)).abs() < SNAP {
                    ny = wy + wh - height;
                }
                if !floating
                    && has_arrange
                    && ((nx - cx).abs() > SNAP || (ny - cy).abs() > SNAP)
                {
                    Action::ToggleFloating.execute(state);
                }
                let (now_floating, cw, ch) = match state.clients.get(&h) {
                    Some(c) => (c.is_floating, c.w, c.h),
                    None => break,
                };
                if !has_arrange || now_floating {
                    state.resize(h, nx, ny, cw, ch, true);
                }
            }
            xlib::ButtonRelease => break,
            _ => {}
        }
    }
    state.xwrapper.ungrab_pointer();
    if let Some(c) = state.clients.get(&h) {
        let (x, y, w, hgt) = (c.x, c.y, c.w, c.h);
        let m = state.rect_to_monitor(x, y, w, hgt);
        if m != state.selected_monitor {
            state.send_mon(h, m);
            state.selected_monitor = m;
            state.focus(None);
        }
    }
}

/// Resize the selected window with the pointer, anchored at its top-left
/// corner; the pointer is warped to the bottom-right corner for the
/// duration.
pub fn resize_mouse(state: &mut Tilemux) {
    let h = match state.mons[state.selected_monitor].sel {
        Some(h) => h,
        None => return,
    };
    if state.clients[&h].is_fullscreen {
        // no resizing fullscreen windows with the mouse
        return;
    }
    state.restack(state.selected_monitor);
    let (win, ocx, ocy, bw) = {
        let c = &state.clients[&h];
        (c.win, c.x, c.y, c.bw)
    };
    if !state.xwrapper.grab_pointer(
        MOUSEMASK,
        state.cursor[CursorType::Resize as usize],
    ) {
        return;
    }
    {
        let c = &state.clients[&h];
        state
            .xwrapper
            .warp_pointer(win, c.w + c.bw - 1, c.h + c.bw - 1);
    }
    let mut lasttime: xlib::Time = 0;
    loop {
        let mut ev = state
            .xwrapper
            .mask_event(MOUSEMASK | xlib::ExposureMask | xlib::SubstructureRedirectMask);
        match ev.get_type() {
            xlib::ConfigureRequest | xlib::Expose | xlib::MapRequest => {
                handle(state, &mut ev);
            }
            xlib::MotionNotify => {
                let mev = unsafe { ev.motion };
                if mev.time - lasttime <= 1000 / 60 {
                    continue;
                }
                lasttime = mev.time;
                if state.clients.get(&h).is_none() {
                    break;
                }
                let nw = (mev.x - ocx - 2 * bw + 1).max(1);
                let nh = (mev.y - ocy - 2 * bw + 1).max(1);
                let (wx, wy, ww, wh, has_arrange) = {
                    let m = &state.mons[state.selected_monitor];
                    (m.wx, m.wy, m.ww, m.wh, m.layout().arrange.is_some())
                };
                let (mon_wx, mon_wy) = {
                    let c = &state.clients[&h];
                    let m = &state.mons[c.monitor_idx];
                    (m.wx, m.wy)
                };
                let (cw, ch, floating) = {
                    let c = &state.clients[&h];
                    (c.w, c.h, c.is_floating)
                };
                if mon_wx + nw >= wx
                    && mon_wx + nw <= wx + ww
                    && mon_wy + nh >= wy
                    && mon_wy + nh <= wy + wh
                    && !floating
                    && has_arrange
                    && ((nw - cw).abs() > SNAP || (nh - ch).abs() > SNAP)
                {
                    Action::ToggleFloating.execute(state);
                }
                let (now_floating, cx, cy) = match state.clients.get(&h) {
                    Some(c) => (c.is_floating, c.x, c.y),
                    None => break,
                };
                if !has_arrange || now_floating {
                    state.resize(h, cx, cy, nw, nh, true);
                }
            }
            xlib::ButtonRelease => break,
            _ => {}
        }
    }
    if let Some(c) = state.clients.get(&h) {
        state
            .xwrapper
            .warp_pointer(win, c.w + c.bw - 1, c.h + c.bw - 1);
    }
    state.xwrapper.ungrab_pointer();
    while state
        .xwrapper
        .check_mask_event(xlib::EnterWindowMask)
        .is_some()
    {}
    if let Some(c) = state.clients.get(&h) {
        let (x, y, w, hgt) = (c.x, c.y, c.w, c.h);
        let m = state.rect_to_monitor(x, y, w, hgt);
        if m != state.selected_monitor {
            state.send_mon(h, m);
            state.selected_monitor = m;
            state.focus(None);
        }
    }
}
