use crate::monitor::Monitor;
use crate::xwrapper::Window;

/// Stable key for a managed window; the X window id never changes for the
/// lifetime of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientHandle(pub x11::xlib::XID);

impl From<Window> for ClientHandle {
    fn from(w: Window) -> Self {
        ClientHandle(w.0)
    }
}

/// One managed top-level window and everything we track about it.
///
/// Geometry excludes the border; the `old*` fields shadow the previous
/// geometry so fullscreen can be undone exactly.
#[derive(Debug, Clone)]
pub struct Client {
    pub win: Window,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub oldx: i32,
    pub oldy: i32,
    pub oldw: i32,
    pub oldh: i32,
    pub base_w: i32,
    pub base_h: i32,
    pub inc_w: i32,
    pub inc_h: i32,
    pub max_w: i32,
    pub max_h: i32,
    pub min_w: i32,
    pub min_h: i32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub bw: i32,
    pub old_bw: i32,
    pub tags: u32,
    pub is_fixed: bool,
    pub is_floating: bool,
    pub is_urgent: bool,
    pub never_focus: bool,
    pub old_state: bool,
    pub is_fullscreen: bool,
    pub monitor_idx: usize,
}

impl Client {
    pub fn new(win: Window, x: i32, y: i32, w: i32, h: i32, old_bw: i32, monitor_idx: usize) -> Self {
        Client {
            win,
            name: String::new(),
            x,
            y,
            w,
            h,
            oldx: x,
            oldy: y,
            oldw: w,
            oldh: h,
            base_w: 0,
            base_h: 0,
            inc_w: 0,
            inc_h: 0,
            max_w: 0,
            max_h: 0,
            min_w: 0,
            min_h: 0,
            min_aspect: 0.0,
            max_aspect: 0.0,
            bw: 0,
            old_bw,
            tags: 0,
            is_fixed: false,
            is_floating: false,
            is_urgent: false,
            never_focus: false,
            old_state: false,
            is_fullscreen: false,
            monitor_idx,
        }
    }

    /// Border-inclusive width.
    pub fn width(&self) -> i32 {
        self.w + 2 * self.bw
    }

    /// Border-inclusive height.
    pub fn height(&self) -> i32 {
        self.h + 2 * self.bw
    }

    pub fn is_visible_on(&self, m: &Monitor) -> bool {
        (self.tags & m.tagset[m.selected_tags as usize]) != 0
    }

    /// Constrain a proposed geometry by containment and ICCCM 4.1.2.3 size
    /// hints, returning the adjusted geometry and whether it differs from
    /// the stored one.
    ///
    /// `interact` keeps the window merely on the screen; otherwise it is
    /// kept on its monitor's usable area. The hint rules only apply when
    /// `respect_hints` is set (floating window, floating layout, or the
    /// compiled-in resize-hints switch).
    pub fn apply_size_hints(
        &self,
        mut x: i32,
        mut y: i32,
        mut w: i32,
        mut h: i32,
        interact: bool,
        screen: (i32, i32),
        usable: (i32, i32, i32, i32),
        bar_height: i32,
        respect_hints: bool,
    ) -> (i32, i32, i32, i32, bool) {
        let (sw, sh) = screen;
        let (wx, wy, ww, wh) = usable;

        w = w.max(1);
        h = h.max(1);
        if interact {
            if x > sw {
                x = sw - self.width();
            }
            if y > sh {
                y = sh - self.height();
            }
            if x + w + 2 * self.bw < 0 {
                x = 0;
            }
            if y + h + 2 * self.bw < 0 {
                y = 0;
            }
        } else {
            if x >= wx + ww {
                x = wx + ww - self.width();
            }
            if y >= wy + wh {
                y = wy + wh - self.height();
            }
            if x + w + 2 * self.bw <= wx {
                x = wx;
            }
            if y + h + 2 * self.bw <= wy {
                y = wy;
            }
        }
        if h < bar_height {
            h = bar_height;
        }
        if w < bar_height {
            w = bar_height;
        }
        if respect_hints {
            // ICCCM 4.1.2.3: the base size is subtracted before the aspect
            // check only when it differs from the minimum size.
            let base_is_min = self.base_w == self.min_w && self.base_h == self.min_h;
            if !base_is_min {
                w -= self.base_w;
                h -= self.base_h;
            }
            if self.min_aspect > 0.0 && self.max_aspect > 0.0 {
                if self.max_aspect < w as f32 / h as f32 {
                    w = (h as f32 * self.max_aspect + 0.5) as i32;
                } else if self.min_aspect < h as f32 / w as f32 {
                    h = (w as f32 * self.min_aspect + 0.5) as i32;
                }
            }
            if base_is_min {
                // increment calculation requires the base removed
                w -= self.base_w;
                h -= self.base_h;
            }
            if self.inc_w > 0 {
                w -= w % self.inc_w;
            }
            if self.inc_h > 0 {
                h -= h % self.inc_h;
            }
            w = (w + self.base_w).max(self.min_w);
            h = (h + self.base_h).max(self.min_h);
            if self.max_w > 0 {
                w = w.min(self.max_w);
            }
            if self.max_h > 0 {
                h = h.min(self.max_h);
            }
        }
        let changed = x != self.x || y != self.y || w != self.w || h != self.h;
        (x, y, w, h, changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        let mut c = Client::new(Window(1), 0, 0, 100, 100, 0, 0);
        c.bw = 1;
        c.is_floating = true;
        c
    }

    const SCREEN: (i32, i32) = (1920, 1080);
    const USABLE: (i32, i32, i32, i32) = (0, 20, 1920, 1060);
    const BH: i32 = 20;

    #[test]
    fn increments_floor_the_proposed_size() {
        let mut c = client();
        c.inc_w = 80;
        c.inc_h = 16;
        c.min_w = 80;
        c.min_h = 16;
        let (_, _, w, h, _) =
            c.apply_size_hints(10, 30, 837, 409, true, SCREEN, USABLE, BH, true);
        assert_eq!((w, h), (800, 400));
    }

    #[test]
    fn hint_application_is_a_fixed_point() {
        let mut c = client();
        c.inc_w = 13;
        c.inc_h = 7;
        c.base_w = 4;
        c.base_h = 9;
        c.min_w = 30;
        c.min_h = 30;
        c.max_w = 700;
        c.max_h = 500;
        let (x, y, w, h, _) =
            c.apply_size_hints(50, 60, 641, 483, true, SCREEN, USABLE, BH, true);
        let (x2, y2, w2, h2, _) =
            c.apply_size_hints(x, y, w, h, true, SCREEN, USABLE, BH, true);
        assert_eq!((x, y, w, h), (x2, y2, w2, h2));
    }

    #[test]
    fn aspect_limits_shrink_oversized_proposals() {
        let mut c = client();
        c.min_aspect = 0.5;
        c.max_aspect = 2.0;
        let (_, _, w, h, _) =
            c.apply_size_hints(0, 30, 900, 300, true, SCREEN, USABLE, BH, true);
        assert!(w as f32 / h as f32 <= 2.0 + f32::EPSILON);
        // too tall proposals shrink the height instead
        let (_, _, w, h, _) =
            c.apply_size_hints(0, 30, 200, 900, true, SCREEN, USABLE, BH, true);
        assert!(h as f32 / w as f32 <= 2.0 + f32::EPSILON);
    }

    #[test]
    fn zeroed_hints_only_clamp_to_bar_height() {
        let c = client();
        let (_, _, w, h, _) = c.apply_size_hints(0, 30, 5, 5, true, SCREEN, USABLE, BH, true);
        assert_eq!((w, h), (BH, BH));
    }

    #[test]
    fn containment_pulls_offscreen_windows_back() {
        let c = client();
        // fully right of the monitor's usable area
        let (x, _, _, _, _) =
            c.apply_size_hints(3000, 30, 100, 100, false, SCREEN, USABLE, BH, false);
        assert_eq!(x, USABLE.0 + USABLE.2 - c.width());
        // fully left of it
        let (x, _, _, _, _) =
            c.apply_size_hints(-500, 30, 100, 100, false, SCREEN, USABLE, BH, false);
        assert_eq!(x, USABLE.0);
    }

    #[test]
    fn unchanged_geometry_reports_no_change() {
        let c = client();
        let (_, _, _, _, changed) =
            c.apply_size_hints(c.x, c.y, c.w, c.h, false, SCREEN, USABLE, BH, false);
        assert!(!changed);
    }
}
