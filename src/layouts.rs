use crate::client::ClientHandle;
use crate::state::Tilemux;

/// A layout is a symbol plus an optional arrange callback; no callback
/// means floating behaviour (clients keep their own geometry).
#[derive(Debug)]
pub struct Layout {
    pub symbol: &'static str,
    pub arrange: Option<fn(&mut Tilemux, usize)>,
}

/// The first entry is the default layout.
pub static LAYOUTS: [Layout; 3] = [
    Layout {
        symbol: "[]=",
        arrange: Some(tile),
    },
    Layout {
        symbol: "><>",
        arrange: None,
    },
    Layout {
        symbol: "[M]",
        arrange: Some(monocle),
    },
];

/// Geometry of one tiled slot. The first `nmaster` clients stack in the
/// master strip of width `ww * mfact`, the rest in the remaining strip;
/// each slot gets an equal share of the height still unassigned (`my`/`ty`
/// are the heights already consumed in each strip).
pub(crate) fn tile_slot(
    i: usize,
    n: usize,
    nmaster: i32,
    mfact: f32,
    (wx, wy, ww, wh): (i32, i32, i32, i32),
    my: i32,
    ty: i32,
    bw: i32,
) -> (i32, i32, i32, i32) {
    let nmaster = nmaster.max(0) as usize;
    let mw = if n > nmaster {
        if nmaster > 0 {
            (ww as f32 * mfact) as i32
        } else {
            0
        }
    } else {
        ww
    };
    if i < nmaster {
        let h = (wh - my) / (n.min(nmaster) - i) as i32;
        (wx, wy + my, mw - 2 * bw, h - 2 * bw)
    } else {
        let h = (wh - ty) / (n - i) as i32;
        (wx + mw, wy + ty, ww - mw - 2 * bw, h - 2 * bw)
    }
}

fn tiled_clients(state: &Tilemux, mon_idx: usize) -> Vec<ClientHandle> {
    let mon = &state.mons[mon_idx];
    mon.clients
        .iter()
        .filter(|&&h| {
            state
                .clients
                .get(&h)
                .map_or(false, |c| !c.is_floating && c.is_visible_on(mon))
        })
        .copied()
        .collect()
}

fn tile(state: &mut Tilemux, mon_idx: usize) {
    let tiled = tiled_clients(state, mon_idx);
    let n = tiled.len();
    if n == 0 {
        return;
    }

    let (nmaster, mfact, area) = {
        let mon = &state.mons[mon_idx];
        (mon.nmaster, mon.mfact, (mon.wx, mon.wy, mon.ww, mon.wh))
    };

    let mut my = 0;
    let mut ty = 0;
    for (i, &handle) in tiled.iter().enumerate() {
        let bw = state.clients[&handle].bw;
        let (x, y, w, h) = tile_slot(i, n, nmaster, mfact, area, my, ty, bw);
        state.resize(handle, x, y, w, h, false);
        // accumulate the height actually granted; size hints may have
        // adjusted it
        let granted = state.clients[&handle].height();
        if i < nmaster.max(0) as usize {
            my += granted;
        } else {
            ty += granted;
        }
    }
}

fn monocle(state: &mut Tilemux, mon_idx: usize) {
    let visible = {
        let mon = &state.mons[mon_idx];
        mon.clients
            .iter()
            .filter(|&&h| state.clients.get(&h).map_or(false, |c| c.is_visible_on(mon)))
            .count()
    };
    if visible > 0 {
        state.mons[mon_idx].lt_symbol = format!("[{}]", visible);
    }
    let (wx, wy, ww, wh) = {
        let mon = &state.mons[mon_idx];
        (mon.wx, mon.wy, mon.ww, mon.wh)
    };
    for handle in tiled_clients(state, mon_idx) {
        let bw = state.clients[&handle].bw;
        state.resize(handle, wx, wy, ww - 2 * bw, wh - 2 * bw, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run the slot recurrence the way `tile` does when size hints leave
    /// the granted heights unchanged.
    fn tile_all(
        n: usize,
        nmaster: i32,
        mfact: f32,
        area: (i32, i32, i32, i32),
        bw: i32,
    ) -> Vec<(i32, i32, i32, i32)> {
        let mut my = 0;
        let mut ty = 0;
        (0..n)
            .map(|i| {
                let r = tile_slot(i, n, nmaster, mfact, area, my, ty, bw);
                if i < nmaster.max(0) as usize {
                    my += r.3 + 2 * bw;
                } else {
                    ty += r.3 + 2 * bw;
                }
                r
            })
            .collect()
    }

    #[test]
    fn master_and_stack_split_at_mfact() {
        let bw = 1;
        let rects = tile_all(4, 1, 0.55, (0, 0, 1600, 1000), bw);
        assert_eq!(rects[0], (0, 0, 880 - 2 * bw, 1000 - 2 * bw));
        // the three stack windows split the right strip top to bottom
        let heights: Vec<i32> = rects[1..].iter().map(|r| r.3 + 2 * bw).collect();
        assert_eq!(heights, vec![333, 333, 334]);
        for r in &rects[1..] {
            assert_eq!(r.0, 880);
            assert_eq!(r.2, 1600 - 880 - 2 * bw);
        }
        assert_eq!(rects[1].1, 0);
        assert_eq!(rects[2].1, 333);
        assert_eq!(rects[3].1, 666);
    }

    #[test]
    fn master_fills_the_width_when_not_outnumbered() {
        let rects = tile_all(2, 2, 0.55, (0, 0, 1600, 1000), 0);
        assert_eq!(rects[0], (0, 0, 1600, 500));
        assert_eq!(rects[1], (0, 500, 1600, 500));
    }

    #[test]
    fn zero_nmaster_gives_everything_to_the_stack() {
        let rects = tile_all(2, 0, 0.55, (0, 0, 1600, 1000), 0);
        assert_eq!(rects[0], (0, 0, 1600, 500));
        assert_eq!(rects[1], (0, 500, 1600, 500));
    }

    #[test]
    fn offset_monitor_origin_is_respected() {
        let rects = tile_all(2, 1, 0.5, (1920, 20, 1000, 800), 0);
        assert_eq!(rects[0], (1920, 20, 500, 800));
        assert_eq!(rects[1], (2420, 20, 500, 800));
    }

    #[test]
    fn floating_layout_has_no_arrange_callback() {
        assert!(LAYOUTS[1].arrange.is_none());
        assert_eq!(LAYOUTS[1].symbol, "><>");
    }
}
