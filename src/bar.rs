use crate::actions::ClickKind;
use crate::colour::{scheme, Colour};
use crate::config;
use crate::ivec2::ivec2;
use crate::monitor::Clickable;
use crate::state::Tilemux;

impl Tilemux {
    pub fn draw_bars(&mut self) {
        for i in 0..self.mons.len() {
            self.draw_bar(i);
        }
    }

    /// Render one monitor's bar: tag cells with occupancy boxes, the
    /// layout symbol, the selected window title, and (selected monitor
    /// only) the right-aligned status text. Click regions are registered
    /// as the cells are laid out.
    pub fn draw_bar(&mut self, mon_idx: usize) {
        let bh = self.bar_height;
        let lrpad = self.lr_padding;
        let boxs = self.xwrapper.get_font_height() as i32 / 9;
        let boxw = self.xwrapper.get_font_height() as i32 / 6 + 2;
        let (barwin, bar_w, selected_mon) = {
            let m = &self.mons[mon_idx];
            (m.bar_window, m.ww, mon_idx == self.selected_monitor)
        };
        self.mons[mon_idx].clickables.clear();

        // status text is only drawn on the selected monitor, with 2px of
        // right padding
        let status_w = if selected_mon {
            let status = self.status_text.clone();
            let w = self.xwrapper.text_width(&status) as i32 + 2;
            self.xwrapper.text(
                Colour::NormFg,
                Colour::NormBg,
                ivec2(bar_w - w, 0),
                ivec2(w, bh),
                0,
                &status,
            );
            self.mons[mon_idx].clickables.push(Clickable {
                pos: ivec2(bar_w - w, 0),
                size: ivec2(w, bh),
                kind: ClickKind::StatusText,
                arg: 0,
            });
            w
        } else {
            0
        };

        // which tags are occupied, and by an urgent client
        let (mut occ, mut urg) = (0u32, 0u32);
        for h in &self.mons[mon_idx].clients {
            if let Some(c) = self.clients.get(h) {
                occ |= c.tags;
                if c.is_urgent {
                    urg |= c.tags;
                }
            }
        }
        let sel_tags = self.mons[mon_idx]
            .sel
            .and_then(|h| self.clients.get(&h))
            .map_or(0, |c| c.tags);

        let mut x = 0;
        for (i, tag) in config::TAGS.iter().enumerate() {
            let mask = 1u32 << i;
            let w = self.xwrapper.text_width(tag) as i32 + lrpad;
            let active = self.mons[mon_idx].active_tagset() & mask != 0;
            let (fg, bg) = scheme(active, urg & mask != 0);
            self.xwrapper
                .text(fg, bg, ivec2(x, 0), ivec2(w, bh), lrpad as u32 / 2, tag);
            if occ & mask != 0 {
                let filled = selected_mon && sel_tags & mask != 0;
                self.xwrapper
                    .rect(fg, ivec2(x + boxs, boxs), ivec2(boxw, boxw), filled);
            }
            self.mons[mon_idx].clickables.push(Clickable {
                pos: ivec2(x, 0),
                size: ivec2(w, bh),
                kind: ClickKind::TagBar,
                arg: mask,
            });
            x += w;
        }

        let symbol = self.mons[mon_idx].lt_symbol.clone();
        let w = self.xwrapper.text_width(&symbol) as i32 + lrpad;
        self.xwrapper.text(
            Colour::NormFg,
            Colour::NormBg,
            ivec2(x, 0),
            ivec2(w, bh),
            lrpad as u32 / 2,
            &symbol,
        );
        self.mons[mon_idx].clickables.push(Clickable {
            pos: ivec2(x, 0),
            size: ivec2(w, bh),
            kind: ClickKind::LtSymbol,
            arg: 0,
        });
        x += w;

        let w = bar_w - status_w - x;
        if w > bh {
            let title = self.mons[mon_idx]
                .sel
                .and_then(|h| self.clients.get(&h))
                .map(|c| (c.name.clone(), c.is_floating, c.is_fixed));
            match title {
                Some((name, floating, fixed)) => {
                    let (fg, bg) = scheme(selected_mon, false);
                    self.xwrapper
                        .text(fg, bg, ivec2(x, 0), ivec2(w, bh), lrpad as u32 / 2, &name);
                    if floating {
                        self.xwrapper
                            .rect(fg, ivec2(x + boxs, boxs), ivec2(boxw, boxw), fixed);
                    }
                }
                None => {
                    self.xwrapper
                        .rect(Colour::NormBg, ivec2(x, 0), ivec2(w, bh), true);
                }
            }
            self.mons[mon_idx].clickables.push(Clickable {
                pos: ivec2(x, 0),
                size: ivec2(w, bh),
                kind: ClickKind::WinTitle,
                arg: 0,
            });
        }

        self.xwrapper
            .map_drawable(barwin, 0, 0, bar_w as u32, bh as u32);
    }
}
