use x11::{keysym, xlib};

use crate::actions::{Action, ClickKind};
use crate::command::Command;
use crate::layouts::LAYOUTS;

/* appearance */
pub const BORDER_PX: i32 = 1;
pub const SNAP: i32 = 32;
pub const SHOW_BAR: bool = true;
pub const TOP_BAR: bool = true;
pub const FONTS: [&str; 1] = ["monospace:size=10"];

/* tagging */
pub const TAGS: [&str; 9] = ["1", "2", "3", "4", "5", "6", "7", "8", "9"];
pub const TAG_MASK: u32 = (1 << TAGS.len()) - 1;

/* layout defaults */
pub const MFACT: f32 = 0.55;
pub const NMASTER: i32 = 1;
/// Respect size hints even for tiled windows.
pub const RESIZE_HINTS: bool = true;

pub const MODKEY: u32 = xlib::Mod1Mask;

pub struct Rule {
    pub class: Option<&'static str>,
    pub instance: Option<&'static str>,
    pub title: Option<&'static str>,
    pub tags: u32,
    pub is_floating: bool,
    pub monitor: i32,
}

impl Rule {
    /// A rule applies when each of its given patterns occurs in the
    /// corresponding window property.
    pub fn matches(&self, class: &str, instance: &str, title: &str) -> bool {
        self.title.map_or(true, |t| title.contains(t))
            && self.class.map_or(true, |c| class.contains(c))
            && self.instance.map_or(true, |i| instance.contains(i))
    }
}

/// Matched as substrings against WM_CLASS and the window title; every
/// matching rule is applied in order. A monitor of -1 keeps the window on
/// the current monitor.
pub const RULES: &[Rule] = &[
    Rule {
        class: Some("Gimp"),
        instance: None,
        title: None,
        tags: 0,
        is_floating: true,
        monitor: -1,
    },
    Rule {
        class: Some("Firefox"),
        instance: None,
        title: None,
        tags: 1 << 8,
        is_floating: false,
        monitor: -1,
    },
];

pub struct KeyBinding {
    pub mask: u32,
    pub keysym: u32,
    pub action: Action,
}

pub struct ButtonBinding {
    pub click: ClickKind,
    pub mask: u32,
    pub button: u32,
    pub action: Action,
}

pub fn keys() -> Vec<KeyBinding> {
    let mut keys = vec![
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_p,
            action: Action::Spawn(Command::Dmenu),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_Return,
            action: Action::Spawn(Command::Terminal),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_b,
            action: Action::ToggleBar,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_j,
            action: Action::FocusStack(1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_k,
            action: Action::FocusStack(-1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_i,
            action: Action::IncNMaster(1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_d,
            action: Action::IncNMaster(-1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_h,
            action: Action::SetMFact(-0.05),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_l,
            action: Action::SetMFact(0.05),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_Return,
            action: Action::Zoom,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_Tab,
            action: Action::View(0),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_c,
            action: Action::KillClient,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_t,
            action: Action::SetLayout(Some(&LAYOUTS[0])),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_f,
            action: Action::SetLayout(Some(&LAYOUTS[1])),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_m,
            action: Action::SetLayout(Some(&LAYOUTS[2])),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_space,
            action: Action::SetLayout(None),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_space,
            action: Action::ToggleFloating,
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_0,
            action: Action::View(!0),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_0,
            action: Action::Tag(!0),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_comma,
            action: Action::FocusMon(-1),
        },
        KeyBinding {
            mask: MODKEY,
            keysym: keysym::XK_period,
            action: Action::FocusMon(1),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_comma,
            action: Action::TagMon(-1),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_period,
            action: Action::TagMon(1),
        },
        KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: keysym::XK_q,
            action: Action::Quit,
        },
    ];

    const TAG_KEYS: [u32; 9] = [
        keysym::XK_1,
        keysym::XK_2,
        keysym::XK_3,
        keysym::XK_4,
        keysym::XK_5,
        keysym::XK_6,
        keysym::XK_7,
        keysym::XK_8,
        keysym::XK_9,
    ];

    for (i, &sym) in TAG_KEYS.iter().enumerate() {
        keys.push(KeyBinding {
            mask: MODKEY,
            keysym: sym,
            action: Action::View(1 << i),
        });
        keys.push(KeyBinding {
            mask: MODKEY | xlib::ControlMask,
            keysym: sym,
            action: Action::ToggleView(1 << i),
        });
        keys.push(KeyBinding {
            mask: MODKEY | xlib::ShiftMask,
            keysym: sym,
            action: Action::Tag(1 << i),
        });
        keys.push(KeyBinding {
            mask: MODKEY | xlib::ControlMask | xlib::ShiftMask,
            keysym: sym,
            action: Action::ToggleTag(1 << i),
        });
    }

    keys
}

/// Tag-region bindings with a zero mask receive the clicked cell's mask at
/// dispatch time.
pub fn buttons() -> Vec<ButtonBinding> {
    vec![
        ButtonBinding {
            click: ClickKind::LtSymbol,
            mask: 0,
            button: xlib::Button1,
            action: Action::SetLayout(None),
        },
        ButtonBinding {
            click: ClickKind::LtSymbol,
            mask: 0,
            button: xlib::Button3,
            action: Action::SetLayout(Some(&LAYOUTS[2])),
        },
        ButtonBinding {
            click: ClickKind::WinTitle,
            mask: 0,
            button: xlib::Button2,
            action: Action::Zoom,
        },
        ButtonBinding {
            click: ClickKind::StatusText,
            mask: 0,
            button: xlib::Button2,
            action: Action::Spawn(Command::Terminal),
        },
        ButtonBinding {
            click: ClickKind::ClientWin,
            mask: MODKEY,
            button: xlib::Button1,
            action: Action::MoveMouse,
        },
        ButtonBinding {
            click: ClickKind::ClientWin,
            mask: MODKEY,
            button: xlib::Button2,
            action: Action::ToggleFloating,
        },
        ButtonBinding {
            click: ClickKind::ClientWin,
            mask: MODKEY,
            button: xlib::Button3,
            action: Action::ResizeMouse,
        },
        ButtonBinding {
            click: ClickKind::TagBar,
            mask: 0,
            button: xlib::Button1,
            action: Action::View(0),
        },
        ButtonBinding {
            click: ClickKind::TagBar,
            mask: 0,
            button: xlib::Button3,
            action: Action::ToggleView(0),
        },
        ButtonBinding {
            click: ClickKind::TagBar,
            mask: MODKEY,
            button: xlib::Button1,
            action: Action::Tag(0),
        },
        ButtonBinding {
            click: ClickKind::TagBar,
            mask: MODKEY,
            button: xlib::Button3,
            action: Action::ToggleTag(0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_rules_match_as_substrings() {
        let rule = RULES.iter().find(|r| r.class == Some("Firefox")).unwrap();
        assert!(rule.matches("Firefox", "Navigator", "Mozilla Firefox"));
        assert!(rule.matches("Firefox-esr", "broken", "broken"));
        assert!(!rule.matches("Chromium", "chromium", "Chromium"));
        assert_eq!(rule.tags, 1 << 8);
        assert!(!rule.is_floating);
        assert_eq!(rule.monitor, -1);
    }

    #[test]
    fn missing_patterns_match_anything() {
        let rule = RULES.iter().find(|r| r.class == Some("Gimp")).unwrap();
        assert!(rule.matches("Gimp", "gimp", "GNU Image Manipulation Program"));
        assert!(rule.is_floating);
        assert_eq!(rule.tags, 0);
    }

    #[test]
    fn tag_mask_covers_exactly_the_configured_tags() {
        assert_eq!(TAG_MASK.count_ones() as usize, TAGS.len());
        assert_eq!(TAG_MASK, 0b1_1111_1111);
    }
}
