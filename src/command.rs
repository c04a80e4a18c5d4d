/// Shell command templates bound to keys and buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Dmenu,
    Terminal,
}

impl Command {
    pub fn str(&self) -> &'static str {
        match self {
            Command::Dmenu => {
                "dmenu_run -fn 'monospace:size=10' -nb '#222222' -nf '#bbbbbb' -sb '#005577' -sf '#eeeeee'"
            }
            Command::Terminal => "st",
        }
    }
}
