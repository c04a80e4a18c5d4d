use std::fmt;

#[derive(Debug)]
pub enum TilemuxError {
    DisplayOpen,
    NoFonts,
    OtherWm,
    Sigchld(String),
}

impl fmt::Display for TilemuxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TilemuxError::DisplayOpen => write!(f, "cannot open display"),
            TilemuxError::NoFonts => write!(f, "no fonts could be loaded"),
            TilemuxError::OtherWm => {
                write!(f, "another window manager is already running")
            }
            TilemuxError::Sigchld(e) => {
                write!(f, "can't install SIGCHLD handler: {}", e)
            }
        }
    }
}

impl std::error::Error for TilemuxError {}
