use std::env;
use std::ffi::CString;
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::process;

use lazy_static::lazy_static;
use simplelog::{Config, LevelFilter, WriteLogger};

mod actions;
mod bar;
mod client;
mod colour;
mod command;
mod config;
mod error;
mod events;
mod ivec2;
mod layouts;
mod monitor;
mod state;
mod utils;
mod xwrapper;

pub use actions::*;
pub use client::*;
pub use colour::*;
pub use command::*;
pub use error::*;
pub use ivec2::*;
pub use layouts::*;
pub use monitor::*;
pub use state::*;
pub use xwrapper::*;

lazy_static! {
    static ref DATA_PATH: PathBuf = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(env!("CARGO_PKG_NAME"));
    static ref LOG_PATH: PathBuf = DATA_PATH.join(concat!(env!("CARGO_PKG_NAME"), ".log"));
}

/// Panics must land in the log file: a crashing window manager has no
/// terminal left to print to.
fn setup_panic_hook() {
    let log_path = LOG_PATH.clone();
    panic::set_hook(Box::new(move |panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown payload".to_string()
        };
        let location = panic_info
            .location()
            .map(|l| format!(" at {}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| " at unknown location".to_string());
        let full_msg = format!("PANIC: {}{}", msg, location);

        eprintln!("{}", full_msg);
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&log_path) {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [ERROR] {}", timestamp, full_msg);
            let _ = file.flush();
        }
    }));
}

fn setup_logger() {
    if let Err(e) = create_dir_all(&*DATA_PATH) {
        eprintln!("tilemux: failed to create log directory: {}", e);
    }
    match File::create(&*LOG_PATH) {
        Ok(file) => {
            if WriteLogger::init(LevelFilter::Info, Config::default(), file).is_err() {
                eprintln!("tilemux: failed to initialize logger");
            }
        }
        Err(e) => eprintln!("tilemux: failed to create log file: {}", e),
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() == 2 && args[1] == "-v" {
        println!(concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION")));
        return;
    } else if args.len() != 1 {
        eprintln!("usage: {} [-v]", env!("CARGO_PKG_NAME"));
        process::exit(1);
    }

    setup_logger();
    setup_panic_hook();

    unsafe {
        let locale = CString::new("").unwrap();
        if libc::setlocale(libc::LC_CTYPE, locale.as_ptr()).is_null() {
            eprintln!("warning: no locale support");
        }
    }

    if let Err(e) = utils::install_sigchld() {
        utils::die(&e.to_string());
    }

    match Tilemux::new() {
        Ok(mut wm) => {
            if !wm.xwrapper.supports_locale() {
                eprintln!("warning: no locale support");
            }
            log::info!("starting, log file at {:?}", &*LOG_PATH);
            wm.scan();
            wm.run();
            log::info!("shutting down");
        }
        Err(e) => utils::die(&e.to_string()),
    }
}
