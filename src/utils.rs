use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr::null_mut;

use crate::command::Command;
use crate::error::TilemuxError;

pub fn die(msg: &str) -> ! {
    eprintln!("tilemux: {}", msg);
    std::process::exit(1);
}

/// Run a command template in a detached child. The child closes the X
/// connection file descriptor before exec so the spawned program never
/// holds the display open, and starts its own session so it survives us.
pub fn spawn(cmd: Command, display_fd: i32) {
    if unsafe { libc::fork() } == 0 {
        unsafe {
            if display_fd >= 0 {
                libc::close(display_fd);
            }
            libc::setsid();
            let shell = CString::new("/bin/sh").unwrap();
            let c_flag = CString::new("-c").unwrap();
            let cmd_str = CString::new(cmd.str()).unwrap();
            libc::execlp(
                shell.as_ptr(),
                shell.as_ptr(),
                c_flag.as_ptr(),
                cmd_str.as_ptr(),
                null_mut::<c_char>(),
            );
            // exec only returns on failure
            eprintln!("tilemux: execlp {} failed", cmd.str());
            libc::_exit(0);
        }
    }
}

unsafe extern "C" fn sigchld(_signum: libc::c_int) {
    while libc::waitpid(-1, null_mut(), libc::WNOHANG) > 0 {}
}

/// Install the child reaper once at startup; finished children are
/// collected with a non-blocking wait whenever SIGCHLD is delivered.
pub fn install_sigchld() -> Result<(), TilemuxError> {
    let handler = sigchld as unsafe extern "C" fn(libc::c_int);
    let previous = unsafe { libc::signal(libc::SIGCHLD, handler as libc::sighandler_t) };
    if previous == libc::SIG_ERR {
        return Err(TilemuxError::Sigchld(
            std::io::Error::last_os_error().to_string(),
        ));
    }
    // reap anything that died before the handler was in place
    unsafe { sigchld(0) };
    Ok(())
}
