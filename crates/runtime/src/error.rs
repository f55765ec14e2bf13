//! Panic and error-reporting helpers called directly by generated code's
//! bounds checks and explicit `Exit`/error-signaling calls.

use std::ffi::CStr;
use std::os::raw::c_char;

/// Prints `Runtime Error: <msg>` to stderr and terminates the process with
/// status 1. Used by the generator's array bounds checks.
///
/// # Safety
/// `msg` must be a valid, nul-terminated C string pointer, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_panic(msg: *const c_char) -> ! {
    if msg.is_null() {
        eprintln!("Runtime Error");
    } else {
        let text = unsafe { CStr::from_ptr(msg) }.to_string_lossy();
        eprint!("Runtime Error: {text}");
        if !text.ends_with('\n') {
            eprintln!();
        }
    }
    std::process::exit(1);
}

/// Prints `Error [<code>]: <msg>` to stderr and terminates with `code`.
///
/// # Safety
/// `msg` must be a valid, nul-terminated C string pointer, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_error(msg: *const c_char, code: i32) -> ! {
    if msg.is_null() {
        eprintln!("Error [{code}]");
    } else {
        let text = unsafe { CStr::from_ptr(msg) }.to_string_lossy();
        eprintln!("Error [{code}]: {text}");
    }
    std::process::exit(code);
}
