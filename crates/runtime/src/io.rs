//! File I/O builtins. Vyl programs open files through libc's `fopen` (the
//! generator calls it by name directly) and pass the resulting `FILE*`
//! straight through to these entry points, matching the original's
//! `vyl_read_file(FILE *f)`-style signatures rather than taking a path.

use std::os::raw::{c_char, c_long, c_void};
use std::ptr;

use libc::FILE;

/// Reads the entire remaining contents of `f` into a freshly malloc'd,
/// nul-terminated buffer, restoring the file's original position
/// afterward. Returns null if `f` is null or the read fails.
///
/// # Safety
/// `f` must be a valid `FILE*` opened by `fopen`, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_read_file(f: *mut FILE) -> *mut c_char {
    if f.is_null() {
        return ptr::null_mut();
    }
    unsafe {
        let pos = libc::ftell(f);
        libc::fseek(f, 0, libc::SEEK_END);
        let size = libc::ftell(f);
        libc::fseek(f, pos, libc::SEEK_SET);
        if size < 0 {
            return ptr::null_mut();
        }
        let size = size as usize;
        let buf = libc::malloc(size + 1) as *mut u8;
        if buf.is_null() {
            return ptr::null_mut();
        }
        let read = libc::fread(buf as *mut c_void, 1, size, f);
        *buf.add(read) = 0;
        buf as *mut c_char
    }
}

/// Reads a single line (up to and excluding `\n`, or EOF) from `f` into a
/// freshly malloc'd, nul-terminated buffer that grows as needed.
///
/// # Safety
/// `f` must be a valid `FILE*` opened by `fopen`, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_readline_file(f: *mut FILE) -> *mut c_char {
    if f.is_null() {
        return ptr::null_mut();
    }
    let mut line: Vec<u8> = Vec::with_capacity(128);
    unsafe {
        loop {
            let c = libc::fgetc(f);
            if c == -1 || c == b'\n' as i32 {
                break;
            }
            line.push(c as u8);
        }
        let buf = libc::malloc(line.len() + 1) as *mut u8;
        if buf.is_null() {
            return ptr::null_mut();
        }
        ptr::copy_nonoverlapping(line.as_ptr(), buf, line.len());
        *buf.add(line.len()) = 0;
        buf as *mut c_char
    }
}

/// Returns the size of `f` in bytes, or -1 if `f` is null.
///
/// # Safety
/// `f` must be a valid `FILE*` opened by `fopen`, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_filesize(f: *mut FILE) -> c_long {
    if f.is_null() {
        return -1;
    }
    unsafe {
        let pos = libc::ftell(f);
        libc::fseek(f, 0, libc::SEEK_END);
        let size = libc::ftell(f);
        libc::fseek(f, pos, libc::SEEK_SET);
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::{CStr, CString};
    use std::io::Write as _;

    fn fopen_temp(contents: &str) -> (tempfile::NamedTempFile, *mut FILE) {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(contents.as_bytes()).unwrap();
        tmp.flush().unwrap();
        let path = CString::new(tmp.path().to_str().unwrap()).unwrap();
        let mode = CString::new("r").unwrap();
        let f = unsafe { libc::fopen(path.as_ptr(), mode.as_ptr()) };
        (tmp, f)
    }

    #[test]
    fn read_file_returns_full_contents() {
        let (_tmp, f) = fopen_temp("hello\nworld");
        let result = unsafe { vyl_read_file(f) };
        let s = unsafe { CStr::from_ptr(result) }.to_str().unwrap();
        assert_eq!(s, "hello\nworld");
        unsafe {
            libc::free(result as *mut c_void);
            libc::fclose(f);
        }
    }

    #[test]
    fn readline_stops_at_newline() {
        let (_tmp, f) = fopen_temp("first\nsecond\n");
        let line1 = unsafe { vyl_readline_file(f) };
        assert_eq!(unsafe { CStr::from_ptr(line1) }.to_str().unwrap(), "first");
        let line2 = unsafe { vyl_readline_file(f) };
        assert_eq!(unsafe { CStr::from_ptr(line2) }.to_str().unwrap(), "second");
        unsafe {
            libc::free(line1 as *mut c_void);
            libc::free(line2 as *mut c_void);
            libc::fclose(f);
        }
    }

    #[test]
    fn filesize_matches_content_length() {
        let (_tmp, f) = fopen_temp("12345");
        assert_eq!(unsafe { vyl_filesize(f) }, 5);
        unsafe { libc::fclose(f) };
    }

    #[test]
    fn null_file_yields_safe_defaults() {
        assert!(unsafe { vyl_read_file(ptr::null_mut()) }.is_null());
        assert!(unsafe { vyl_readline_file(ptr::null_mut()) }.is_null());
        assert_eq!(unsafe { vyl_filesize(ptr::null_mut()) }, -1);
    }
}
