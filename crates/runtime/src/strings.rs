//! String operations and int/decimal <-> string conversions. All returned
//! buffers are malloc'd so `Free`/`vyl_free_ptr` on the Vyl side can release
//! them with the same allocator the generator's other `malloc@plt` calls
//! use for struct instances.

use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_int, c_long, c_void};
use std::ptr;

unsafe fn to_malloc_cstring(s: &str) -> *mut c_char {
    unsafe {
        let buf = libc::malloc(s.len() + 1) as *mut u8;
        if buf.is_null() {
            return ptr::null_mut();
        }
        ptr::copy_nonoverlapping(s.as_ptr(), buf, s.len());
        *buf.add(s.len()) = 0;
        buf as *mut c_char
    }
}

unsafe fn borrow_str<'a>(s: *const c_char) -> &'a str {
    if s.is_null() {
        return "";
    }
    unsafe { CStr::from_ptr(s) }.to_str().unwrap_or("")
}

/// Splits `str` on every occurrence of `delim`, returning a malloc'd,
/// null-terminated array of malloc'd strings.
///
/// # Safety
/// `str` and `delim` must be valid nul-terminated C strings, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_stringsplit(str: *const c_char, delim: *const c_char) -> *mut *mut c_char {
    if str.is_null() || delim.is_null() {
        return ptr::null_mut();
    }
    let (s, d) = unsafe { (borrow_str(str), borrow_str(delim)) };
    let parts: Vec<&str> = if d.is_empty() {
        vec![s]
    } else {
        s.split(d).collect()
    };

    unsafe {
        let array = libc::malloc((parts.len() + 1) * std::mem::size_of::<*mut c_char>()) as *mut *mut c_char;
        if array.is_null() {
            return ptr::null_mut();
        }
        for (i, part) in parts.iter().enumerate() {
            *array.add(i) = to_malloc_cstring(part);
        }
        *array.add(parts.len()) = ptr::null_mut();
        array
    }
}

/// Frees every string in a null-terminated array produced by
/// [`vyl_stringsplit`], then the array itself.
///
/// # Safety
/// `arr` must be null, or a null-terminated array of malloc'd `char*`
/// previously returned by [`vyl_stringsplit`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_free_string_array(arr: *mut *mut c_char) {
    if arr.is_null() {
        return;
    }
    unsafe {
        let mut i = 0;
        loop {
            let entry = *arr.add(i);
            if entry.is_null() {
                break;
            }
            libc::free(entry as *mut c_void);
            i += 1;
        }
        libc::free(arr as *mut c_void);
    }
}

/// Concatenates `a` and `b` into a fresh malloc'd string. A null operand is
/// treated as empty, matching the C implementation.
///
/// # Safety
/// `a` and `b` must be valid nul-terminated C strings, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_string_concat(a: *const c_char, b: *const c_char) -> *mut c_char {
    let (a, b) = unsafe { (borrow_str(a), borrow_str(b)) };
    let mut combined = String::with_capacity(a.len() + b.len());
    combined.push_str(a);
    combined.push_str(b);
    unsafe { to_malloc_cstring(&combined) }
}

/// Returns the malloc'd substring of `s` starting at byte offset `start`
/// and running for at most `len` bytes, clamped to `s`'s bounds. A
/// negative or past-the-end `start` yields an empty string rather than
/// panicking, matching the runtime's convention of reporting malformed
/// input through empty results instead of undefined behavior.
///
/// # Safety
/// `s` must be a valid nul-terminated C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_substring(
    s: *const c_char,
    start: c_long,
    len: c_long,
) -> *mut c_char {
    let bytes = if s.is_null() {
        &[][..]
    } else {
        unsafe { CStr::from_ptr(s) }.to_bytes()
    };
    if start < 0 || len < 0 || start as usize >= bytes.len() {
        return unsafe { to_malloc_cstring("") };
    }
    let start = start as usize;
    let end = start.saturating_add(len as usize).min(bytes.len());
    unsafe { to_malloc_cstring(&String::from_utf8_lossy(&bytes[start..end])) }
}

/// Parses a (possibly partial) leading integer out of `s`, returning 0 on
/// failure, matching `strtol`'s lenient prefix parsing.
///
/// # Safety
/// `s` must be a valid nul-terminated C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_to_int(s: *const c_char) -> c_int {
    let text = unsafe { borrow_str(s) }.trim_start();
    let digits: String = text
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+')))
        .map(|(_, c)| c)
        .collect();
    digits.parse::<i64>().unwrap_or(0) as c_int
}

/// Parses a (possibly partial) leading floating-point number out of `s`,
/// returning 0.0 on failure.
///
/// # Safety
/// `s` must be a valid nul-terminated C string, or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_to_decimal(s: *const c_char) -> c_double {
    let text = unsafe { borrow_str(s) }.trim_start();
    let mut end = 0;
    let bytes = text.as_bytes();
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    text[..end].parse::<f64>().unwrap_or(0.0)
}

/// Formats `v` as a malloc'd decimal string.
///
/// # Safety
/// No preconditions; always safe to call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_to_string_int(v: c_long) -> *mut c_char {
    unsafe { to_malloc_cstring(&v.to_string()) }
}

/// Formats `v` with `%.6g`-equivalent precision (at most 6 significant
/// digits, trailing zeros trimmed) as a malloc'd string, matching the
/// format the generator's `Print` uses for decimals.
///
/// # Safety
/// No preconditions; always safe to call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_to_string_dec(v: c_double) -> *mut c_char {
    unsafe { to_malloc_cstring(&format_g6(v)) }
}

/// Renders `v` with 6 significant digits, trimming trailing zeros, falling
/// back to scientific notation outside printf's `%g` unscientific range.
fn format_g6(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    let abs = v.abs();
    if !(1e-4..1e6).contains(&abs) {
        return format!("{v:.5e}");
    }

    let whole_digits = if abs >= 1.0 {
        (abs.log10().floor() as i32) + 1
    } else {
        1
    };
    let decimals = (6 - whole_digits).clamp(0, 6) as usize;
    let mut s = format!("{v:.decimals$}");
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn to_cstring_ptr(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn concat_treats_null_as_empty() {
        let a = to_cstring_ptr("foo");
        let result = unsafe { vyl_string_concat(a.as_ptr(), ptr::null()) };
        let s = unsafe { borrow_str(result) }.to_string();
        assert_eq!(s, "foo");
        unsafe { libc::free(result as *mut c_void) };
    }

    #[test]
    fn stringsplit_round_trips_through_free() {
        let s = to_cstring_ptr("a,b,c");
        let d = to_cstring_ptr(",");
        let arr = unsafe { vyl_stringsplit(s.as_ptr(), d.as_ptr()) };
        assert!(!arr.is_null());
        let first = unsafe { borrow_str(*arr) };
        assert_eq!(first, "a");
        unsafe { vyl_free_string_array(arr) };
    }

    #[test]
    fn to_int_parses_leading_digits() {
        let s = to_cstring_ptr("42abc");
        assert_eq!(unsafe { vyl_to_int(s.as_ptr()) }, 42);
    }

    #[test]
    fn to_int_on_garbage_is_zero() {
        let s = to_cstring_ptr("not a number");
        assert_eq!(unsafe { vyl_to_int(s.as_ptr()) }, 0);
    }

    #[test]
    fn substring_extracts_the_requested_byte_range() {
        let s = to_cstring_ptr("hello world");
        let result = unsafe { vyl_substring(s.as_ptr(), 6, 5) };
        let extracted = unsafe { borrow_str(result) }.to_string();
        assert_eq!(extracted, "world");
        unsafe { libc::free(result as *mut c_void) };
    }

    #[test]
    fn substring_clamps_a_length_past_the_end() {
        let s = to_cstring_ptr("hi");
        let result = unsafe { vyl_substring(s.as_ptr(), 0, 100) };
        let extracted = unsafe { borrow_str(result) }.to_string();
        assert_eq!(extracted, "hi");
        unsafe { libc::free(result as *mut c_void) };
    }

    #[test]
    fn substring_with_out_of_range_start_is_empty() {
        let s = to_cstring_ptr("hi");
        let result = unsafe { vyl_substring(s.as_ptr(), 50, 1) };
        let extracted = unsafe { borrow_str(result) }.to_string();
        assert_eq!(extracted, "");
        unsafe { libc::free(result as *mut c_void) };
    }

    #[test]
    fn to_string_int_and_back() {
        let rendered = unsafe { vyl_to_string_int(1234) };
        let s = unsafe { borrow_str(rendered) };
        assert_eq!(s, "1234");
        unsafe { libc::free(rendered as *mut c_void) };
    }
}
