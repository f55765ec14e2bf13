//! Hash map (dictionary) API: string keys, separate chaining over a
//! fixed bucket table, djb2 hashing. Each entry carries a [`VylValueType`]
//! tag (written by `vyl_dict_set_typed` and defaulted by the narrower
//! `set`/`set_string`/`set_int` entry points) so `vyl_dict_get_type` can
//! report what's stored without the caller tracking it out of band.

use std::ffi::CStr;
use std::os::raw::{c_char, c_long, c_void};
use std::ptr;

use crate::VylValueType;

const BUCKET_COUNT: usize = 16;

struct Entry {
    key: String,
    value: *mut c_void,
    ty: VylValueType,
    next: *mut Entry,
}

struct VylDict {
    buckets: [*mut Entry; BUCKET_COUNT],
}

fn djb2(key: &str) -> usize {
    let mut hash: u64 = 5381;
    for byte in key.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    (hash as usize) % BUCKET_COUNT
}

unsafe fn borrow_key<'a>(key: *const c_char) -> &'a str {
    if key.is_null() {
        return "";
    }
    unsafe { CStr::from_ptr(key) }.to_str().unwrap_or("")
}

/// Allocates a new, empty dictionary.
///
/// # Safety
/// No preconditions; always safe to call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_dict_new() -> *mut c_void {
    let dict = Box::new(VylDict {
        buckets: [ptr::null_mut(); BUCKET_COUNT],
    });
    Box::into_raw(dict) as *mut c_void
}

unsafe fn set_entry(dict: *mut c_void, key: &str, value: *mut c_void, ty: VylValueType) {
    if dict.is_null() {
        return;
    }
    unsafe {
        let dict = dict as *mut VylDict;
        let bucket = djb2(key);
        let mut cur = (*dict).buckets[bucket];
        while !cur.is_null() {
            if (*cur).key == key {
                (*cur).value = value;
                (*cur).ty = ty;
                return;
            }
            cur = (*cur).next;
        }
        let entry = Box::new(Entry {
            key: key.to_string(),
            value,
            ty,
            next: (*dict).buckets[bucket],
        });
        (*dict).buckets[bucket] = Box::into_raw(entry);
    }
}

/// Inserts or updates `key` with a raw pointer `value`, tagged
/// [`VylValueType::Ptr`].
///
/// # Safety
/// `dict` must be a non-null pointer returned by [`vyl_dict_new`]. `key`
/// must be a valid nul-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_dict_set(dict: *mut c_void, key: *const c_char, value: *mut c_void) {
    unsafe { set_entry(dict, borrow_key(key), value, VylValueType::Ptr) };
}

/// Inserts or updates `key` with a string value (stored as the raw pointer
/// itself; ownership stays with the caller), tagged [`VylValueType::Str`].
///
/// # Safety
/// `dict` must be a non-null pointer returned by [`vyl_dict_new`]. `key`
/// and `value` must be valid nul-terminated C strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_dict_set_string(
    dict: *mut c_void,
    key: *const c_char,
    value: *const c_char,
) {
    unsafe { set_entry(dict, borrow_key(key), value as *mut c_void, VylValueType::Str) };
}

/// Inserts or updates `key` with an integer value, tagged
/// [`VylValueType::Int`]. The integer is stored directly in the pointer
/// slot (sign-extended), not boxed.
///
/// # Safety
/// `dict` must be a non-null pointer returned by [`vyl_dict_new`]. `key`
/// must be a valid nul-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_dict_set_int(dict: *mut c_void, key: *const c_char, value: c_long) {
    unsafe { set_entry(dict, borrow_key(key), value as *mut c_void, VylValueType::Int) };
}

/// Inserts or updates `key` with `value`, tagged explicitly with `ty`.
///
/// # Safety
/// `dict` must be a non-null pointer returned by [`vyl_dict_new`]. `key`
/// must be a valid nul-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_dict_set_typed(
    dict: *mut c_void,
    key: *const c_char,
    value: *mut c_void,
    ty: VylValueType,
) {
    unsafe { set_entry(dict, borrow_key(key), value, ty) };
}

/// Looks up `key`, returning its stored pointer value or null if absent.
///
/// # Safety
/// `dict` must be a non-null pointer returned by [`vyl_dict_new`], or null.
/// `key` must be a valid nul-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_dict_get(dict: *mut c_void, key: *const c_char) -> *mut c_void {
    if dict.is_null() {
        return ptr::null_mut();
    }
    unsafe {
        let key = borrow_key(key);
        let dict = dict as *mut VylDict;
        let mut cur = (*dict).buckets[djb2(key)];
        while !cur.is_null() {
            if (*cur).key == key {
                return (*cur).value;
            }
            cur = (*cur).next;
        }
        ptr::null_mut()
    }
}

/// Looks up the type tag stored for `key`. Returns [`VylValueType::Ptr`]
/// for an absent key (the same tag a bare [`vyl_dict_set`] would use, since
/// there is no dedicated "absent" tag in the original enum).
///
/// # Safety
/// `dict` must be a non-null pointer returned by [`vyl_dict_new`], or null.
/// `key` must be a valid nul-terminated C string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_dict_get_type(dict: *mut c_void, key: *const c_char) -> VylValueType {
    if dict.is_null() {
        return VylValueType::Ptr;
    }
    unsafe {
        let key = borrow_key(key);
        let dict = dict as *mut VylDict;
        let mut cur = (*dict).buckets[djb2(key)];
        while !cur.is_null() {
            if (*cur).key == key {
                return (*cur).ty;
            }
            cur = (*cur).next;
        }
        VylValueType::Ptr
    }
}

/// Frees every entry and the dictionary header. Does not free any pointer
/// or string values stored in the dictionary; ownership of those stays
/// with the caller.
///
/// # Safety
/// `dict` must be a non-null pointer returned by [`vyl_dict_new`] and not
/// yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_dict_free(dict: *mut c_void) {
    if dict.is_null() {
        return;
    }
    unsafe {
        let dict_box = Box::from_raw(dict as *mut VylDict);
        for bucket in dict_box.buckets {
            let mut cur = bucket;
            while !cur.is_null() {
                let entry = Box::from_raw(cur);
                cur = entry.next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn set_and_get_int_round_trip() {
        let dict = unsafe { vyl_dict_new() };
        let key = CString::new("count").unwrap();
        unsafe { vyl_dict_set_int(dict, key.as_ptr(), 42) };
        assert_eq!(unsafe { vyl_dict_get(dict, key.as_ptr()) } as c_long, 42);
        assert_eq!(
            unsafe { vyl_dict_get_type(dict, key.as_ptr()) },
            VylValueType::Int
        );
        unsafe { vyl_dict_free(dict) };
    }

    #[test]
    fn overwriting_a_key_replaces_value_and_type() {
        let dict = unsafe { vyl_dict_new() };
        let key = CString::new("x").unwrap();
        unsafe {
            vyl_dict_set_int(dict, key.as_ptr(), 1);
            vyl_dict_set_int(dict, key.as_ptr(), 2);
        }
        assert_eq!(unsafe { vyl_dict_get(dict, key.as_ptr()) } as c_long, 2);
        unsafe { vyl_dict_free(dict) };
    }

    #[test]
    fn missing_key_returns_null() {
        let dict = unsafe { vyl_dict_new() };
        let key = CString::new("missing").unwrap();
        assert!(unsafe { vyl_dict_get(dict, key.as_ptr()) }.is_null());
        unsafe { vyl_dict_free(dict) };
    }

    #[test]
    fn colliding_keys_chain_correctly() {
        let dict = unsafe { vyl_dict_new() };
        // Insert enough keys that some land in the same bucket.
        let keys: Vec<CString> = (0..40).map(|i| CString::new(format!("k{i}")).unwrap()).collect();
        for (i, key) in keys.iter().enumerate() {
            unsafe { vyl_dict_set_int(dict, key.as_ptr(), i as c_long) };
        }
        for (i, key) in keys.iter().enumerate() {
            assert_eq!(unsafe { vyl_dict_get(dict, key.as_ptr()) } as c_long, i as c_long);
        }
        unsafe { vyl_dict_free(dict) };
    }
}
