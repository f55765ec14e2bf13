//! Dynamic list (array) API: an opaque, growable `void*` vector, allocated
//! on the C heap so it can be freed with the same `vyl_list_free` from any
//! compiled Vyl frame that holds the handle.

use std::os::raw::{c_long, c_void};

#[repr(C)]
struct VylList {
    items: *mut *mut c_void,
    len: usize,
    cap: usize,
}

const INITIAL_CAP: usize = 8;

unsafe fn alloc_items(cap: usize) -> *mut *mut c_void {
    unsafe { libc::malloc(cap * std::mem::size_of::<*mut c_void>()) as *mut *mut c_void }
}

/// Allocates a new, empty list.
///
/// # Safety
/// No preconditions; always safe to call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_list_new() -> *mut c_void {
    unsafe {
        let items = alloc_items(INITIAL_CAP);
        let list = libc::malloc(std::mem::size_of::<VylList>()) as *mut VylList;
        if list.is_null() || items.is_null() {
            return std::ptr::null_mut();
        }
        (*list).items = items;
        (*list).len = 0;
        (*list).cap = INITIAL_CAP;
        list as *mut c_void
    }
}

/// Appends `item` to the end of `list`, growing its backing storage
/// (doubling capacity) if necessary.
///
/// # Safety
/// `list` must be a non-null pointer returned by [`vyl_list_new`] and not
/// yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_list_append(list: *mut c_void, item: *mut c_void) {
    if list.is_null() {
        return;
    }
    unsafe {
        let list = list as *mut VylList;
        if (*list).len == (*list).cap {
            let new_cap = (*list).cap * 2;
            let new_items = alloc_items(new_cap);
            if new_items.is_null() {
                return;
            }
            std::ptr::copy_nonoverlapping((*list).items, new_items, (*list).len);
            libc::free((*list).items as *mut c_void);
            (*list).items = new_items;
            (*list).cap = new_cap;
        }
        *(*list).items.add((*list).len) = item;
        (*list).len += 1;
    }
}

/// Returns the number of elements in `list`, or 0 if `list` is null.
///
/// # Safety
/// `list` must be a non-null pointer returned by [`vyl_list_new`], or null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_list_len(list: *mut c_void) -> c_long {
    if list.is_null() {
        return 0;
    }
    unsafe { (*(list as *mut VylList)).len as c_long }
}

/// Returns the element at `index`, or null if `index` is out of bounds.
///
/// # Safety
/// `list` must be a non-null pointer returned by [`vyl_list_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_list_get(list: *mut c_void, index: c_long) -> *mut c_void {
    if list.is_null() || index < 0 {
        return std::ptr::null_mut();
    }
    unsafe {
        let list = list as *mut VylList;
        let index = index as usize;
        if index >= (*list).len {
            return std::ptr::null_mut();
        }
        *(*list).items.add(index)
    }
}

/// Overwrites the element at `index`, if in bounds.
///
/// # Safety
/// `list` must be a non-null pointer returned by [`vyl_list_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_list_set(list: *mut c_void, index: c_long, item: *mut c_void) {
    if list.is_null() || index < 0 {
        return;
    }
    unsafe {
        let list = list as *mut VylList;
        let index = index as usize;
        if index < (*list).len {
            *(*list).items.add(index) = item;
        }
    }
}

/// Frees `list`'s backing storage and the list header. Does not free the
/// stored items themselves; ownership of element pointers stays with the
/// caller.
///
/// # Safety
/// `list` must be a non-null pointer returned by [`vyl_list_new`] and not
/// yet freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_list_free(list: *mut c_void) {
    if list.is_null() {
        return;
    }
    unsafe {
        let list_ptr = list as *mut VylList;
        libc::free((*list_ptr).items as *mut c_void);
        libc::free(list);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_get_round_trip() {
        let list = unsafe { vyl_list_new() };
        let a = 1 as *mut c_void;
        let b = 2 as *mut c_void;
        unsafe {
            vyl_list_append(list, a);
            vyl_list_append(list, b);
        }
        assert_eq!(unsafe { vyl_list_len(list) }, 2);
        assert_eq!(unsafe { vyl_list_get(list, 0) }, a);
        assert_eq!(unsafe { vyl_list_get(list, 1) }, b);
        assert!(unsafe { vyl_list_get(list, 5) }.is_null());
        unsafe { vyl_list_free(list) };
    }

    #[test]
    fn grows_past_initial_capacity() {
        let list = unsafe { vyl_list_new() };
        for i in 0..64 {
            unsafe { vyl_list_append(list, (i + 1) as *mut c_void) };
        }
        assert_eq!(unsafe { vyl_list_len(list) }, 64);
        for i in 0..64 {
            assert_eq!(unsafe { vyl_list_get(list, i) }, (i + 1) as *mut c_void);
        }
        unsafe { vyl_list_free(list) };
    }

    #[test]
    fn set_overwrites_in_place() {
        let list = unsafe { vyl_list_new() };
        unsafe {
            vyl_list_append(list, 1 as *mut c_void);
            vyl_list_set(list, 0, 99 as *mut c_void);
        }
        assert_eq!(unsafe { vyl_list_get(list, 0) }, 99 as *mut c_void);
        unsafe { vyl_list_free(list) };
    }
}
