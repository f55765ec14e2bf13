//! Generic allocation helpers shared across the other builtins. `new`
//! expressions and most of the string/list/dict constructors hand back
//! plain `malloc`'d pointers, so one release path covers all of them.

use std::os::raw::c_void;

/// Frees a pointer previously returned by `malloc` (directly, via `new`, or
/// via any of the other builtins that allocate with the C allocator). A
/// null pointer is a no-op.
///
/// # Safety
/// `p` must be either null or a pointer previously obtained from `malloc`
/// (including transitively, via these runtime entry points) and not yet
/// freed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_free_ptr(p: *mut c_void) {
    if !p.is_null() {
        unsafe { libc::free(p) };
    }
}

/// Reports the length of a generic array pointer. The generator resolves
/// `ArrayLen` at compile time for any array whose declared size it knows;
/// this entry point only exists for the fallback case of a pointer whose
/// size is not statically known, where it always returns -1 (matching the
/// original: there is no length header on a bare `malloc`'d buffer to
/// recover it from).
///
/// # Safety
/// No preconditions; `arr` is never dereferenced.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn vyl_array_len(_arr: *mut c_void) -> i64 {
    -1
}
