/// Returns an identifier of the calling thread.
#[inline]
pub fn id() -> usize {
    __get_id()
}

/// Returns the current process id.
#[inline]
pub fn pid() -> u32 {
    __get_pid()
}

#[cfg(unix)]
#[inline]
fn __get_id() -> usize {
    unsafe {
        libc::pthread_self() as usize
    }
}

#[cfg(unix)]
#[inline]
fn __get_pid() -> u32 {
    unsafe {
        libc::getpid() as u32
    }
}

#[cfg(not(unix))]
#[inline]
fn __get_id() -> usize {
    0
}

#[cfg(not(unix))]
#[inline]
fn __get_pid() -> u32 {
    ::std::process::id()
}
