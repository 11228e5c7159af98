use std::time::{SystemTime, UNIX_EPOCH};

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Returns the current time in the format YYYY-MM-DD HH:MM:SS TZ
#[cfg(target_family = "unix")]
pub fn now() -> String {
    let secs = unix_seconds() as libc::time_t;
    let mut tm: libc::tm = unsafe { std::mem::zeroed() };
    let mut buf = [0 as libc::c_char; 100];

    // SAFETY: `tm` and `buf` are live locals, the format is NUL-terminated and
    // strftime never writes past `buf.len()`.
    let written = unsafe {
        if libc::localtime_r(&secs, &mut tm).is_null() {
            return format!("@{}", secs);
        }
        libc::strftime(
            buf.as_mut_ptr(),
            buf.len(),
            c"%Y-%m-%d %H:%M:%S %Z".as_ptr(),
            &tm,
        )
    };

    let bytes: Vec<u8> = buf[..written].iter().map(|&c| c as u8).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Seconds since the epoch; local time needs libc.
#[cfg(not(target_family = "unix"))]
pub fn now() -> String {
    format!("@{} UTC", unix_seconds())
}
