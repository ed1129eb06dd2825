//! Mapping of OS and network error codes to HTTP-equivalent statuses.
//!
//! Connectivity faults (refused, reset, timed out) map to 500 so the
//! scheduler retries them. Filesystem and client-side faults map to 400.
//! Unknown codes fall back to 400 with the bare code as message.

use serde::Serialize;

/// HTTP-equivalent status and message for a system error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemErrorStatus {
    /// HTTP-equivalent status.
    pub status: u16,
    /// Message embedding the original code.
    pub message: String,
}

const SYSTEM_ERRORS: &[(&str, u16, &str)] = &[
    ("EACCES", 400, "Permission denied"),
    ("EADDRINUSE", 400, "Address already in use"),
    ("ECONNREFUSED", 500, "Connection refused"),
    ("ECONNRESET", 500, "Connection reset by peer"),
    ("EEXIST", 400, "File exists"),
    ("EISDIR", 400, "Is a directory"),
    ("EMFILE", 400, "Too many open files in system"),
    ("ENOENT", 400, "No such file or directory"),
    ("ENOTDIR", 400, "Not a directory"),
    ("ENOTEMPTY", 400, "Directory not empty"),
    ("ENOTFOUND", 400, "DNS lookup failed"),
    ("EPERM", 400, "Operation not permitted"),
    ("EPIPE", 400, "Broken pipe"),
    ("ETIMEDOUT", 500, "Operation timed out"),
];

/// Maps a system error code to its HTTP-equivalent status.
///
/// Total over all inputs: codes absent from the table yield
/// `{status: 400, message: "[<code>]"}`.
pub fn map_system_error(code: &str) -> SystemErrorStatus {
    SYSTEM_ERRORS
        .iter()
        .find(|(known, _, _)| *known == code)
        .map_or_else(
            || SystemErrorStatus { status: 400, message: format!("[{code}]") },
            |(known, status, description)| SystemErrorStatus {
                status: *status,
                message: format!("[{known}] :: {description}"),
            },
        )
}
