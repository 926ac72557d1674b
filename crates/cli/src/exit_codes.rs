//! CLI Exit Code Registry
//!
//! Single source of truth for `njgeo` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | CLI usage error (bad args, unknown table)            |
//! | 3    | Invalid config                                       |
//! | 4    | Runtime failure (unreadable input, failed download)  |
//! | 5    | Unmatched records with `--fail-on-unmatched`         |
//! | 6    | No boundary source available                         |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// Runtime error: reference table unreadable, duplicate reference key,
/// output not writable, download or extraction failure.
pub const EXIT_RUNTIME: u8 = 4;

/// Reconciliation left unmatched boundaries or in-region reference rows
/// and `--fail-on-unmatched` was given.
pub const EXIT_UNMATCHED: u8 = 5;

/// Every provider of the boundary chain failed.
pub const EXIT_NO_SOURCE: u8 = 6;
