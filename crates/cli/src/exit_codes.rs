//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: CI jobs gate on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | compare/quality  | Comparison outcome and input failures    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing input file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Compare / quality (3-9)
// =============================================================================

/// Report produced, but it needs attention (only with `--fail-on-discrepancy`).
pub const EXIT_DISCREPANCIES: u8 = 3;

/// A workbook could not be opened or decoded, or a required sheet is absent.
pub const EXIT_DECODE: u8 = 4;

/// Config file unreadable, malformed, or failing validation.
pub const EXIT_CONFIG: u8 = 5;

/// Report or export file could not be written.
pub const EXIT_WRITE: u8 = 6;
