//! Exit codes for the CLI

/// Success
pub const SUCCESS: i32 = 0;

/// Any reported error
pub const ERROR: i32 = 1;
