//! Exit code constants for the exforge CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, malformed request)
//! - 2: Configuration error (malformed records, unreadable source, invalid graph)
//! - 3: Template validation failure
//! - 4: Unknown taxonomy entry or template
//! - 5: Exercise resolution failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or malformed request.
pub const USER_ERROR: i32 = 1;

/// Configuration could not be loaded or is inconsistent.
pub const CONFIG_ERROR: i32 = 2;

/// Required template parameters are missing.
pub const VALIDATION_FAILURE: i32 = 3;

/// A referenced definition or template does not exist.
pub const NOT_FOUND: i32 = 4;

/// An exercise bundle could not be materialized.
pub const RESOLUTION_FAILURE: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            CONFIG_ERROR,
            VALIDATION_FAILURE,
            NOT_FOUND,
            RESOLUTION_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }
}
