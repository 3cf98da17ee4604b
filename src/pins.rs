//! GPIO pin assignments for the boiler node board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Boiler link (two-wire master/slave interface)
// ---------------------------------------------------------------------------

/// Digital input from the boiler interface; edges raise the link ISR.
pub const BOILER_LINK_IN_GPIO: i32 = 4;
/// Digital output to the boiler interface (idle HIGH).
pub const BOILER_LINK_OUT_GPIO: i32 = 5;
