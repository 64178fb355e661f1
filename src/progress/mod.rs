//! Activity indication for the CLI
//!
//! Shows a spinner while gateway calls are in flight and a coloured
//! outcome line when they finish.

mod indicator;

pub use indicator::*;
