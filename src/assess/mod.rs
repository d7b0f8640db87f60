//! Applicability warnings and evidence-strength summaries.

pub mod evidence;
pub mod warnings;

pub use evidence::roll_up;
