pub mod analyze;
pub mod common;
pub mod completions;
pub mod conflicts;
pub mod idea;
pub mod merge;
pub mod points;
pub mod recommend;
pub mod suggestion;
