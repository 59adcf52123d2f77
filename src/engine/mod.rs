//! The tick pipeline: diff computation, undercut pricing, and the
//! monitor that runs one fetch→diff→notify→update→record pass.

pub mod diff;
pub mod monitor;
pub mod pricing;
