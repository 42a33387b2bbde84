//! Passive file-system observers attached to a run

pub mod audit;
pub mod patterns;

pub use audit::{AuditChanges, FileAudit};

use std::io::{self, Write};

/// Observer attached to a run when its scope is entered
///
/// The run calls `attach` once on entry and `report` once while writing its
/// end-of-run report. Monitors never influence the run's outcome.
pub trait FileMonitor {
    fn attach(&mut self, run_name: &str);

    /// Append this monitor's section to the run report
    fn report(&self, out: &mut dyn Write) -> io::Result<()>;
}
