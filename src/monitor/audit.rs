//! File audit monitor: content hashes before and after a run

use super::{patterns, FileMonitor};
use blake3::Hasher;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Compute the hash of a single file.
pub fn compute_file_hash(path: &Path) -> io::Result<String> {
    let mut hasher = Hasher::new();
    let mut file = File::open(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Differences between the snapshot taken at attach time and now
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditChanges {
    pub created: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

impl AuditChanges {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Observes the files matching a set of glob patterns
///
/// On attach the matching files are hashed. At report time they are hashed
/// again and the created, modified and removed files are listed.
#[derive(Debug, Clone)]
pub struct FileAudit {
    patterns: Vec<String>,
    baseline: BTreeMap<PathBuf, String>,
}

impl FileAudit {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            baseline: BTreeMap::new(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    fn snapshot(&self) -> BTreeMap<PathBuf, String> {
        let mut hashes = BTreeMap::new();

        for pattern in &self.patterns {
            let paths = match patterns::expand(pattern) {
                Ok(paths) => paths,
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "skipping invalid audit pattern");
                    continue;
                }
            };

            for path in paths.into_iter().filter(|p| p.is_file()) {
                match compute_file_hash(&path) {
                    Ok(hash) => {
                        debug!(path = %path.display(), hash = %hash, "audited file");
                        hashes.insert(path, hash);
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "could not hash file"),
                }
            }
        }

        hashes
    }

    /// Compare the current state of the audited files with the baseline
    pub fn changes(&self) -> AuditChanges {
        let current = self.snapshot();
        let mut changes = AuditChanges::default();

        for (path, hash) in &current {
            match self.baseline.get(path) {
                None => changes.created.push(path.clone()),
                Some(before) if before != hash => changes.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        changes.removed = self
            .baseline
            .keys()
            .filter(|path| !current.contains_key(*path))
            .cloned()
            .collect();

        changes
    }
}

impl FileMonitor for FileAudit {
    fn attach(&mut self, run_name: &str) {
        self.baseline = self.snapshot();
        info!(
            run = %run_name,
            files = self.baseline.len(),
            "file audit attached"
        );
    }

    fn report(&self, out: &mut dyn Write) -> io::Result<()> {
        let changes = self.changes();

        writeln!(out, "| File audit ({} pattern(s))", self.patterns.len())?;
        if changes.is_empty() {
            writeln!(out, "|   no changes")?;
            return Ok(());
        }
        for path in &changes.created {
            writeln!(out, "|   created  {}", path.display())?;
        }
        for path in &changes.modified {
            writeln!(out, "|   modified {}", path.display())?;
        }
        for path in &changes.removed {
            writeln!(out, "|   removed  {}", path.display())?;
        }
        Ok(())
    }
}
