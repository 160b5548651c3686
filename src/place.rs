//! Hard-link placement into the destination tree

use crate::error::{Error, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// How a placement ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// A new link was created
    Linked,
    /// Something already existed at the destination
    AlreadyLinked,
}

/// Result of a successful placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Link path relative to the destination root
    pub link: PathBuf,
    pub outcome: LinkOutcome,
}

/// Hard-link `source` to `dest_root/relative_dir/filename`
///
/// Missing directories are created. An existing entry at the destination is
/// taken as the correct placement and reported as [`LinkOutcome::AlreadyLinked`];
/// its content is not compared.
pub fn place(source: &Path, dest_root: &Path, relative_dir: &Path, filename: &str) -> Result<Placement> {
    let dir = dest_root.join(relative_dir);
    fs::create_dir_all(&dir).map_err(|e| Error::Placement {
        path: dir.clone(),
        source: e,
    })?;

    let target = dir.join(filename);
    let link = relative_dir.join(filename);

    match fs::hard_link(source, &target) {
        Ok(()) => {
            trace!(?source, ?target, "Created hard link");
            Ok(Placement {
                link,
                outcome: LinkOutcome::Linked,
            })
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            trace!(?source, ?target, "Destination already exists");
            Ok(Placement {
                link,
                outcome: LinkOutcome::AlreadyLinked,
            })
        }
        Err(e) => Err(Error::Placement {
            path: target,
            source: e,
        }),
    }
}
