pub mod diff;
pub mod init;
pub mod status;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};

use roster_core::{config, CsvMasterList, RosterConfig};

/// Config plus the master list it points at.
pub(crate) fn load_workspace(home: &Path) -> Result<(RosterConfig, CsvMasterList)> {
    let config = config::load_at(home).context("failed to load roster config")?;
    let store = CsvMasterList::new(config.master_list_path(home));
    Ok((config, store))
}
