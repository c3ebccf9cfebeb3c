use anyhow::{Context, Result};

use crate::pins::{PinList, PinManager};
use crate::store::KeyValueStore;

pub mod pins;
pub mod services;

pub(crate) fn list_at<S: KeyValueStore>(
    manager: &mut PinManager<S>,
    index: usize,
) -> Result<&mut PinList> {
    let count = manager.lists().len();
    manager
        .list_mut(index)
        .with_context(|| format!("No service at index {index} ({count} configured)"))
}
