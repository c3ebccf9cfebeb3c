use std::io::Write;

use anyhow::Result;
use tracing::warn;

use crate::cli::PinCommands;
use crate::ipfs::CreateOptions;
use crate::pins::{PinList, PinManager};
use crate::store::KeyValueStore;

use super::list_at;

/// Parses `key=value` pairs given to `--meta`
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid key=value: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid key=value: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn print_list(list: &PinList, out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "{} ({}, {})",
        list.service().unwrap_or("-"),
        list.protocol()
            .map(|p| p.prefix())
            .unwrap_or_else(|| "-".to_string()),
        list.dialect()
    )?;
    write!(out, "{}", list.render())?;
    Ok(())
}

pub async fn run<S: KeyValueStore>(
    manager: &mut PinManager<S>,
    command: PinCommands,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        PinCommands::List { index: Some(index) } => {
            let list = list_at(manager, index)?;
            list.refresh().await?;
            print_list(list, out)?;
        }
        PinCommands::List { index: None } => {
            for list in manager.lists_mut() {
                if list.protocol().is_none() {
                    continue;
                }
                // One unreachable service should not hide the others
                if let Err(e) = list.refresh().await {
                    warn!("Skipping {}: {e:#}", list.service().unwrap_or("-"));
                    continue;
                }
                print_list(list, out)?;
            }
        }
        PinCommands::Add {
            index,
            url,
            name,
            origins,
            meta,
        } => {
            let options = CreateOptions {
                name,
                origins,
                meta: meta.into_iter().collect(),
            };
            let list = list_at(manager, index)?;
            list.add_with(&url, options).await?;
            print_list(list, out)?;
        }
        PinCommands::Remove { index, url } => {
            let list = list_at(manager, index)?;
            list.remove(&url).await?;
            print_list(list, out)?;
        }
    }
    Ok(())
}
