use std::io::Write;

use anyhow::{Context, Result};
use prettytable::{row, Table};
use tracing::info;
use url::Url;

use crate::cli::ServiceCommands;
use crate::config::Config;
use crate::envvar::is_defined;
use crate::ipfs::ServiceConfig;
use crate::pins::PinManager;
use crate::store::KeyValueStore;

use super::list_at;

pub async fn run<S: KeyValueStore>(
    manager: &mut PinManager<S>,
    command: ServiceCommands,
    config: &Config,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        ServiceCommands::List => {
            write!(out, "{}", services_table(manager))?;
        }
        ServiceCommands::Add {
            service,
            protocol,
            api,
            auth,
        } => {
            let mut service_config = ServiceConfig::new(service, protocol).with_api(api);
            service_config.auth = auth.filter(|a| !a.is_empty());
            manager.add_list_with(service_config);
            writeln!(out, "Added service #{}", manager.lists().len() - 1)?;
        }
        ServiceCommands::Remove { index } => {
            if manager.lists().get(index).is_some_and(|list| list.is_external()) {
                anyhow::bail!(
                    "Service #{index} comes from the config file, remove it there instead"
                );
            }
            let removed = manager
                .remove_list(index)
                .with_context(|| format!("No service at index {index}"))?;
            info!("Removed service {}", removed.service().unwrap_or("-"));
            writeln!(out, "Removed service #{index}")?;
        }
        ServiceCommands::Invite { index } => {
            let page = config.invite_base_url()?;
            let link = list_at(manager, index)?.invite_link(&page)?;
            writeln!(out, "{link}")?;
        }
        ServiceCommands::Import { url } => {
            let page = Url::parse(&url).with_context(|| format!("Invalid invite link '{url}'"))?;
            let invited = PinManager::<S>::from_invite(&page);
            if invited.is_empty() {
                anyhow::bail!("Invite link does not carry any services");
            }
            let added = manager.merge(invited).await;
            writeln!(out, "Imported {added} services")?;
        }
    }
    Ok(())
}

fn services_table<S: KeyValueStore>(manager: &PinManager<S>) -> Table {
    let mut table = Table::new();
    table.add_row(row!["#", "Protocol", "API", "Service", "Auth", "Source"]);
    for (index, list) in manager.lists().iter().enumerate() {
        let protocol = list
            .protocol()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let auth = if is_defined(&list.auth().map(String::from)) {
            "yes"
        } else {
            "no"
        };
        let source = if list.is_external() { "config" } else { "store" };
        table.add_row(row![
            index,
            protocol,
            list.dialect(),
            list.service().unwrap_or("-"),
            auth,
            source
        ]);
    }
    table
}
