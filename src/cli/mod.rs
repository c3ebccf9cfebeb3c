use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use crate::ipfs::{ApiDialect, Protocol};
use crate::logging::LogLevel;

pub mod commands;
pub mod config;

#[derive(Parser, Debug)]
#[command(author, version = crate::VERSION, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "PINLIST_CONFIG")]
    pub config: Option<PathBuf>,

    /// File the service configurations are persisted to (overrides the config file)
    #[arg(short, long, env = "PINLIST_STORE")]
    pub store: Option<PathBuf>,

    /// Merge the services shared through this invite link
    #[arg(long)]
    pub invite: Option<String>,

    /// Set the log level
    #[arg(short, long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Disable colored log output
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configured pinning services
    Services {
        #[command(subcommand)]
        command: ServiceCommands,
    },
    /// Manage the pins of a configured service
    Pins {
        #[command(subcommand)]
        command: PinCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ServiceCommands {
    /// List configured services
    List,
    /// Configure a new service
    Add {
        /// Base URL of the pinning service, optionally with user:password@
        service: String,

        #[arg(short, long, value_enum, default_value = "ipfs")]
        protocol: Protocol,

        /// REST dialect spoken by the service
        #[arg(short, long, value_enum, default_value = "pinning-service")]
        api: ApiDialect,

        /// Access token sent as a bearer token
        #[arg(long)]
        auth: Option<String>,
    },
    /// Remove a configured service
    Remove {
        /// Index as shown by `services list`
        index: usize,
    },
    /// Print an invite link sharing a service
    Invite { index: usize },
    /// Import the services shared through an invite link
    Import { url: String },
}

#[derive(Subcommand, Debug)]
pub enum PinCommands {
    /// List pins of one service, or of every service when no index is given
    List { index: Option<usize> },
    /// Pin a URL such as ipfs://<cid>
    Add {
        index: usize,
        url: String,

        /// Name of the pin (defaults to the URL)
        #[arg(short, long)]
        name: Option<String>,

        /// Multiaddrs of peers known to provide the content
        #[arg(long = "origin")]
        origins: Vec<String>,

        /// Metadata as key=value
        #[arg(long, value_parser = commands::pins::parse_key_val)]
        meta: Vec<(String, String)>,
    },
    /// Unpin a URL
    Remove { index: usize, url: String },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run_with_writer(&mut stdout).await
    }

    /// Runs the command, writing tables and links to `out`. The configured services
    /// are persisted afterwards, whether or not the command succeeded.
    pub async fn run_with_writer(self, out: &mut dyn Write) -> Result<()> {
        let settings = config::load_settings(self.config.as_deref(), self.store)?;
        let mut manager = config::open_manager(&settings, self.invite.as_deref()).await?;

        let result = match self.command {
            Commands::Services { command } => {
                commands::services::run(&mut manager, command, &settings, out).await
            }
            Commands::Pins { command } => commands::pins::run(&mut manager, command, out).await,
        };

        let saved = manager.save_existing();
        match (result, saved) {
            (Err(e), Err(save_err)) => {
                error!("{save_err:#}");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), saved) => saved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    mod cli_parsing_tests {
        use super::*;

        #[test]
        fn parses_services_add_with_cluster_api() {
            let args = vec![
                "pinlist",
                "services",
                "add",
                "https://cluster.example.com/",
                "--api",
                "cluster",
                "--auth",
                "token",
            ];
            let cli = Cli::try_parse_from(args).unwrap();

            assert_eq!(cli.log_level, LogLevel::Info);
            assert!(!cli.no_color);
            assert!(cli.invite.is_none());
            match cli.command {
                Commands::Services {
                    command:
                        ServiceCommands::Add {
                            service,
                            protocol,
                            api,
                            auth,
                        },
                } => {
                    assert_eq!(service, "https://cluster.example.com/");
                    assert_eq!(protocol, Protocol::Ipfs);
                    assert_eq!(api, ApiDialect::Cluster);
                    assert_eq!(auth.as_deref(), Some("token"));
                }
                other => panic!("Expected services add, got {other:?}"),
            }
        }

        #[test]
        fn parses_pins_add_with_origins_and_meta() {
            let args = vec![
                "pinlist",
                "--invite",
                "http://localhost/?invite=[]",
                "pins",
                "add",
                "1",
                "ipfs://bafy1",
                "--name",
                "first",
                "--origin",
                "/ip4/1.2.3.4/tcp/4001",
                "--origin",
                "/ip4/5.6.7.8/tcp/4001",
                "--meta",
                "app=pinlist",
            ];
            let cli = Cli::try_parse_from(args).unwrap();

            assert_eq!(cli.invite.as_deref(), Some("http://localhost/?invite=[]"));
            match cli.command {
                Commands::Pins {
                    command:
                        PinCommands::Add {
                            index,
                            url,
                            name,
                            origins,
                            meta,
                        },
                } => {
                    assert_eq!(index, 1);
                    assert_eq!(url, "ipfs://bafy1");
                    assert_eq!(name.as_deref(), Some("first"));
                    assert_eq!(origins.len(), 2);
                    assert_eq!(meta, vec![("app".to_string(), "pinlist".to_string())]);
                }
                other => panic!("Expected pins add, got {other:?}"),
            }
        }

        #[test]
        fn rejects_malformed_meta_and_unknown_api() {
            let args = vec!["pinlist", "pins", "add", "0", "ipfs://x", "--meta", "novalue"];
            assert!(Cli::try_parse_from(args).is_err());

            let args = vec!["pinlist", "services", "add", "https://a/", "--api", "rest"];
            assert!(Cli::try_parse_from(args).is_err());
        }

        #[test]
        fn pins_list_index_is_optional() {
            let cli = Cli::try_parse_from(vec!["pinlist", "pins", "list"]).unwrap();
            assert!(matches!(
                cli.command,
                Commands::Pins {
                    command: PinCommands::List { index: None }
                }
            ));

            let cli = Cli::try_parse_from(vec!["pinlist", "pins", "list", "2"]).unwrap();
            assert!(matches!(
                cli.command,
                Commands::Pins {
                    command: PinCommands::List { index: Some(2) }
                }
            ));
        }

        #[test]
        fn handles_no_color_flag() {
            let args = vec!["pinlist", "--no-color", "true", "services", "list"];
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(cli.no_color);

            let args = vec!["pinlist", "--no-color", "false", "services", "list"];
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(!cli.no_color);
        }

        #[test]
        fn requires_subcommand() {
            assert!(Cli::try_parse_from(vec!["pinlist"]).is_err());
        }
    }

    mod run_tests {
        use super::*;
        use crate::ipfs::ServiceConfig;
        use crate::pins::{PinList, PINNING_SERVICES};
        use tempfile::tempdir;
        use url::Url;

        #[tokio::test]
        async fn failing_command_still_saves_services() {
            let dir = tempdir().unwrap();
            let store = dir.path().join("nested").join("store.json");

            let shared =
                PinList::from_config(ServiceConfig::new("https://invited/", Protocol::Ipns));
            let link = shared
                .invite_link(&Url::parse("http://localhost/").unwrap())
                .unwrap();

            let cli = Cli::try_parse_from(vec![
                "pinlist",
                "--store",
                store.to_str().unwrap(),
                "--invite",
                link.as_str(),
                "services",
                "remove",
                "5",
            ])
            .unwrap();

            let mut out = Vec::new();
            let err = cli.run_with_writer(&mut out).await.unwrap_err();
            assert_eq!(err.to_string(), "No service at index 5");
            assert!(out.is_empty());

            let stored: serde_json::Value =
                serde_json::from_str(&std::fs::read_to_string(&store).unwrap()).unwrap();
            let services: Vec<ServiceConfig> =
                serde_json::from_str(stored[PINNING_SERVICES].as_str().unwrap()).unwrap();
            assert_eq!(
                services,
                vec![ServiceConfig::new("https://invited/", Protocol::Ipns)]
            );
        }

        #[tokio::test]
        async fn services_added_in_one_run_are_listed_in_the_next() {
            let dir = tempdir().unwrap();
            let store = dir.path().join("store.json");
            let store = store.to_str().unwrap();

            let cli = Cli::try_parse_from(vec![
                "pinlist",
                "--store",
                store,
                "services",
                "add",
                "https://a.example.com/",
                "--auth",
                "secret",
            ])
            .unwrap();
            let mut out = Vec::new();
            cli.run_with_writer(&mut out).await.unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), "Added service #0\n");

            let cli = Cli::try_parse_from(vec!["pinlist", "--store", store, "services", "list"])
                .unwrap();
            let mut out = Vec::new();
            cli.run_with_writer(&mut out).await.unwrap();
            let text = String::from_utf8(out).unwrap();
            assert!(text.contains("https://a.example.com/"));
            assert!(text.contains("store"));
            assert!(!text.contains("secret"));
        }
    }
}
