pub mod cli;
pub mod config;
pub mod envvar;
pub mod ipfs;
pub mod logging;
pub mod pins;
pub mod store;

pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("PINLIST_GIT_COMMIT"),
    ")"
);
