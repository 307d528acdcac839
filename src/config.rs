//! Command line and environment configuration
//!
//! Every value can be given as a flag or through the environment variable
//! named next to it. Missing or malformed values stop the process before
//! anything else starts.
use crate::{
    auction::{NewItem, MAX_STORED},
    clock::AuctionClock,
};
use clap::builder::NonEmptyStringValueParser;
use std::{fmt, net::SocketAddr};

#[derive(clap::Parser, Debug)]
#[clap(version, about = "Silent auction bidding site")]
pub struct Arguments {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Run the bidding site
    Serve(ServeArguments),
    /// Add a donated item to the catalog
    AddItem(AddItemArguments),
}

#[derive(clap::Args, Debug)]
pub struct DatabaseArguments {
    #[clap(long = "db-user", env = "AUCTION_DB_USER", value_parser = NonEmptyStringValueParser::new())]
    pub user: String,

    #[clap(long = "db-pass", env = "AUCTION_DB_PASS", value_parser = NonEmptyStringValueParser::new())]
    pub password: String,

    #[clap(long = "db-name", env = "AUCTION_DB_DB", value_parser = NonEmptyStringValueParser::new())]
    pub database: String,

    #[clap(long = "db-host", env = "AUCTION_DB_HOST", value_parser = NonEmptyStringValueParser::new())]
    pub host: String,

    #[clap(long = "db-port", env = "AUCTION_DB_PORT")]
    pub port: u16,
}

impl DatabaseArguments {
    pub fn postgres_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.database)
            .host(&self.host)
            .port(self.port);
        config
    }
}

impl fmt::Display for DatabaseArguments {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "db_user: {}", self.user)?;
        writeln!(f, "db_pass: SECRET")?;
        writeln!(f, "db_name: {}", self.database)?;
        writeln!(f, "db_host: {}", self.host)?;
        writeln!(f, "db_port: {}", self.port)
    }
}

#[derive(clap::Args, Debug)]
pub struct ServeArguments {
    /// Title of the event; item pages are served under `/<event>/<item id>`
    #[clap(long, env = "AUCTION_EVENT", value_parser = NonEmptyStringValueParser::new())]
    pub event: String,

    #[clap(long = "admin-user", env = "AUCTION_USER", value_parser = NonEmptyStringValueParser::new())]
    pub admin_user: String,

    #[clap(long = "admin-pass", env = "AUCTION_PASS", value_parser = NonEmptyStringValueParser::new())]
    pub admin_password: String,

    /// When bidding closes, RFC 3339 (e.g. 2023-02-09T21:15:00-05:00)
    #[clap(long = "closes-at", env = "AUCTION_CLOSE", value_parser = AuctionClock::parse)]
    pub clock: AuctionClock,

    #[clap(long, env = "AUCTION_BIND", default_value = "0.0.0.0:8000")]
    pub bind_address: SocketAddr,

    #[clap(flatten)]
    pub database: DatabaseArguments,
}

impl fmt::Display for ServeArguments {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "event: {}", self.event)?;
        writeln!(f, "admin_user: {}", self.admin_user)?;
        writeln!(f, "admin_pass: SECRET")?;
        writeln!(f, "closes_at: {}", self.clock.closes_at().to_rfc3339())?;
        writeln!(f, "bind_address: {}", self.bind_address)?;
        write!(f, "{}", self.database)
    }
}

#[derive(clap::Args, Debug)]
pub struct AddItemArguments {
    #[clap(long, value_parser = NonEmptyStringValueParser::new())]
    pub name: String,

    #[clap(long, value_parser = NonEmptyStringValueParser::new())]
    pub provided_by: String,

    #[clap(long, default_value = "")]
    pub description: String,

    /// Estimated value, in cents
    #[clap(long, value_parser = clap::value_parser!(u64).range(..=MAX_STORED))]
    pub value: u64,

    /// Bids must be strictly above this, in cents
    #[clap(long, value_parser = clap::value_parser!(u64).range(..=MAX_STORED))]
    pub min_bid: u64,

    #[clap(flatten)]
    pub database: DatabaseArguments,
}

impl AddItemArguments {
    pub fn new_item(&self) -> NewItem {
        NewItem {
            name: self.name.clone(),
            provided_by: self.provided_by.clone(),
            description: self.description.clone(),
            value: self.value,
            min_bid: self.min_bid,
        }
    }
}
