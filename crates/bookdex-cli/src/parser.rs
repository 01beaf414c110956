//! Command-line interface definition.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookdex", about = "Canonical book-metadata service", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP/WebSocket server.
    Serve {
        /// Bind address.
        #[arg(long, default_value = "127.0.0.1", env = "BOOKDEX_HOST")]
        host: String,

        /// Bind port.
        #[arg(long, default_value_t = 8080, env = "BOOKDEX_PORT")]
        port: u16,
    },

    /// Print the effective configuration (secrets redacted) and exit.
    Config,
}
