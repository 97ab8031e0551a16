// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! webchat - a real-time browser chat gateway.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use clap::{Parser, Subcommand};

/// webchat - a real-time browser chat gateway.
#[derive(Parser, Debug)]
#[command(name = "webchat", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web chat gateway.
    Serve {
        /// Answer every inbound message with its own content.
        #[arg(long)]
        echo: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match webchat_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            webchat_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve { echo }) => {
            if let Err(e) = serve::run_serve(config, serve::ServeOptions { echo }).await {
                eprintln!("webchat: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("webchat: failed to render config: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("webchat: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_serve_with_echo() {
        let cli = Cli::try_parse_from(["webchat", "serve", "--echo"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { echo: true })));

        let cli = Cli::try_parse_from(["webchat", "serve"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { echo: false })));
    }

    #[test]
    fn cli_parses_config() {
        let cli = Cli::try_parse_from(["webchat", "config"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config)));
    }

    #[test]
    fn default_config_renders_as_toml() {
        let config = webchat_config::load_and_validate_str("").expect("defaults should be valid");
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[web]"));
        assert!(rendered.contains("port = 8088"));
    }
}
