use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;

/// Share, scan and preview digital receipts.
#[derive(Debug, Parser)]
#[command(name = "receipt", version, about)]
pub struct Cli {
    /// Configuration file (RON). Defaults to ./receipt.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "RECEIPT_FUNCTIONS_BASE_URL")]
    pub functions_base_url: Option<String>,

    /// Domain receipt links point at.
    #[arg(long, global = true, env = "RECEIPT_DOMAIN")]
    pub domain: Option<String>,

    #[arg(long, global = true, env = "RECEIPT_ANON_KEY", hide_env_values = true)]
    pub anon_key: Option<String>,

    /// More log output; repeat for debug and trace.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the receipt link for a token.
    Link {
        #[arg(long)]
        token: String,
    },
    /// Show the QR code of a receipt link.
    Qr {
        #[arg(long)]
        token: String,
        /// Compose the retailer logo into the code and close after 12 seconds.
        #[arg(long)]
        branded: bool,
        #[arg(long)]
        logo_url: Option<String>,
        /// Also write the SVG image to this file.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Recognise a receipt token in scanned text and preview it.
    /// Reads lines from stdin when no text is given.
    Scan {
        text: Option<String>,
    },
    /// Fetch and show the receipt behind a token.
    Preview {
        token_id: String,
    },
    /// Generate a terminal API key and its stored hash.
    ProvisionKey {
        #[arg(long, env = "TERMINAL_KEY_PEPPER", hide_env_values = true)]
        pepper: String,
    },
    /// Write a default configuration file.
    InitConfig {
        path: Option<PathBuf>,
    },
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let logo_url = match &self.command {
            Command::Qr { logo_url, .. } => logo_url.clone(),
            _ => None,
        };
        Overrides {
            functions_base_url: self.functions_base_url.clone(),
            receipt_domain: self.domain.clone(),
            anon_key: self.anon_key.clone(),
            logo_url,
        }
    }
}
