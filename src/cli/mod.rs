//! CLI module - Command-line interface for the anime API
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Anime API - record management HTTP service
#[derive(Parser)]
#[command(name = "anime-api")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (defaults to ./config.toml and the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Print stored records, optionally filtered by title
    #[command(alias = "ls", alias = "l")]
    List {
        /// Case-insensitive title substring
        query: Option<String>,
    },
}

pub use commands::*;
