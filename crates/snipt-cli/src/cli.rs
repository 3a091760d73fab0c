use crate::utils::parse_assignment;
use clap::{Args, Parser, Subcommand};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author = "Gokul <@bahdotsh>",
    version = env!("CARGO_PKG_VERSION"),
    about = "snipt-web - drive the snippet expansion engine from a terminal",
    long_about = "snipt-web runs the matcher, variable expander and expansion orchestrator \
                  against in-memory surfaces, for trying snippets out without a browser."
)]
pub struct SniptWeb {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Settings file to use instead of the default one
    #[clap(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log engine decisions at debug level
    #[clap(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the shortcut candidate at the cursor
    Match {
        #[clap(long, short, help = "Text to scan")]
        text: String,

        #[clap(long, short, help = "Cursor offset in chars (default: end of text)")]
        cursor: Option<usize>,
    },
    /// Expand the shortcut at the cursor inside a text input
    Expand {
        #[clap(long, short, help = "Initial value of the input")]
        text: String,

        #[clap(long, short, help = "Snippets file (default: the configured one)")]
        snippets: Option<PathBuf>,

        #[clap(long, short, help = "Cursor offset in chars (default: end of text)")]
        cursor: Option<usize>,

        #[clap(
            long = "var",
            value_name = "NAME=VALUE",
            value_parser = parse_assignment,
            help = "Value for a snippet variable; repeatable"
        )]
        vars: Vec<(String, String)>,
    },
    /// Check shortcuts and content of every snippet in a file
    Validate {
        #[clap(long, short, help = "Snippets file (default: the configured one)")]
        snippets: Option<PathBuf>,
    },
    /// Create the configuration directory with default files
    Init,
}
