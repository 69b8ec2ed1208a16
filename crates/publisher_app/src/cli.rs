use clap::{Parser, Subcommand};

/// Generates today's article and files it as a platform draft.
#[derive(Debug, Parser)]
#[command(name = "daily-publisher", version)]
#[command(about = "Daily AI-testing article publisher", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Run the pipeline once (default)
    Run {
        /// Use this topic instead of a random one
        #[arg(short, long)]
        topic: Option<String>,
    },
    /// Run the pipeline every day at PUBLISH_TIME
    Schedule,
    /// Report configuration status and the next scheduled run
    Check,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or(Commands::Run { topic: None })
    }
}
