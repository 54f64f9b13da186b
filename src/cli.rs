use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "compile-on-godbolt",
    about = "Compile source files on Godbolt Compiler Explorer",
    version
)]
pub struct Cli {
    /// File to compile on Godbolt Compiler Explorer.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Compile AND RUN on Godbolt Compiler Explorer.
    #[arg(long)]
    pub run: bool,

    /// Compiler identifier to use instead of the configured one.
    #[arg(long, value_name = "ID")]
    pub compiler: Option<String>,

    /// Print the preprocessed source instead of submitting it.
    #[arg(short = 'E', long = "preprocess-only", conflicts_with = "run")]
    pub preprocess_only: bool,

    /// Log requests and include resolution to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
