use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::LoadArgs;

#[derive(Parser)]
#[command(name = "verlib")]
#[command(version)]
#[command(about = "Inspect and author version library files")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the header and record counts of a library
    Info {
        file: PathBuf,
        #[command(flatten)]
        load: LoadArgs,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Look up a function or global by its version independent id
    Lookup {
        file: PathBuf,
        id: u64,
        #[command(flatten)]
        load: LoadArgs,
    },
    /// Find the function containing an address (hex)
    Find {
        file: PathBuf,
        address: String,
        #[command(flatten)]
        load: LoadArgs,
    },
    /// Find the type owning a vtable (hex)
    Vtable {
        file: PathBuf,
        offset: String,
        #[command(flatten)]
        load: LoadArgs,
    },
    /// Write `<id>\t0x<offset>` for every function and global
    DumpVids {
        file: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write an alias file redirecting one build version to another
    Alias {
        output: PathBuf,
        #[arg(long, default_value_t = 1)]
        library_version: i32,
        /// Version the alias file stands for (e.g. 1.5.97.0)
        #[arg(long)]
        version: String,
        /// Version whose library should be loaded instead
        #[arg(long)]
        target: String,
    },
    /// Re-encode a library, following aliases
    Convert { input: PathBuf, output: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose { "verlib=debug" } else { "verlib=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Info { file, load, json } => commands::info::run(&file, &load, json),
        Command::Lookup { file, id, load } => commands::lookup::run(&file, id, &load),
        Command::Find {
            file,
            address,
            load,
        } => commands::find::run(&file, &address, &load),
        Command::Vtable { file, offset, load } => commands::vtable::run(&file, &offset, &load),
        Command::DumpVids { file, output } => commands::dump_vids::run(&file, output.as_deref()),
        Command::Alias {
            output,
            library_version,
            version,
            target,
        } => commands::alias::run(&output, library_version, &version, &target),
        Command::Convert { input, output } => commands::convert::run(&input, &output),
    }
}
