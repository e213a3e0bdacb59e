use anyhow::Result;
use clap::Parser;
use compile_sjis::{wrap, Launch, Transcoder};
use env_logger::Env;
use std::process;

/// Transcodes a C source file and runs the real compiler on the copy.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Target encoding label.
    #[arg(long, default_value = "shift_jis")]
    encoding: String,
    /// Run the space-joined compiler line through the system shell instead of
    /// launching the compiler directly (the default).
    #[arg(long)]
    shell: bool,
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long)]
    verbose: bool,
    /// Compiler arguments, including -D__CC=<compiler> and -D__BUILD_DIR=<dir>.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    let Args {
        encoding,
        shell,
        verbose,
        args,
    } = Args::parse();

    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let transcoder = Transcoder::for_label(&encoding)?;
    let launch = if shell { Launch::Shell } else { Launch::Direct };
    let status = wrap(args, &transcoder, launch)?;

    process::exit(status.code().unwrap_or(1));
}
