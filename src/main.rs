//! composeforge CLI: lower app resource descriptors into compose manifests.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "composeforge",
    version,
    about = "Lower app device and volume descriptors into compose manifest fragments"
)]
struct Cli {
    #[command(subcommand)]
    command: composeforge::cli::Commands,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = composeforge::cli::dispatch(cli.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
