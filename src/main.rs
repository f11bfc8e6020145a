use clap::Parser as _;
use lufft_shm31_tools::commands;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(clap::Parser)]
#[clap(version, about, author)]
enum Commands {
    Registers(commands::registers::Args),
    Read(commands::read::Args),
    Action(commands::action::Args),
    Watch(commands::watch::Args),
}

fn end<E: std::error::Error>(r: Result<(), E>) {
    std::process::exit(match r {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            let mut cause = e.source();
            while let Some(e) = cause {
                eprintln!("  because: {e}");
                cause = e.source();
            }
            1
        }
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let filter = std::env::var("SHM31_TOOLS_LOG")
        .ok()
        .and_then(|description| {
            description
                .parse::<tracing_subscriber::filter::targets::Targets>()
                .ok()
        })
        .unwrap_or_default();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    match Commands::parse() {
        Commands::Registers(args) => end(commands::registers::run(args)),
        Commands::Read(args) => end(commands::read::run(args).await),
        Commands::Action(args) => end(commands::action::run(args).await),
        Commands::Watch(args) => end(commands::watch::run(args).await),
    }
}
