use anyhow::Result;
use clap::{CommandFactory as _, Parser as _};

use bundles_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);
    let log = logging::Logger::new();

    match args.command {
        cli::Command::Install(opts) => commands::install::run(&args.global, &opts, &log),
        cli::Command::Add(opts) => commands::edit::run_add(&args.global, &opts, &log),
        cli::Command::Remove(opts) => commands::edit::run_remove(&args.global, &opts, &log),
        cli::Command::List => commands::list::run(&args.global, &log),
        cli::Command::Snapshot(opts) => commands::snapshot::run_create(&args.global, &opts, &log),
        cli::Command::Snapshots => commands::snapshot::run_list(&args.global, &log),
        cli::Command::Rollback(opts) => commands::rollback::run(&args.global, &opts, &log),
        cli::Command::Completions(opts) => {
            clap_complete::generate(
                opts.shell,
                &mut cli::Cli::command(),
                "bundles",
                &mut std::io::stdout(),
            );
            Ok(())
        }
        cli::Command::Version => {
            println!("bundles {}", cli::VERSION);
            Ok(())
        }
    }
}
