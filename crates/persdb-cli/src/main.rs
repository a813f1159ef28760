pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod store;

use clap::Parser;

use cli::{Cli, Command};
use error::CliError;

fn main() {
    env_logger::init();

    #[cfg(unix)]
    install_sigpipe_default();

    let cli = Cli::parse();

    if let Err(e) = dispatch(&cli) {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

/// Dispatches the parsed CLI arguments to the appropriate command handler.
///
/// Returns `Ok(())` on success or a [`CliError`] on failure. The caller is
/// responsible for printing the error message and exiting with the
/// appropriate exit code.
fn dispatch(cli: &Cli) -> Result<(), CliError> {
    match &cli.command {
        Command::Log {
            config,
            sorted,
            perspective,
            all,
            pe,
            limit,
        } => {
            let cfg = config::load(config)?;
            let database = db::open(&cfg)?;
            cmd::log::run(&database.tree, *sorted, *perspective, *all, pe.as_deref(), *limit)
        }

        Command::Compare {
            config,
            tree_a,
            tree_b,
            include_attrs,
            exclude_attrs,
        } => {
            let cfg = config::load(config)?;
            let database = db::open(&cfg)?;
            cmd::compare::run(
                &database.tree,
                tree_a,
                tree_b.as_deref(),
                include_attrs.clone(),
                exclude_attrs.clone(),
            )
        }

        Command::Merge {
            config,
            collection,
            v1,
            v2,
            save,
        } => {
            let cfg = config::load(config)?;
            let database = db::open(&cfg)?;
            cmd::merge::run(&database, collection, v1, v2, *save)?;
            if *save {
                db::flush(&cfg, &database)?;
            }
            Ok(())
        }

        Command::Adduser { username, write } => cmd::adduser::run(username.clone(), write.clone()),

        Command::Timestamp { value } => cmd::timestamp::run(value),
    }
}

/// Resets `SIGPIPE` to its default disposition (`SIG_DFL`).
///
/// Rust's runtime ignores `SIGPIPE` by default, which causes programs that
/// write to a closed pipe (e.g. `persdb log db.hjson | head`) to receive an
/// `Err(BrokenPipe)` from a write call rather than being terminated silently.
/// Restoring the default disposition makes the kernel terminate the process
/// with exit code 0 when a write to a closed pipe occurs.
#[cfg(unix)]
fn install_sigpipe_default() {
    // SAFETY: signal() is safe to call during single-threaded program
    // initialization before any other threads are spawned. SIG_DFL is a
    // valid handler for SIGPIPE. The return value (previous handler) is
    // discarded.
    #[allow(unsafe_code)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
}
