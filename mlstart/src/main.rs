//! `mlstart` binary: parse arguments, initialise logging, run the command
//! and map failures to category exit codes.
//!
//! | Exit | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | unexpected failure |
//! | 2 | configuration error |
//! | 3 | target directory already exists |
//! | 4 | templating tool failed |
//! | 5 | environment creation or install failed |

mod cli;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use mlstart_core::observability;
use mlstart_core::BootstrapError;

fn main() {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

/// Print a one-line diagnostic naming the failing stage, followed by the
/// external tool's own output when there is any.
fn handle_error(e: &anyhow::Error) -> i32 {
    if let Some(err) = e.downcast_ref::<BootstrapError>() {
        eprintln!("error: [{}] {err}", err.stage());
        if let Some(output) = err.tool_output() {
            eprintln!("{}", output.trim_end());
        }
        tracing::debug!(kind = err.kind(), "bootstrap failed");
        return err.exit_code();
    }
    eprintln!("error: {e:?}");
    1
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::New(args) => {
            let params = args.into_params()?;
            mlstart_commands::new::cmd_new(params)
        }
    }
}
