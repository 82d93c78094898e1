//! Somatic CLI: the `somatic` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    support::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate {
            input,
            json,
            locked,
            unlocked,
            config,
        } => commands::validate::run(commands::validate::Args {
            input,
            json,
            locked,
            unlocked,
            config,
        }),

        Commands::Rewrite {
            input,
            validation,
            out,
            mode,
            locked,
            unlocked,
            config,
        } => commands::rewrite::run(commands::rewrite::Args {
            input,
            validation,
            out,
            mode,
            locked,
            unlocked,
            config,
        }),

        Commands::Pipeline {
            draft,
            out,
            workdir,
            mode,
            ledger,
            locked,
            unlocked,
            config,
        } => commands::pipeline::run(commands::pipeline::Args {
            draft,
            out,
            workdir,
            mode,
            ledger,
            locked,
            unlocked,
            config,
        }),

        Commands::Batch {
            dir,
            repair,
            out_dir,
            mode,
            config,
            json,
        } => commands::batch::run(commands::batch::Args {
            dir,
            repair,
            out_dir,
            mode,
            config,
            json,
        }),

        Commands::QueueRun {
            store,
            tab,
            status,
            limit,
            out_dir,
            dry_run,
            mode,
            config,
            json,
        } => commands::queue_run::run(commands::queue_run::Args {
            store,
            tab,
            status,
            limit,
            out_dir,
            dry_run,
            mode,
            config,
            json,
        }),

        Commands::WriterPrompt {
            title,
            card_id,
            pass_condition,
            locked,
            unlock_rule,
            notes,
            date,
            config,
        } => commands::writer_prompt::run(commands::writer_prompt::Args {
            title,
            card_id,
            pass_condition,
            locked,
            unlock_rule,
            notes,
            date,
            config,
        }),
    }
}
