use clap::{Parser, Subcommand, ValueEnum};
use somatic_repair::RepairMode;

#[derive(Parser)]
#[command(
    name = "somatic",
    about = "Somatic: checklist card validation gates and targeted section repair",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every gate over one card and print the JSON report
    Validate {
        /// Card markdown to validate
        #[arg(long = "in")]
        input: String,

        /// Also write the report to this path
        #[arg(long)]
        json: Option<String>,

        /// Treat the card as locked
        #[arg(long, conflicts_with = "unlocked")]
        locked: bool,

        /// Treat the card as unlocked
        #[arg(long)]
        unlocked: bool,

        /// Pipeline configuration TOML
        #[arg(long)]
        config: Option<String>,
    },

    /// Repair the sections named in a stored validation report
    Rewrite {
        /// Card markdown to repair
        #[arg(long = "in")]
        input: String,

        /// Validation report JSON produced by `validate`
        #[arg(long)]
        validation: String,

        /// Output path for the repaired card
        #[arg(long)]
        out: String,

        /// Repair mode (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Treat the card as locked
        #[arg(long, conflicts_with = "unlocked")]
        locked: bool,

        /// Treat the card as unlocked
        #[arg(long)]
        unlocked: bool,

        /// Pipeline configuration TOML
        #[arg(long)]
        config: Option<String>,
    },

    /// Validate, repair once, and validate again
    Pipeline {
        /// Draft card markdown
        #[arg(long)]
        draft: String,

        /// Output path for the final card
        #[arg(long)]
        out: String,

        /// Directory for per-attempt documents and reports
        #[arg(long)]
        workdir: Option<String>,

        /// Repair mode (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// JSON row store that receives one idempotent run row
        #[arg(long)]
        ledger: Option<String>,

        /// Treat the card as locked
        #[arg(long, conflicts_with = "unlocked")]
        locked: bool,

        /// Treat the card as unlocked
        #[arg(long)]
        unlocked: bool,

        /// Pipeline configuration TOML
        #[arg(long)]
        config: Option<String>,
    },

    /// Validate (or run the pipeline on) every card under a directory
    Batch {
        /// Directory searched recursively for `*.md`
        #[arg(long)]
        dir: String,

        /// Run the full pipeline instead of validating only
        #[arg(long)]
        repair: bool,

        /// Write final cards here, mirroring the input layout (with --repair)
        #[arg(long)]
        out_dir: Option<String>,

        /// Repair mode (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Pipeline configuration TOML
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the pipeline over READY rows of a content-queue tab
    QueueRun {
        /// JSON row store holding the queue tab
        #[arg(long)]
        store: String,

        /// Queue tab name
        #[arg(long, default_value = "CHECKLIST_QUEUE")]
        tab: String,

        /// Only rows with this Status are processed
        #[arg(long, default_value = "READY")]
        status: String,

        /// Process at most this many rows
        #[arg(long)]
        limit: Option<usize>,

        /// Directory for final cards
        #[arg(long, default_value = "out")]
        out_dir: String,

        /// List the rows that would run without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Repair mode (overrides the config)
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Pipeline configuration TOML
        #[arg(long)]
        config: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the sealed writer prompt for a new card
    WriterPrompt {
        /// Card title
        #[arg(long)]
        title: String,

        /// Stable card identifier
        #[arg(long)]
        card_id: String,

        /// Pass Condition text
        #[arg(long)]
        pass_condition: String,

        /// Card is locked behind an unlock rule
        #[arg(long)]
        locked: bool,

        /// Unlock Rule text (locked cards)
        #[arg(long)]
        unlock_rule: Option<String>,

        /// Free-form writer notes
        #[arg(long)]
        notes: Option<String>,

        /// ISO date for the prompt header (defaults to today, UTC)
        #[arg(long)]
        date: Option<String>,

        /// Pipeline configuration TOML
        #[arg(long)]
        config: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ModeArg {
    #[value(name = "rule")]
    Rule,
    #[value(name = "llm")]
    Llm,
}

impl From<ModeArg> for RepairMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Rule => RepairMode::RuleBased,
            ModeArg::Llm => RepairMode::Generative,
        }
    }
}
