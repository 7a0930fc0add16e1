use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "ntmap")]
#[command(about = "Change the note type of flashcard notes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the collection file
    #[arg(long, global = true, value_name = "PATH")]
    pub collection: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List note types
    Notetypes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List notes
    Notes {
        /// Only notes of this note type (name or ID)
        #[arg(long, value_name = "NAME|ID")]
        notetype: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a note type
    AddNotetype {
        /// Note type name
        #[arg(long)]
        name: String,
        /// Field name, in order (repeatable)
        #[arg(long = "field", value_name = "NAME", required = true)]
        fields: Vec<String>,
        /// Card template name, in order (repeatable)
        #[arg(long = "template", value_name = "NAME")]
        templates: Vec<String>,
        /// Create a cloze note type
        #[arg(long, conflicts_with = "templates")]
        cloze: bool,
    },
    /// Add a note
    AddNote {
        /// Note type (name or ID)
        #[arg(long, value_name = "NAME|ID")]
        notetype: String,
        /// Field values, in note type order
        fields: Vec<String>,
    },
    /// Convert notes to another note type
    #[command(alias = "change")]
    ChangeNotetype(ChangeArgs),
    /// Show or update the CLI configuration
    Config {
        /// Collection used when `--collection` is not given
        #[arg(long, value_name = "PATH")]
        set_collection: Option<PathBuf>,
        /// Accept one-way sync warnings without prompting
        #[arg(long, value_name = "BOOL")]
        auto_confirm: Option<bool>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ChangeArgs {
    /// Output note type (name or ID)
    #[arg(long, value_name = "NAME|ID")]
    pub to: String,
    /// Note to convert (repeatable); all must share a note type
    #[arg(long = "note", value_name = "ID", required = true)]
    pub notes: Vec<i64>,
    /// Field override: output field takes its content from input field
    #[arg(long = "map-field", value_name = "OUT=IN")]
    pub map_fields: Vec<String>,
    /// Template override: output template inherits cards of input template
    #[arg(long = "map-template", value_name = "OUT=IN")]
    pub map_templates: Vec<String>,
    /// Print the plan without changing anything
    #[arg(long)]
    pub dry_run: bool,
    /// Accept the one-way sync warning without prompting
    #[arg(short, long)]
    pub yes: bool,
    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
