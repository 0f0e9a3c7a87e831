use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "quorum")]
#[command(about = "Detect conflicting suggestions and merge them into consolidated changes")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the engine config file (JSON)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// User ID to act as (falls back to QUORUM_ACTOR)
    #[arg(long, global = true, value_name = "USER_ID")]
    pub actor: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage ideas
    Idea {
        #[command(subcommand)]
        command: IdeaCommands,
    },
    /// Manage suggestions on an idea
    #[command(alias = "s")]
    Suggestion {
        #[command(subcommand)]
        command: SuggestionCommands,
    },
    /// Report conflicts between pending suggestions without writing anything
    Analyze {
        /// Idea ID
        idea: String,
        /// Suggestion IDs to analyze
        #[arg(required = true)]
        suggestions: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge pending suggestions into one merge record
    Merge {
        /// Idea ID
        idea: String,
        /// Suggestion IDs to merge, in order
        #[arg(required = true)]
        suggestions: Vec<String>,
        /// consensus, priority or latest (anything else means consensus)
        #[arg(long, default_value = "consensus")]
        strategy: String,
        /// Record the merge as automatic
        #[arg(long)]
        auto: bool,
        /// Conflict resolution payload stored on the merge record
        #[arg(long, value_name = "JSON")]
        resolution: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the merge history of an idea
    History {
        /// Idea ID
        idea: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List unresolved conflicts of an idea
    Conflicts {
        /// Idea ID
        idea: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a conflict as resolved
    Resolve {
        /// Conflict ID
        conflict: String,
        /// Resolution notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a conflict as ignored
    Ignore {
        /// Conflict ID
        conflict: String,
        /// Notes explaining why the conflict is ignored
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Suggest which merges to run next
    Recommend {
        /// Idea ID
        idea: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show points earned by a user
    Points {
        /// User ID (defaults to the acting user)
        user: Option<String>,
        /// Number of ledger entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
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

#[derive(Subcommand)]
pub enum IdeaCommands {
    /// Create an idea owned by the acting user
    #[command(alias = "new")]
    Create {
        /// Idea title
        title: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show an idea
    Show {
        /// Idea ID
        idea: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum SuggestionCommands {
    /// Add a suggestion as the acting user
    Add {
        /// Idea ID
        idea: String,
        /// Suggestion content
        content: Vec<String>,
        /// improvement, question, concern, support or general
        #[arg(long = "type", default_value = "general")]
        kind: String,
        /// Suggestion this one replies to
        #[arg(long, value_name = "SUGGESTION_ID")]
        parent: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List suggestions of an idea
    List {
        /// Idea ID
        idea: String,
        /// Only show pending suggestions (same as --state pending)
        #[arg(long, conflicts_with = "state")]
        pending: bool,
        /// pending, accepted, merged or rejected
        #[arg(long)]
        state: Option<String>,
        /// Only show suggestions of this type
        #[arg(long = "type")]
        kind: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the reply thread a suggestion belongs to
    Thread {
        /// Suggestion ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Accept a pending suggestion
    Accept {
        /// Suggestion ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reject a pending suggestion
    Reject {
        /// Suggestion ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show suggestion counters for an idea
    Stats {
        /// Idea ID
        idea: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}
