use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kuebiko")]
#[command(version, about = "Keep titled notes with validated storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Use a throwaway in-memory store
    #[arg(short, long, global = true)]
    pub memory: bool,

    /// Directory holding the notes (overrides KUEBIKO_DATA_DIR)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a new note
    #[command(alias = "n")]
    Add {
        /// Title of the note (must be unique)
        title: String,

        /// Body of the note
        #[arg(required = false)]
        text: Option<String>,
    },

    /// List notes
    #[command(alias = "ls")]
    List {
        /// Only show notes matching this term, best match first
        #[arg(short, long)]
        filter: Option<String>,

        /// Add a note titled after the filter when no title matches it exactly
        #[arg(short, long, requires = "filter")]
        create: bool,
    },

    /// Print note titles, one per line
    Titles,

    /// Show a note
    #[command(alias = "v")]
    Show {
        /// Id or title of the note
        note: String,
    },

    /// Change a note's title or body
    #[command(alias = "e")]
    Edit {
        /// Id or title of the note
        note: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New body
        #[arg(long)]
        text: Option<String>,
    },

    /// Delete a note
    #[command(alias = "rm")]
    Delete {
        /// Id or title of the note
        note: String,
    },

    /// Show the effective configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_optional_text() {
        let cli = Cli::try_parse_from(["kuebiko", "add", "Groceries"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Add { ref title, text: None }) if title == "Groceries"
        ));
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["kuebiko", "ls", "--memory", "-f", "milk"]).unwrap();
        assert!(cli.memory);
        assert!(matches!(
            cli.command,
            Some(Commands::List { filter: Some(ref f), create: false }) if f == "milk"
        ));
    }

    #[test]
    fn create_needs_a_filter() {
        assert!(Cli::try_parse_from(["kuebiko", "list", "--create"]).is_err());
        let cli = Cli::try_parse_from(["kuebiko", "list", "-f", "Errands", "-c"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::List { create: true, .. })));
    }

    #[test]
    fn edit_takes_named_fields() {
        let cli = Cli::try_parse_from(["kuebiko", "edit", "3", "--text", "eggs"]).unwrap();
        match cli.command {
            Some(Commands::Edit { note, title, text }) => {
                assert_eq!(note, "3");
                assert!(title.is_none());
                assert_eq!(text.as_deref(), Some("eggs"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
