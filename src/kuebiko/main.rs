use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use env_logger::Env;
use kuebiko::config::{Backend, KuebikoConfig};
use kuebiko::dao::NoteDao;
use kuebiko::error::{KuebikoError, Result};
use kuebiko::manager::NoteManager;
use kuebiko::model::{Note, NoteId};
use kuebiko::store::fs::FileNoteStore;
use kuebiko::store::memory::MemoryNoteStore;
use kuebiko::store::NoteStorage;
use log::debug;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let backend = if cli.memory {
        Backend::Memory
    } else {
        config.backend()?
    };
    debug!("Using {} backend", backend);

    match backend {
        Backend::Memory => {
            let dao = NoteDao::open(MemoryNoteStore::new(), None)?;
            dispatch(&mut NoteManager::new(dao), cli.command, &config, backend)
        }
        Backend::File => {
            let params = config.to_dao_params()?;
            let dao = NoteDao::open(FileNoteStore::new(), Some(&params))?;
            dispatch(&mut NoteManager::new(dao), cli.command, &config, backend)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

fn load_config(cli: &Cli) -> Result<KuebikoConfig> {
    let config = KuebikoConfig::locate(cli.dir.as_deref())?;
    debug!("Data directory {}", config.data_dir()?.display());
    Ok(config)
}

fn dispatch<S: NoteStorage>(
    mngr: &mut NoteManager<S>,
    command: Option<Commands>,
    config: &KuebikoConfig,
    backend: Backend,
) -> Result<()> {
    match command {
        Some(Commands::Add { title, text }) => handle_add(mngr, title, text),
        Some(Commands::List { filter, create }) => handle_list(mngr, filter, create),
        Some(Commands::Titles) => handle_titles(mngr),
        Some(Commands::Show { note }) => handle_show(mngr, &note),
        Some(Commands::Edit { note, title, text }) => handle_edit(mngr, &note, title, text),
        Some(Commands::Delete { note }) => handle_delete(mngr, &note),
        Some(Commands::Config) => handle_config(config, backend),
        None => handle_list(mngr, None, false),
    }
}

fn handle_add<S: NoteStorage>(
    mngr: &mut NoteManager<S>,
    title: String,
    text: Option<String>,
) -> Result<()> {
    let draft = Note::new(title, text.unwrap_or_default());
    mngr.track(&draft);
    let saved = mngr.save_note(&draft)?;
    print_success(&format!("Note added: {}", saved));
    Ok(())
}

fn handle_list<S: NoteStorage>(
    mngr: &mut NoteManager<S>,
    filter: Option<String>,
    create: bool,
) -> Result<()> {
    if let (true, Some(title)) = (create, filter.as_deref()) {
        let (note, created) = mngr.open_or_create(title)?;
        if created {
            print_success(&format!("Note added: {}", note));
        }
    }

    let notes = match filter {
        Some(term) => mngr.filter_notes(&term)?,
        None => mngr.notes()?,
    };
    print_notes(&notes)
}

fn handle_titles<S: NoteStorage>(mngr: &NoteManager<S>) -> Result<()> {
    for title in mngr.note_titles()? {
        println!("{}", title);
    }
    Ok(())
}

fn handle_show<S: NoteStorage>(mngr: &NoteManager<S>, reference: &str) -> Result<()> {
    let note = resolve_note(mngr, reference)?;
    print_full_note(&note)
}

fn handle_edit<S: NoteStorage>(
    mngr: &mut NoteManager<S>,
    reference: &str,
    title: Option<String>,
    text: Option<String>,
) -> Result<()> {
    if title.is_none() && text.is_none() {
        return Err(KuebikoError::Validation(
            "Nothing to change: pass --title and/or --text".into(),
        ));
    }

    let mut note = resolve_note(mngr, reference)?;
    if let Some(title) = title {
        note.set_title(title);
    }
    if let Some(text) = text {
        note.set_text(text);
    }

    mngr.track(&note);
    if !mngr.has_unsaved_changes() {
        println!("{}", "No changes.".dimmed());
        return Ok(());
    }

    let saved = mngr.save_note(&note)?;
    print_success(&format!("Note updated: {}", saved));
    Ok(())
}

fn handle_delete<S: NoteStorage>(mngr: &mut NoteManager<S>, reference: &str) -> Result<()> {
    let note = resolve_note(mngr, reference)?;
    mngr.delete_note(&note)?;
    print_success(&format!("Note deleted: {}", note));
    Ok(())
}

fn handle_config(config: &KuebikoConfig, backend: Backend) -> Result<()> {
    println!("backend = {}", backend);
    println!("data_dir = {}", config.data_dir()?.display());
    println!("file_ext = {}", config.file_ext());
    Ok(())
}

/// A numeric reference is tried as an id first, then as a title.
fn resolve_note<S: NoteStorage>(mngr: &NoteManager<S>, reference: &str) -> Result<Note> {
    if let Some(id) = reference.parse::<u32>().ok().and_then(NoteId::new) {
        if let Some(note) = mngr.find_note(id)? {
            return Ok(note);
        }
    }
    mngr.find_note_by_title(reference)?
        .ok_or_else(|| KuebikoError::NoteNotFound(format!("No note matches [{}]", reference)))
}

fn print_success(message: &str) {
    println!("{}", message.green());
}

fn print_full_note(note: &Note) -> Result<()> {
    let id = note.id().map(|id| format!("#{}", id)).unwrap_or_default();
    println!("{} {}", id.yellow(), note.title().bold());
    println!(
        "{}",
        format!(
            "created {} · modified {}",
            note.created_at().format("%Y-%m-%d %H:%M"),
            note.modified_at().format("%Y-%m-%d %H:%M")
        )
        .dimmed()
    );
    println!("--------------------------------");
    println!("{}", note.text()?);
    Ok(())
}

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const ID_WIDTH: usize = 6;

fn print_notes(notes: &[Note]) -> Result<()> {
    if notes.is_empty() {
        println!("No notes found.");
        return Ok(());
    }

    for note in notes {
        let id_str = note
            .id()
            .map(|id| format!("{:>width$}. ", id.get(), width = ID_WIDTH - 2))
            .unwrap_or_else(|| " ".repeat(ID_WIDTH));

        let preview: String = note
            .text()?
            .chars()
            .take(50)
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        let title_content = if preview.is_empty() {
            note.title().to_string()
        } else {
            format!("{} {}", note.title(), preview)
        };

        let available = LINE_WIDTH.saturating_sub(ID_WIDTH + TIME_WIDTH);
        println!(
            "{}{}{}",
            id_str.yellow(),
            fit_to_width(&title_content, available),
            format_age(note.modified_at()).dimmed()
        );
    }
    Ok(())
}

/// Cuts `text` to `width` columns, marking a cut with `…`, and pads the rest.
fn fit_to_width(text: &str, width: usize) -> String {
    let full = text.width();
    if full <= width {
        return format!("{}{}", text, " ".repeat(width - full));
    }

    let mut fitted = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w >= width {
            break;
        }
        fitted.push(c);
        used += w;
    }
    fitted.push('…');
    fitted.push_str(&" ".repeat(width.saturating_sub(used + 1)));
    fitted
}

fn format_age(timestamp: DateTime<Utc>) -> String {
    let age = Utc::now()
        .signed_duration_since(timestamp)
        .to_std()
        .unwrap_or_default();
    let label = if age.as_secs() < 60 {
        "just now".to_string()
    } else {
        timeago::Formatter::new().convert(age)
    };
    format!("{:>width$}", label, width = TIME_WIDTH)
}
