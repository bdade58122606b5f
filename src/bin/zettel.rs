//! Zettel CLI: inspect and maintain a folder of linked notes.
//!
//! Usage:
//!   zettel [--workspace dir] [--config file] <command>
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use zettel::template::{reference_link, url_link};
use zettel::{
    Config, FolderStore, FolderWatcher, NewNote, Note, NoteId, Topic, ZettelEngine, ZettelError,
};

#[derive(Parser)]
#[command(name = "zettel", version, about = "Bidirectional link index for a folder of notes")]
struct Cli {
    /// Workspace root (defaults to the current directory)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,
    /// Config file (defaults to <workspace>/.zettel.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all notes with their link counts
    List,
    /// Show one note and its neighbours
    Show {
        id: String,
        /// Print the note as JSON
        #[arg(long)]
        json: bool,
    },
    /// List notes that carry warnings
    Warnings,
    /// Create a new note
    New {
        /// Identifier to use instead of a generated one
        #[arg(long)]
        id: Option<String>,
        /// Initial title
        #[arg(long)]
        title: Option<String>,
    },
    /// Print a fresh identifier, or convert text to one
    Uid {
        /// Timestamp or number to convert
        #[arg(long)]
        from: Option<String>,
    },
    /// Print link text for a note
    Link {
        id: String,
        /// Print a `<scheme>://id` link instead of `[#id]`
        #[arg(long)]
        url: bool,
    },
    /// Update a note's Modified header
    Touch { id: String },
    /// Keep the index up to date and print events until interrupted
    Watch,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

struct Session {
    engine: ZettelEngine,
    store: Arc<FolderStore>,
}

fn open_session(workspace: Option<PathBuf>, config: Option<PathBuf>) -> Result<Session, ZettelError> {
    let workspace = match workspace {
        Some(dir) => dir,
        None => std::env::current_dir().map_err(zettel::StorageError::from)?,
    };
    let config = Config::load(config.as_deref(), &workspace)?;
    let store = Arc::new(FolderStore::open(config.notes_folder(&workspace), &config.extension)?);
    let engine = ZettelEngine::with_config(store.clone(), &config);
    engine.reload_all()?;
    Ok(Session { engine, store })
}

fn summary(note: &Note) -> String {
    format!(
        "{}  {}  (out {}, in {})",
        note.id,
        note.label(),
        note.outbound.len(),
        note.inbound.len()
    )
}

fn cmd_list(engine: &ZettelEngine) -> i32 {
    for note in engine.list_all() {
        println!("{}", summary(&note));
    }
    0
}

fn cmd_show(engine: &ZettelEngine, id: &str, json: bool) -> i32 {
    let Some(note) = engine.lookup(id) else {
        eprintln!("Error: note '{}' not found", id);
        return 1;
    };
    if json {
        return match serde_json::to_string_pretty(&note) {
            Ok(text) => {
                println!("{}", text);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        };
    }

    println!("{}", note.label());
    println!("  id:      {}", note.id);
    println!("  created: {}", note.created_display());
    let sections = [
        ("outbound", engine.outbound(id)),
        ("inbound", engine.inbound(id)),
    ];
    for (name, neighbours) in sections {
        let neighbours = neighbours.unwrap_or_default();
        println!("  {} ({}):", name, neighbours.len());
        for n in neighbours {
            println!("    {}  {}", n.id, n.label());
        }
    }
    if !note.dead_links.is_empty() {
        println!("  dead links ({}):", note.dead_links.len());
        for token in &note.dead_links {
            println!("    {}", token);
        }
    }
    for warning in &note.warnings {
        println!("  warning: {}", warning);
    }
    0
}

fn cmd_warnings(engine: &ZettelEngine) -> i32 {
    let notes = engine.with_warnings();
    for note in &notes {
        for warning in &note.warnings {
            println!("{}  {}", note.id, warning);
        }
    }
    if notes.is_empty() {
        println!("No warnings");
    }
    0
}

fn cmd_new(session: &Session, id: Option<String>, title: Option<String>) -> i32 {
    let request = NewNote {
        id: id.map(NoteId::from),
        title,
    };
    match session.engine.new_note(request) {
        Ok(note) => {
            println!("{}", session.store.path_for(&note.id).display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_uid(engine: &ZettelEngine, from: Option<&str>) -> i32 {
    match from {
        None => match engine.next_id() {
            Ok(id) => {
                println!("{}", id);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Some(text) => match engine.id_from_text(text) {
            Some(id) => {
                println!("{}", id);
                0
            }
            None => {
                eprintln!("Error: could not parse '{}' to an identifier", text);
                1
            }
        },
    }
}

fn cmd_link(engine: &ZettelEngine, id: &str, url: bool) -> i32 {
    let Some(note) = engine.lookup(id) else {
        eprintln!("Error: note '{}' not found", id);
        return 1;
    };
    if url {
        println!("{}", url_link(engine.url_scheme(), &note.id));
    } else {
        println!("{}", reference_link(&note.id));
    }
    0
}

fn cmd_touch(engine: &ZettelEngine, id: &str) -> i32 {
    match engine.touch(&NoteId::from(id)) {
        Ok(true) => 0,
        Ok(false) => {
            eprintln!("Note '{}' has no Modified header", id);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

async fn watch_loop(engine: &ZettelEngine, folder: &Path, extension: &str) -> Result<(), ZettelError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _watcher = FolderWatcher::start(folder, extension, tx)?;
    let mut events = engine.events().listen();

    let printer = async {
        loop {
            match events.recv().await {
                Ok(event) if event.topic != Topic::TreeChange => {
                    println!("{:<8} {}", event.topic, summary(&event.note));
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "event printer fell behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    tokio::select! {
        applied = zettel::watch::drive(engine, &mut rx) => {
            tracing::info!(applied, "watcher stopped");
        }
        _ = printer => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
        }
    }
    Ok(())
}

fn cmd_watch(session: &Session) -> i32 {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {}", e);
            return 1;
        }
    };
    let store = &session.store;
    match runtime.block_on(watch_loop(&session.engine, store.folder(), store.extension())) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let session = match open_session(cli.workspace, cli.config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let engine = &session.engine;

    let code = match cli.command {
        Commands::List => cmd_list(engine),
        Commands::Show { id, json } => cmd_show(engine, &id, json),
        Commands::Warnings => cmd_warnings(engine),
        Commands::New { id, title } => cmd_new(&session, id, title),
        Commands::Uid { from } => cmd_uid(engine, from.as_deref()),
        Commands::Link { id, url } => cmd_link(engine, &id, url),
        Commands::Touch { id } => cmd_touch(engine, &id),
        Commands::Watch => cmd_watch(&session),
    };
    std::process::exit(code);
}
