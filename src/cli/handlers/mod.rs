use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::engine::{Engine, Outcome};
use crate::host::MemoryBrowser;
use crate::io::config_io;
use crate::io::kv_store::FileStore;
use crate::io::lock::StateLock;
use crate::io::snapshot::{self, load_snapshot, save_snapshot};
use crate::io::watcher::SnapshotWatcher;
use crate::model::config::EngineConfig;
use crate::model::tab::WindowId;
use crate::model::view::RenderModel;

type CliResult = Result<(), Box<dyn std::error::Error>>;

type CliEngine = Engine<MemoryBrowser, FileStore>;

/// Default state directory, relative to the working directory
const DEFAULT_STATE_DIR: &str = ".tabfold";

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CliResult {
    let state_dir = resolve_state_dir(cli.state_dir.as_deref())?;
    let ctx = Context {
        state_dir,
        json: cli.json,
        window: cli.window,
    };

    match cli.command {
        Commands::View(args) => ctx.run(|engine| {
            if let Some(filter) = &args.filter {
                engine.set_filter(filter);
            }
            Ok(Outcome::Applied)
        }),
        Commands::New(args) => ctx.run(|engine| Ok(engine.new_tab(args.url.as_deref()))),
        Commands::Activate(args) => ctx.run(|engine| Ok(engine.activate_tab(args.tab))),
        Commands::Pin(args) => ctx.run(|engine| Ok(engine.toggle_pin(args.tab))),
        Commands::Close(args) => ctx.run(|engine| Ok(engine.close_tab(args.tab))),
        Commands::Move(args) => ctx.run(|engine| Ok(engine.reorder(Some(args.tab), args.target))),
        Commands::EditUrl(args) => ctx.run(|engine| {
            if !engine.begin_edit(args.tab).is_applied() {
                return Ok(Outcome::Ignored);
            }
            engine.edit_text(&args.text);
            Ok(engine.submit_edit())
        }),
        Commands::CopyUrl(args) => ctx.run(|engine| {
            let outcome = engine.copy_url(args.tab);
            if outcome.is_applied()
                && let Some(text) = engine.host().clipboard()
            {
                eprintln!("copied {}", text);
            }
            Ok(outcome)
        }),
        Commands::Detach(args) => ctx.run(|engine| Ok(engine.move_to_new_window(args.tab))),
        Commands::Collapse(args) => ctx.run(|engine| {
            let collapsed = engine.toggle_collapse(&args.group);
            debug!(group = %args.group, collapsed, "collapse toggled");
            Ok(Outcome::Applied)
        }),
        Commands::Session(cmd) => cmd_session(&ctx, cmd.action),
        Commands::Go(args) => ctx.run(|engine| {
            let found = engine.set_query(&args.query);
            debug!(query = %args.query, found, "history lookup");
            Ok(engine.submit_query(args.search))
        }),
        Commands::Watch(args) => cmd_watch(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resolve_state_dir(arg: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let dir = match arg {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?.join(DEFAULT_STATE_DIR),
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("cannot create state directory '{}': {}", dir.display(), e))?;
    Ok(dir)
}

struct Context {
    state_dir: PathBuf,
    json: bool,
    window: Option<WindowId>,
}

impl Context {
    /// Build an engine over the state directory's snapshot and store.
    fn open(&self, config: EngineConfig) -> Result<CliEngine, Box<dyn std::error::Error>> {
        let mut browser = MemoryBrowser::from_snapshot(load_snapshot(&self.state_dir)?);
        if browser.window_ids().is_empty() {
            let w = browser.external_open_window();
            info!(window = w, "no windows in snapshot, opened one");
        }
        let store = FileStore::new(self.state_dir.join("store"));
        let mut engine = match self.window {
            Some(w) => Engine::for_window(browser, store, config, w),
            None => Engine::new(browser, store, config),
        };
        engine.refresh();
        if engine.model().window_id.is_none() {
            return Err(match self.window {
                Some(w) => format!("no window with id {}", w).into(),
                None => "no window to organize".into(),
            });
        }
        Ok(engine)
    }

    /// Lock the state directory, run one intent, persist the browser and
    /// print the resulting view.
    fn run<F>(&self, intent: F) -> CliResult
    where
        F: FnOnce(&mut CliEngine) -> Result<Outcome, Box<dyn std::error::Error>>,
    {
        let _lock = StateLock::acquire_default(&self.state_dir)?;
        let config = config_io::read_config(&self.state_dir)?;
        let mut engine = self.open(config)?;

        let outcome = intent(&mut engine)?;
        save_snapshot(&self.state_dir, engine.host().snapshot())?;

        match outcome {
            Outcome::Applied => {}
            Outcome::Ignored => eprintln!("nothing to do"),
            Outcome::Failed(e) => return Err(e.into()),
        }
        self.print_view(engine.model())
    }

    fn print_view(&self, model: &RenderModel) -> CliResult {
        if self.json {
            print_json(model)?;
        } else {
            print!("{}", render_view(model));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

fn cmd_session(ctx: &Context, action: SessionAction) -> CliResult {
    let _lock = StateLock::acquire_default(&ctx.state_dir)?;
    let config = config_io::read_config(&ctx.state_dir)?;
    let mut engine = ctx.open(config)?;

    let outcome = match action {
        SessionAction::List => {
            let sessions = &engine.model().sessions;
            if ctx.json {
                print_json(sessions)?;
            } else {
                print!("{}", render_sessions(sessions));
            }
            return Ok(());
        }
        SessionAction::New { title } => match engine.create_session(&title) {
            Some(id) => {
                eprintln!("created session {}", id);
                Outcome::Applied
            }
            None => Outcome::Ignored,
        },
        SessionAction::Rename { id, title } => {
            let id = session_id(engine.model(), &id)?;
            engine.rename_session(&id, &title)
        }
        SessionAction::Switch { id } => {
            let id = session_id(engine.model(), &id)?;
            engine.switch_session(&id)
        }
        SessionAction::Close { id } => {
            let id = session_id(engine.model(), &id)?;
            engine.close_session(&id)
        }
    };

    save_snapshot(&ctx.state_dir, engine.host().snapshot())?;
    match outcome {
        Outcome::Applied => {}
        Outcome::Ignored => eprintln!("nothing to do"),
        Outcome::Failed(e) => return Err(e.into()),
    }
    if ctx.json {
        print_json(&engine.model().sessions)?;
    } else {
        print!("{}", render_sessions(&engine.model().sessions));
    }
    Ok(())
}

/// Accept a session id or an unambiguous title.
fn session_id(model: &RenderModel, needle: &str) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(s) = model.sessions.iter().find(|s| s.id == needle) {
        return Ok(s.id.clone());
    }
    let by_title: Vec<_> = model.sessions.iter().filter(|s| s.title == needle).collect();
    match by_title.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => Err(format!("no session '{}'", needle).into()),
        _ => Err(format!("'{}' matches {} sessions, use an id", needle, by_title.len()).into()),
    }
}

// ---------------------------------------------------------------------------
// Watch
// ---------------------------------------------------------------------------

fn cmd_watch(ctx: &Context, args: WatchArgs) -> CliResult {
    let config = config_io::read_config(&ctx.state_dir)?;
    let debounce = Duration::from_millis(config.debounce_ms);
    let snapshot_file = snapshot::snapshot_path(&ctx.state_dir);
    let watcher = SnapshotWatcher::start(&snapshot_file)?;

    let mut engine = locked_open(ctx, &config)?;
    ctx.print_view(engine.model())?;

    let mut renders = 0usize;
    while args.limit.is_none_or(|limit| renders < limit) {
        if !watcher.wait(Duration::from_secs(1), debounce) {
            continue;
        }
        let _lock = StateLock::acquire_default(&ctx.state_dir)?;
        match load_snapshot(&ctx.state_dir) {
            Ok(snap) => {
                *engine.host_mut() = MemoryBrowser::from_snapshot(snap);
                engine.reload_stores();
            }
            Err(e) => {
                eprintln!("warning: {}", e);
                continue;
            }
        }
        engine.refresh();
        ctx.print_view(engine.model())?;
        renders += 1;
    }
    Ok(())
}

fn locked_open(ctx: &Context, config: &EngineConfig) -> Result<CliEngine, Box<dyn std::error::Error>> {
    let _lock = StateLock::acquire_default(&ctx.state_dir)?;
    ctx.open(config.clone())
}
