use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tf", about = concat!("tabfold v", env!("CARGO_PKG_VERSION"), " - tabs grouped by site, split into sessions"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// State directory holding browser.json, config.toml and store/ (default: ./.tabfold)
    #[arg(short = 'C', long = "state-dir", global = true)]
    pub state_dir: Option<String>,

    /// Organize this window instead of the focused one
    #[arg(long, global = true)]
    pub window: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the grouped view of the active session
    View(ViewArgs),
    /// Open a new tab (blank when no URL is given)
    New(NewArgs),
    /// Activate a tab and focus its window
    Activate(TabArg),
    /// Pin or unpin a tab
    Pin(TabArg),
    /// Close a tab
    Close(TabArg),
    /// Drop a tab onto another tab's position
    Move(MoveArgs),
    /// Replace a tab's URL (bare hosts get http://)
    EditUrl(EditUrlArgs),
    /// Copy a tab's URL to the clipboard
    CopyUrl(TabArg),
    /// Move a tab into a new window
    Detach(TabArg),
    /// Collapse or expand a site group
    Collapse(CollapseArgs),
    /// Session management
    Session(SessionCmd),
    /// Open the best history match for a query, or search the web
    Go(GoArgs),
    /// Re-render whenever browser.json changes
    Watch(WatchArgs),
}

#[derive(Args)]
pub struct ViewArgs {
    /// Only show tabs whose title or URL contains this text
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args)]
pub struct NewArgs {
    pub url: Option<String>,
}

#[derive(Args)]
pub struct TabArg {
    /// Tab id
    pub tab: u64,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Tab being dragged
    pub tab: u64,
    /// Tab it is dropped on
    pub target: u64,
}

#[derive(Args)]
pub struct EditUrlArgs {
    pub tab: u64,
    /// New URL text
    pub text: String,
}

#[derive(Args)]
pub struct CollapseArgs {
    /// Group key (host, scheme, or "other")
    pub group: String,
}

#[derive(Args)]
pub struct SessionCmd {
    #[command(subcommand)]
    pub action: SessionAction,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// List sessions with their tab counts
    List,
    /// Create a session and switch to it
    New {
        /// Session title (default: "session N")
        #[arg(default_value = "")]
        title: String,
    },
    /// Rename a session
    Rename { id: String, title: String },
    /// Make a session active
    Switch { id: String },
    /// Close a session and all of its tabs
    Close { id: String },
}

#[derive(Args)]
pub struct GoArgs {
    /// Text to look up in history
    pub query: String,
    /// Always run a web search
    #[arg(long)]
    pub search: bool,
}

#[derive(Args)]
pub struct WatchArgs {
    /// Exit after this many re-renders
    #[arg(long)]
    pub limit: Option<usize>,
}
