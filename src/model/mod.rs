pub mod tab;
pub mod session;
pub mod view;
pub mod config;

pub use tab::*;
pub use session::*;
pub use view::*;
pub use config::*;
