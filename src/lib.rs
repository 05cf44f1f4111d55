pub mod cli;
pub mod engine;
pub mod host;
pub mod io;
pub mod model;
pub mod ops;
pub mod store;
pub mod util;
