pub mod actions;
pub mod collection;
pub mod config;
pub mod fixture;
pub mod gesture;
pub mod persistence;
pub mod reducer;
pub mod resolution;
pub mod stack;
pub mod state;
pub mod undo;
pub mod window;

pub use actions::*;
pub use reducer::*;
pub use state::*;

pub use persistence::*;
