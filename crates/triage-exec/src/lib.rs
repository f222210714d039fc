pub mod collaborators;
pub mod contracts;
pub mod dispatch;

pub use collaborators::*;
pub use contracts::*;
pub use dispatch::*;
