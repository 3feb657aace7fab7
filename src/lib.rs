pub mod catalog;
pub mod daemon;
pub mod error;
pub mod format;
pub mod model;
pub mod operation;
pub mod picker;
pub mod prompt;
pub mod theme;
