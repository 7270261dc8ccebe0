//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the library browser,
//! the queue pane cursor and view state.

mod model;

pub use model::*;
