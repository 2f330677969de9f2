//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the browse lists, the
//! open track list, the search input and the status notice.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
