//! Source data held in memory between builds.
//!
//! ```text
//! disk ──warm()/read()──► ContentStore ──templates()──► Renderer
//!                              │
//!                              └──get()──► Page::parse_string
//! ```

mod store;

pub use store::{ContentStore, MARKDOWN_EXTENSIONS, Templates};
