//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn title() -> String {
        "My Site".into()
    }

    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        "<YOUR_NAME>".into()
    }

    pub fn language() -> String {
        "en-US".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn layouts() -> PathBuf {
        "layouts".into()
    }

    pub fn r#static() -> PathBuf {
        "static".into()
    }

    pub fn output() -> PathBuf {
        "output".into()
    }

    pub mod markdown {
        pub fn default_layout() -> String {
            "markdown.html".into()
        }
    }
}

// ============================================================================
// [serve] Section Defaults
// ============================================================================

pub mod serve {
    pub fn interface() -> String {
        "127.0.0.1".into()
    }

    pub fn port() -> u16 {
        8000
    }
}
