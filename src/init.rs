//! Site initialization module.
//!
//! Creates a starter project: a home page, an article listing, one sample
//! article, an RSS feed, two layouts and a stylesheet.

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Placeholder base URL, so the starter feed has absolute links
const STARTER_URL: &str = "https://example.com";

/// Starter files, relative to the content, layouts and static directories
const CONTENT_FILES: &[(&str, &str)] = &[
    ("index.html", include_str!("embed/init/content/index.html")),
    ("articles.html", include_str!("embed/init/content/articles.html")),
    (
        "articles/hello-world.md",
        include_str!("embed/init/content/articles/hello-world.md"),
    ),
    ("feed.xml", include_str!("embed/init/content/feed.xml")),
];
const LAYOUT_FILES: &[(&str, &str)] = &[
    ("basic.html", include_str!("embed/init/layouts/basic.html")),
    ("markdown.html", include_str!("embed/init/layouts/markdown.html")),
];
const STATIC_FILES: &[(&str, &str)] = &[("site.css", include_str!("embed/init/static/site.css"))];

/// Create a new site at the configured root.
///
/// Refuses a non-empty directory unless `force` is set, in which case
/// existing starter files are overwritten.
pub fn new_site(config: &SiteConfig, force: bool) -> Result<()> {
    let root = config.get_root();

    if !force && !is_dir_empty(root)? {
        bail!(
            "{} is not empty. Use `glaze init --force` to initialize anyway.",
            root.display()
        );
    }

    let paths = config.paths();
    for (dir, files) in [
        (&paths.content, CONTENT_FILES),
        (&paths.layouts, LAYOUT_FILES),
        (&paths.static_dir, STATIC_FILES),
    ] {
        for (rel, body) in files {
            write_file(&dir.join(rel), body)?;
        }
    }

    init_default_config(&config.config_path)?;
    init_ignored_files(root, &[config.build.output.as_path()])?;

    log!("init"; "created site at {}", root.display());
    Ok(())
}

/// Check if a directory is completely empty
fn is_dir_empty(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    Ok(fs::read_dir(path)
        .with_context(|| format!("Failed to read {}", path.display()))?
        .next()
        .is_none())
}

fn write_file(path: &Path, body: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write default configuration file
fn init_default_config(path: &Path) -> Result<()> {
    let mut config = SiteConfig::default();
    config.base.url = Some(STARTER_URL.to_owned());
    let content = toml::to_string_pretty(&config)?;
    write_file(path, &content)
}

/// Initialize .gitignore and .ignore files with specified paths
fn init_ignored_files(root: &Path, paths: &[&Path]) -> Result<()> {
    let content = paths
        .iter()
        .filter_map(|p| p.to_str())
        .map(|p| format!("/{p}/\n"))
        .collect::<String>();

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}
