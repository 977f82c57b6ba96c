//! Dependency resolution between templates and pages.
//!
//! The graph is never stored. Every query rebuilds the edges from the
//! current cache contents:
//!
//! ```text
//! layouts/basic.html ◄── extends ── layouts/markdown.html ◄── (default layout) ── articles/*.md
//!         ▲
//!         └──────────── extends ── content/index.html
//! ```
//!
//! Edges come from static analysis of template bodies
//! ([`referenced_templates`]) plus the implicit edge from every Markdown
//! page to its layout. A query costs one scan of every template and page
//! body; an adjacency map updated on each cache write would make queries
//! cheaper at the price of keeping it in sync.

use super::Site;
use crate::render::referenced_templates;
use crate::{debug, log};
use anyhow::Result;
use rustc_hash::FxHashSet;
use std::collections::{BTreeMap, BTreeSet};

impl Site {
    /// Pages whose output changes when `template_id` changes.
    ///
    /// Intermediate layouts are followed but not reported, since they have
    /// no output of their own. The walk tracks visited identifiers, so
    /// cyclic references terminate. `template_id` itself is never reported.
    pub fn list_dependents(&self, template_id: &str) -> Vec<String> {
        let default_layout = self.config().build.markdown.default_layout.as_str();

        let templates = self.store().templates();
        let template_refs: BTreeMap<&str, BTreeSet<String>> = templates
            .iter()
            .map(|(id, text)| (id.as_str(), referenced_templates(text)))
            .collect();
        let page_refs: BTreeMap<&str, BTreeSet<String>> = self
            .pagedata()
            .values()
            .map(|page| {
                let body = page.body.as_deref().unwrap_or_default();
                (page.filepath.as_str(), referenced_templates(body))
            })
            .collect();

        let mut dependents = BTreeSet::new();
        let mut visited = FxHashSet::default();
        visited.insert(template_id.to_owned());
        let mut pending = vec![template_id.to_owned()];

        while let Some(current) = pending.pop() {
            // Markdown pages reference their layout implicitly
            for page in self.pagedata().values().filter(|p| p.is_markdown()) {
                if page.layout(default_layout) == current {
                    dependents.insert(page.filepath.clone());
                }
            }

            for (id, refs) in &template_refs {
                if refs.contains(&current) && visited.insert((*id).to_owned()) {
                    pending.push((*id).to_owned());
                }
            }

            for (filepath, refs) in &page_refs {
                if refs.contains(&current) {
                    dependents.insert((*filepath).to_owned());
                    if visited.insert((*filepath).to_owned()) {
                        pending.push((*filepath).to_owned());
                    }
                }
            }
        }

        dependents.remove(template_id);
        debug!("deps"; "{template_id}: {} dependents", dependents.len());
        dependents.into_iter().collect()
    }

    /// Re-render every dependent of `template_id` to disk.
    ///
    /// A page that fails to render is reported and skipped. Returns the
    /// filepaths that were rendered.
    pub fn render_dependents(&mut self, template_id: &str) -> Result<Vec<String>> {
        let dependents = self.list_dependents(template_id);
        if dependents.is_empty() {
            return Ok(dependents);
        }

        let ctx = self.render_context();
        let output = self.paths().output.clone();
        let mut rendered = Vec::with_capacity(dependents.len());

        for filepath in dependents {
            let Some(page) = self.pagedata.get_mut(&filepath) else {
                continue;
            };
            match page.render_to_disk(&ctx, &output) {
                Ok(_) => rendered.push(filepath),
                Err(err) => log!("error"; "failed to render {filepath}: {err:#}"),
            }
        }

        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::tests::{config_for, sample_site, write};
    use tempfile::TempDir;

    #[test]
    fn test_default_layout_with_single_markdown_page() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layouts/markdown.html", "{{ content }}");
        write(dir.path(), "content/hello.md", "title = Hello\n++++\nhi");
        let site = Site::open(config_for(dir.path()), false).unwrap();

        assert_eq!(site.list_dependents("markdown.html"), vec!["hello.md"]);
    }

    #[test]
    fn test_template_override_is_a_dependency() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layouts/markdown.html", "{{ content }}");
        write(dir.path(), "layouts/post.html", "<article>{{ content }}</article>");
        write(dir.path(), "content/a.md", "title = A\n++++\na");
        write(dir.path(), "content/b.md", "title = B\ntemplate = post.html\n++++\nb");
        let site = Site::open(config_for(dir.path()), false).unwrap();

        assert_eq!(site.list_dependents("markdown.html"), vec!["a.md"]);
        assert_eq!(site.list_dependents("post.html"), vec!["b.md"]);
    }

    #[test]
    fn test_transitive_through_layouts() {
        let dir = TempDir::new().unwrap();
        sample_site(dir.path());
        let site = Site::open(config_for(dir.path()), false).unwrap();

        // basic.html ← markdown.html ← both articles; basic.html ← index.html
        assert_eq!(
            site.list_dependents("basic.html"),
            vec!["articles/hello.md", "articles/second.md", "index.html"]
        );
    }

    #[test]
    fn test_page_referenced_by_another_page() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "content/partials/nav.html", "<nav/>");
        write(dir.path(), "content/index.html", "{% include \"partials/nav.html\" %}");
        write(dir.path(), "content/about.html", "{% include \"index.html\" %}");
        let site = Site::open(config_for(dir.path()), false).unwrap();

        assert_eq!(
            site.list_dependents("partials/nav.html"),
            vec!["about.html", "index.html"]
        );
    }

    #[test]
    fn test_unrelated_template_has_no_dependents() {
        let dir = TempDir::new().unwrap();
        sample_site(dir.path());
        write(dir.path(), "layouts/unused.html", "nothing");
        let site = Site::open(config_for(dir.path()), false).unwrap();

        assert!(site.list_dependents("unused.html").is_empty());
    }

    #[test]
    fn test_cyclic_includes_terminate() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "layouts/a.html", "{% if false %}{% include \"b.html\" %}{% endif %}");
        write(dir.path(), "layouts/b.html", "{% if false %}{% include \"a.html\" %}{% endif %}");
        write(dir.path(), "content/page.html", "{% include \"a.html\" %}");
        let site = Site::open(config_for(dir.path()), false).unwrap();

        assert_eq!(site.list_dependents("a.html"), vec!["page.html"]);
        assert_eq!(site.list_dependents("b.html"), vec!["page.html"]);
    }

    #[test]
    fn test_self_reference_is_not_reported() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "content/loop.html",
            "{% if false %}{% include \"loop.html\" %}{% endif %}",
        );
        let site = Site::open(config_for(dir.path()), false).unwrap();

        assert!(site.list_dependents("loop.html").is_empty());
    }

    #[test]
    fn test_render_dependents_of_layout() {
        let dir = TempDir::new().unwrap();
        sample_site(dir.path());
        let mut site = Site::open(config_for(dir.path()), false).unwrap();
        site.build().unwrap();

        let rendered = site.render_dependents("markdown.html").unwrap();
        assert_eq!(rendered, vec!["articles/hello.md", "articles/second.md"]);
    }
}
