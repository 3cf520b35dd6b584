//! Page rendering with a user-supplied template.
//!
//! Unlike the entry document (see [`crate::entry`]), page markup belongs to
//! the user: it lives in a Jinja-style template file that is re-read on every
//! rebuild, so edits show up without recompiling. Templates are rendered
//! with [minijinja](https://docs.rs/minijinja).
//!
//! ## Template Context
//!
//! | Variable | Value |
//! |----------|-------|
//! | `books_pairs` | list of groups, each a list of one or two books |
//! | `current_page` | 1-based page number |
//! | `total_pages` | number of pages in this rebuild |
//! | `prev_page` | `index<N-1>.html`, or none on the first page |
//! | `next_page` | `index<N+1>.html`, or none on the last page |
//! | `asset_base_path` | base path for shared static assets |
//! | `bootstrap_path` | stylesheet URL |
//! | `bootstrap_js_path` | script URL |
//!
//! A book exposes `img_src` and `book_path` (already normalized) when they
//! exist, plus every other catalog field under its own name.
//!
//! ## Escaping and Undefined Values
//!
//! Auto-escaping is HTML for every template regardless of file extension:
//! catalog text is untrusted. Printing an undefined value is an error, but
//! `{% if book.img_src is defined %}` and plain `{% if prev_page %}` are
//! allowed, so optional fields can be handled in the template.

use crate::catalog::Book;
use crate::paginate::Page;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, context};
use serde::Serialize;

/// Asset URLs shared by every page of a rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetPaths {
    pub base_path: String,
    pub stylesheet: String,
    pub script: String,
}

impl AssetPaths {
    /// Join stylesheet and script file names onto `base_path`.
    pub fn new(base_path: &str, stylesheet: &str, script: &str) -> Self {
        Self {
            base_path: base_path.to_string(),
            stylesheet: join_url(base_path, stylesheet),
            script: join_url(base_path, script),
        }
    }
}

fn join_url(base: &str, file: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        file.to_string()
    } else {
        format!("{base}/{}", file.trim_start_matches('/'))
    }
}

/// A parsed page template.
pub struct PageTemplate<'source> {
    env: Environment<'source>,
    name: &'source str,
}

impl<'source> PageTemplate<'source> {
    /// Parse `source` under `name`. Syntax errors surface here.
    pub fn new(name: &'source str, source: &'source str) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
        env.add_template(name, source)?;
        Ok(Self { env, name })
    }

    /// Render one page.
    pub fn render(&self, page: &Page<'_, Book>, assets: &AssetPaths) -> Result<String, minijinja::Error> {
        let template = self.env.get_template(self.name)?;
        template.render(context! {
            books_pairs => &page.groups,
            current_page => page.number,
            total_pages => page.total_pages,
            prev_page => page.previous,
            next_page => page.next,
            asset_base_path => &assets.base_path,
            bootstrap_path => &assets.stylesheet,
            bootstrap_js_path => &assets.script,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use crate::paginate::paginate;
    use crate::test_helpers::{books, page_size};

    const LIST: &str = "{% for pair in books_pairs %}[{% for book in pair %}{{ book.title }};{% endfor %}]{% endfor %}";

    fn assets() -> AssetPaths {
        AssetPaths::new("../static", "bootstrap.min.css", "bootstrap.bundle.min.js")
    }

    #[test]
    fn asset_paths_join_base() {
        let a = assets();
        assert_eq!(a.stylesheet, "../static/bootstrap.min.css");
        assert_eq!(a.script, "../static/bootstrap.bundle.min.js");
        assert_eq!(AssetPaths::new("", "s.css", "s.js").stylesheet, "s.css");
        assert_eq!(AssetPaths::new("/cdn/", "s.css", "s.js").stylesheet, "/cdn/s.css");
    }

    #[test]
    fn renders_groups_in_order() {
        let books = books(5);
        let pages = paginate(&books, page_size(5));
        let tmpl = PageTemplate::new("page.html", LIST).unwrap();
        let html = tmpl.render(&pages[0], &assets()).unwrap();
        assert_eq!(html, "[Book 1;Book 2;][Book 3;Book 4;][Book 5;]");
    }

    #[test]
    fn binds_pagination_metadata() {
        let books = books(45);
        let pages = paginate(&books, page_size(20));
        let tmpl = PageTemplate::new(
            "page.html",
            "{{ current_page }}/{{ total_pages }} prev={{ prev_page }} next={{ next_page }}",
        )
        .unwrap();
        let html = tmpl.render(&pages[1], &assets()).unwrap();
        assert_eq!(html, "2/3 prev=index1.html next=index3.html");
    }

    #[test]
    fn boundary_refs_are_falsy() {
        let books = books(3);
        let pages = paginate(&books, page_size(20));
        let tmpl = PageTemplate::new(
            "page.html",
            "{% if prev_page %}P{% endif %}{% if next_page %}N{% endif %}-",
        )
        .unwrap();
        assert_eq!(tmpl.render(&pages[0], &assets()).unwrap(), "-");
    }

    #[test]
    fn escapes_catalog_text() {
        let books = parse_catalog(r#"[{"title": "<script>alert('xss')</script>"}]"#).unwrap();
        let pages = paginate(&books, page_size(20));
        let tmpl = PageTemplate::new("page.txt", LIST).unwrap();
        let html = tmpl.render(&pages[0], &assets()).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn optional_fields_can_be_tested() {
        let books = parse_catalog(r#"[{"title": "A", "img_src": "a.jpg"}, {"title": "B"}]"#).unwrap();
        let pages = paginate(&books, page_size(20));
        let tmpl = PageTemplate::new(
            "page.html",
            "{% for pair in books_pairs %}{% for book in pair %}{{ book.title }}{% if book.img_src is defined %}+img{% endif %};{% endfor %}{% endfor %}",
        )
        .unwrap();
        assert_eq!(tmpl.render(&pages[0], &assets()).unwrap(), "A+img;B;");
    }

    #[test]
    fn printing_undefined_value_fails() {
        let books = books(1);
        let pages = paginate(&books, page_size(20));
        let tmpl = PageTemplate::new("page.html", "{{ no_such_variable }}").unwrap();
        assert!(tmpl.render(&pages[0], &assets()).is_err());
    }

    #[test]
    fn syntax_error_fails_at_parse() {
        assert!(PageTemplate::new("page.html", "{% for x in %}").is_err());
    }

    #[test]
    fn exposes_asset_constants() {
        let books = books(1);
        let pages = paginate(&books, page_size(20));
        let tmpl = PageTemplate::new(
            "page.txt",
            "{{ asset_base_path }}|{{ bootstrap_path }}|{{ bootstrap_js_path }}",
        )
        .unwrap();
        let out = tmpl
            .render(&pages[0], &AssetPaths::new("static", "a.css", "b.js"))
            .unwrap();
        // minijinja's HTML escaping also encodes `/`, so only check the pieces.
        assert!(out.starts_with("static|"));
        assert!(out.contains("a.css|"));
        assert!(out.ends_with("b.js"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let books = books(30);
        let pages = paginate(&books, page_size(10));
        let tmpl = PageTemplate::new("page.html", LIST).unwrap();
        for page in &pages {
            assert_eq!(
                tmpl.render(page, &assets()).unwrap(),
                tmpl.render(page, &assets()).unwrap()
            );
        }
    }
}
