use crate::traits::Publisher;
use crate::types::{PostRecord, Result};
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const PAGE_FILE: &str = "index.html";

/// Renders the aggregate as a single static html page.
pub struct PagePublisher {
    pub title: String,
    pub description: String,
}

impl PagePublisher {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn render(&self, posts: &[PostRecord]) -> String {
        let mut page = String::new();

        page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(page, "<title>{}</title>", text(&self.title));
        page.push_str("<link rel=\"alternate\" type=\"application/rss+xml\" href=\"rss.xml\">\n");
        page.push_str("</head>\n<body>\n");
        let _ = writeln!(page, "<h1>{}</h1>", text(&self.title));
        if !self.description.is_empty() {
            let _ = writeln!(page, "<p class=\"description\">{}</p>", text(&self.description));
        }

        for post in posts {
            self.render_post(&mut page, post);
        }

        page.push_str("</body>\n</html>\n");
        page
    }

    fn render_post(&self, page: &mut String, post: &PostRecord) {
        page.push_str("<article>\n<header>\n");

        if let Some(avatar) = &post.avatar {
            let _ = writeln!(page, "<img class=\"avatar\" src=\"{}\" alt=\"\">", attr(avatar));
        }

        let _ = writeln!(
            page,
            "<h2><a href=\"{}\">{}</a></h2>",
            attr(&post.link),
            text(&post.title)
        );

        let byline = post
            .author
            .as_deref()
            .or(post.source_name.as_deref())
            .unwrap_or_default();
        let _ = write!(
            page,
            "<p class=\"meta\"><a href=\"{}\">{}</a> <time>{}</time>",
            attr(&post.channel),
            text(byline),
            text(&post.date)
        );
        if let Some(update) = &post.update {
            let _ = write!(page, " <span class=\"updated\">updated {}</span>", text(update));
        }
        page.push_str("</p>\n");

        if !post.categories.is_empty() {
            page.push_str("<ul class=\"categories\">");
            for category in &post.categories {
                let _ = write!(page, "<li>{}</li>", text(category));
            }
            page.push_str("</ul>\n");
        }

        page.push_str("</header>\n");

        // Already sanitized by the normalizer
        page.push_str("<div class=\"content\">");
        page.push_str(&post.content);
        page.push_str("</div>\n</article>\n");
    }
}

impl Publisher for PagePublisher {
    fn name(&self) -> &str {
        "page"
    }

    fn publish(&self, posts: &[PostRecord], output_dir: &Path) -> Result<()> {
        let path = output_dir.join(PAGE_FILE);
        fs::write(&path, self.render(posts))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}
