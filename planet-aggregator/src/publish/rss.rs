use crate::traits::Publisher;
use crate::types::{PostRecord, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

pub const RSS_FILE: &str = "rss.xml";

/// Re-publishes the aggregate as an RSS 2.0 document.
pub struct RssPublisher {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl RssPublisher {
    pub fn new(title: impl Into<String>, link: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: description.into(),
        }
    }

    pub fn render(&self, posts: &[PostRecord]) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(
            BytesStart::new("rss").with_attributes([("version", "2.0")]),
        ))?;
        writer.write_event(Event::Start(BytesStart::new("channel")))?;

        text_element(&mut writer, "title", &self.title)?;
        text_element(&mut writer, "link", &self.link)?;
        text_element(&mut writer, "description", &self.description)?;
        text_element(&mut writer, "lastBuildDate", &Utc::now().to_rfc2822())?;

        for post in posts {
            writer.write_event(Event::Start(BytesStart::new("item")))?;

            text_element(&mut writer, "title", &post.title)?;
            text_element(&mut writer, "link", &post.link)?;
            text_element(&mut writer, "guid", &post.link)?;
            if let Some(author) = &post.author {
                text_element(&mut writer, "author", author)?;
            }
            for category in &post.categories {
                text_element(&mut writer, "category", category)?;
            }
            if let Some(published) = DateTime::<Utc>::from_timestamp(post.sort_key, 0) {
                text_element(&mut writer, "pubDate", &published.to_rfc2822())?;
            }
            text_element(&mut writer, "description", &post.content)?;

            writer.write_event(Event::End(BytesEnd::new("item")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("channel")))?;
        writer.write_event(Event::End(BytesEnd::new("rss")))?;

        let mut document = writer.into_inner();
        document.write_all(b"\n")?;
        Ok(document)
    }
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

impl Publisher for RssPublisher {
    fn name(&self) -> &str {
        "rss"
    }

    fn publish(&self, posts: &[PostRecord], output_dir: &Path) -> Result<()> {
        let document = self.render(posts)?;
        let path = output_dir.join(RSS_FILE);
        fs::write(&path, document)?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}
