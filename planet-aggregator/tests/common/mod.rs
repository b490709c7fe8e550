#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use planet_aggregator::types::{ChannelMeta, RawEntry, SourceSpec};
use planet_aggregator::FetchEntries;
use std::collections::HashMap;
use std::sync::{Mutex, Once};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .try_init()
            .ok();
    });
}

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().expect("valid timestamp")
}

/// An entry published at `published` that was never edited.
pub fn raw_entry(channel: &str, link: &str, published: i64) -> RawEntry {
    RawEntry {
        title: format!("Post {}", link),
        author: Some("Alice".to_string()),
        pubdate: Some(at(published)),
        date: Some(at(published)),
        link: link.to_string(),
        origlink: None,
        summary: Some("summary".to_string()),
        description: "<p>body</p>".to_string(),
        categories: vec!["rust".to_string()],
        meta: ChannelMeta {
            link: channel.to_string(),
            xmlurl: "/feed.xml".to_string(),
            title: Some("Channel".to_string()),
        },
    }
}

/// Serves canned entries per source link and remembers the order it was asked in.
#[derive(Default)]
pub struct StubSource {
    entries: HashMap<String, Vec<RawEntry>>,
    calls: Mutex<Vec<String>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, source: &SourceSpec, entries: Vec<RawEntry>) -> Self {
        self.entries.insert(source.link.clone(), entries);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl FetchEntries for StubSource {
    async fn fetch(&self, source: &SourceSpec) -> Vec<RawEntry> {
        self.calls.lock().expect("calls lock").push(source.link.clone());
        self.entries.get(&source.link).cloned().unwrap_or_default()
    }
}

/// Serve one canned HTTP response per connection on a local port, returning the base url.
pub async fn serve(head: String, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let head = head.clone();
            let body = body.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                // the client may hang up early on oversized bodies
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// Wrap `body` in HTTP/1.1 chunked framing, `chunk_size` bytes at a time.
pub fn chunked(body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in body.chunks(chunk_size) {
        out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}
