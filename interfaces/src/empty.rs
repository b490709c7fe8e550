use crate::defs::PostRecord;
use crate::defs::RawEntry;
use crate::defs::SourceSpec;

/// A source that never has anything to say.
pub struct EmptySource;

impl EmptySource {
    pub fn entries(_source: &SourceSpec) -> Vec<RawEntry> {
        // Nothing was fetched, the ideal feed is empty.
        vec![]
    }
}

/// Keeps only the links of the posts it is shown, in order.
pub fn post_links(posts: &[PostRecord]) -> Vec<String> {
    posts.iter().map(|post| post.link.clone()).collect()
}
