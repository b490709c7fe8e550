use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar/";

// Deliberately narrow: single-word local part, letters-only domain, short tld.
static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?-u:\w)+@[a-z_]+?\.[a-z]{2,3}$").expect("email pattern is valid")
});

/// Map an author identity to a displayable image url.
///
/// Email shaped identities become a gravatar url keyed by the md5 of the
/// lower-cased address, anything else is taken to be an image url already.
pub fn resolve_avatar(identity: Option<&str>) -> Option<String> {
    let identity = identity.filter(|i| !i.is_empty())?;

    if is_email_shaped(identity) {
        return Some(gravatar_url(identity));
    }

    Some(identity.to_string())
}

pub fn is_email_shaped(identity: &str) -> bool {
    EMAIL_SHAPE.is_match(identity)
}

pub fn gravatar_url(email: &str) -> String {
    let digest = Md5::digest(email.to_lowercase().as_bytes());
    format!("{}{:x}", GRAVATAR_BASE, digest)
}
