//! URL metadata captured at ingress.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Classification flags attached to a URL when it is normalized.
    ///
    /// `DOCS` and `API` are derived from the host class; the content
    /// flags come from whatever discovered the link (the extractor sees
    /// the referring page, not this one).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[repr(transparent)]
    pub struct PageFlags: u8 {
        const DOCS             = 0b0000_0001;
        const API              = 0b0000_0010;
        const SPEC             = 0b0000_0100;
        const BLOG             = 0b0000_1000;
        const RECRAWL          = 0b0001_0000;
        const HAS_QUERY_PARAMS = 0b0010_0000;
        const HAS_CODE_BLOCKS  = 0b0100_0000;
    }
}

impl Default for PageFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl Serialize for PageFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PageFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

/// Metadata produced once alongside the canonical URL; immutable
/// afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlMeta {
    /// Canonical URL.
    pub url: String,
    /// Host component of the canonical URL.
    pub host: String,
    /// Path component of the canonical URL.
    pub path: String,
    /// Crawl depth from the nearest seed.
    pub depth: u32,
    /// URL of the page this one was discovered on, if any.
    pub discovered_from: Option<String>,
    /// Inbound links seen so far by the link extractor.
    pub inbound_links: u32,
    /// Content-type hint ("md", "html", ...), usually derived from the
    /// path extension.
    pub content_type: Option<String>,
    /// Word count of the referring snippet, when known.
    pub word_count: u64,
    /// Classification flags.
    pub flags: PageFlags,
    /// When this URL was first seen.
    pub first_seen_at: DateTime<Utc>,
    /// Last successful fetch, for recrawl candidates.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

impl UrlMeta {
    pub const fn is_docs(&self) -> bool {
        self.flags.contains(PageFlags::DOCS)
    }

    pub const fn is_api(&self) -> bool {
        self.flags.contains(PageFlags::API)
    }

    pub const fn is_spec(&self) -> bool {
        self.flags.contains(PageFlags::SPEC)
    }

    pub const fn is_blog(&self) -> bool {
        self.flags.contains(PageFlags::BLOG)
    }

    pub const fn is_recrawl(&self) -> bool {
        self.flags.contains(PageFlags::RECRAWL)
    }

    pub const fn has_query_params(&self) -> bool {
        self.flags.contains(PageFlags::HAS_QUERY_PARAMS)
    }

    pub const fn has_code_blocks(&self) -> bool {
        self.flags.contains(PageFlags::HAS_CODE_BLOCKS)
    }
}
