//! Image reference splitting.

use std::fmt;

/// A borrowed view of an image reference.
///
/// The registry is simply the first `/`-separated segment when there is more
/// than one; no Docker Hub normalization is applied, so `myuser/app` has
/// registry `myuser` and `alpine` has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageReference<'a> {
    raw: &'a str,
    name: &'a str,
    reference: ImageTag<'a>,
}

/// Tag or digest part of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTag<'a> {
    /// A tag (e.g., "1.25").
    Tag(&'a str),
    /// A digest (e.g., "sha256:abc123...").
    Digest(&'a str),
    /// Neither was given.
    Implicit,
}

impl<'a> ImageReference<'a> {
    /// Tag pulled when a reference carries neither tag nor digest.
    pub const DEFAULT_TAG: &'static str = "latest";

    /// Split an image reference string.
    ///
    /// Examples:
    /// - `alpine` -> name `alpine`, implicit tag
    /// - `alpine:3.19` -> name `alpine`, tag `3.19`
    /// - `localhost:5000/app` -> name `localhost:5000/app`, implicit tag
    /// - `ghcr.io/org/app@sha256:abc` -> name `ghcr.io/org/app`, digest
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        let (name, reference) = if let Some((name, digest)) = raw.split_once('@') {
            (name, ImageTag::Digest(digest))
        } else {
            // A ':' before the last '/' belongs to a registry port.
            let last_segment = raw.rfind('/').map_or(0, |idx| idx + 1);
            match raw[last_segment..].rfind(':') {
                Some(idx) => {
                    let split = last_segment + idx;
                    (&raw[..split], ImageTag::Tag(&raw[split + 1..]))
                }
                None => (raw, ImageTag::Implicit),
            }
        };

        Self {
            raw,
            name,
            reference,
        }
    }

    /// The registry segment used for credential lookup.
    ///
    /// `None` when the reference has a single path segment.
    #[must_use]
    pub fn registry(&self) -> Option<&'a str> {
        self.raw.split_once('/').map(|(registry, _)| registry)
    }

    /// Repository name without tag or digest.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// Tag or digest to request from the daemon.
    #[must_use]
    pub const fn pull_tag(&self) -> &'a str {
        match self.reference {
            ImageTag::Tag(tag) | ImageTag::Digest(tag) => tag,
            ImageTag::Implicit => Self::DEFAULT_TAG,
        }
    }

    /// The tag or digest as written.
    #[must_use]
    pub const fn reference(&self) -> ImageTag<'a> {
        self.reference
    }

    /// The original string.
    #[must_use]
    pub const fn as_str(&self) -> &'a str {
        self.raw
    }
}

impl fmt::Display for ImageReference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}
