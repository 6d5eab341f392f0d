//! Video output visibility.
//!
//! The video surface is shown only while it is mounted and a capture stream
//! is present. Nothing here is cached: callers hold the two facts and ask
//! again whenever either changes.

/// The two inputs the visibility decision depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamVisibility {
    pub mount_present: bool,
    pub stream_present: bool,
}

impl StreamVisibility {
    pub fn new(mount_present: bool, stream_present: bool) -> Self {
        Self {
            mount_present,
            stream_present,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.mount_present && self.stream_present
    }
}

/// Same decision over optional references.
pub fn is_visible<M, S>(mount: Option<&M>, stream: Option<&S>) -> bool {
    StreamVisibility::new(mount.is_some(), stream.is_some()).is_visible()
}
