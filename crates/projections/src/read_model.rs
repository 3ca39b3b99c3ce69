//! Common surface of the CMS read side.
//!
//! Each view kept in memory by this crate (apps, schemas, and the draft and
//! published content sets) reports its name and size here, which the runtime
//! logs after catching up.

/// An in-memory CMS view filled by a projection.
pub trait ReadModel: Send + Sync {
    /// Stable name used in logs and metrics, e.g. `"DraftContents"`.
    fn name(&self) -> &'static str;

    /// Number of apps, schemas or content items held, deleted ones included.
    ///
    /// Reads without waiting, so a view being written reports zero.
    fn count(&self) -> usize;

    /// True when nothing has been projected into the view yet.
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}
