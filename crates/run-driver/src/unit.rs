//! Computation units

use std::fmt;

/// One opaque block of executable work with its source text
///
/// A unit's position in the sequence passed to the driver is its index;
/// the source text is what selectors and completion markers match
/// against.
pub struct Unit {
    source: String,
    exec: Box<dyn FnMut() -> anyhow::Result<()>>,
}

impl Unit {
    /// Create a unit from its source text and executable body
    pub fn new<S, F>(source: S, exec: F) -> Self
    where
        S: Into<String>,
        F: FnMut() -> anyhow::Result<()> + 'static,
    {
        Self {
            source: source.into(),
            exec: Box::new(exec),
        }
    }

    /// The unit's source text
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn execute(&mut self) -> anyhow::Result<()> {
        (self.exec)()
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
