//! Interactive controls emitted into rendered HTML.
//!
//! Rendered markup never carries inline event handlers. Each control instead
//! gets `data-action` and `data-target` attributes, and the render reports it
//! here so the host can bind behaviour after inserting the HTML.

use std::fmt;

/// What a control does when activated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum InteractiveKind {
    /// Copy the code of the block whose wrapper has the target id.
    CopyCode,
    /// Save the target diagram's SVG as `{id}.svg`.
    DiagramDownload,
    /// Open the target diagram in the zoomable fullscreen viewer.
    DiagramFullscreen,
}

impl InteractiveKind {
    /// Value of the `data-action` attribute for this kind.
    #[must_use]
    pub fn action(self) -> &'static str {
        match self {
            Self::CopyCode => "copy-code",
            Self::DiagramDownload => "diagram-download",
            Self::DiagramFullscreen => "diagram-fullscreen",
        }
    }
}

impl fmt::Display for InteractiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// A control in rendered HTML, addressed by the id in its `data-target`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InteractiveElement {
    pub id: String,
    pub kind: InteractiveKind,
}

impl InteractiveElement {
    pub fn new(id: impl Into<String>, kind: InteractiveKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}
