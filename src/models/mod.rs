pub mod styled_text;
pub mod element;
pub mod document;
pub mod diagnostic;
pub mod format_kind;
pub mod conf;

pub use styled_text::{StyledText, TextRun, TextStyle};
pub use element::{Element, ElementKind};
pub use document::{Document, SceneNumberingMode, TITLE_PAGE_KEYS};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use format_kind::{SourceKind, TargetKind};
pub use conf::{Conf, LayoutProfile};
