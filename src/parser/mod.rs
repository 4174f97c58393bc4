mod descriptors;
mod handled;
mod markers;
mod preprocessor;
mod types;

pub use descriptors::{BindingRole, CaptureDescriptor, CaptureTable, Field};
pub use handled::{HandledPragmaTable, PragmaKind};
pub use markers::{LineCursor, LineMarker, LineStep};
pub use preprocessor::{continuation_body, source_lines, SourceLine, SourceLines, StatementJoiner};
pub use types::{is_pragma_line, BodyRange, PragmaSpan, PragmaStatement, PRAGMA};
