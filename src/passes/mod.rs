//! One module per pass. Every pass reads a whole line stream from a
//! `BufRead` and writes a whole line stream to a `Write`; passes share no
//! state besides what they serialize.

mod locate;
mod locks;
mod provenance;
mod rewrite;
mod structs;
mod untied;

pub use locate::{find_body, write_spans, LocatorOptions, PragmaLocator, BODY_END, BODY_START};
pub use locks::{insert_locks, lock_declaration, lock_name, LockRequest};
pub use provenance::{label_pragmas, tag_lines};
pub use rewrite::{mark_pragmas, marker_call, pragma_label, rewrite, RewriteOptions};
pub use structs::{insert_structs, render_capture, render_declaration};
pub use untied::make_untied_configurable;
