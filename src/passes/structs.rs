use std::io::{BufRead, Write};

use log::{debug, warn};
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::parser::{
    source_lines, BindingRole, CaptureDescriptor, CaptureTable, LineCursor, LineMarker, LineStep,
    SourceLine,
};

/// Record type plus the entry-point stub that unpacks it.
pub fn render_declaration(descriptor: &CaptureDescriptor) -> Vec<String> {
    let name = &descriptor.region_name;
    let mut lines = Vec::with_capacity(descriptor.fields.len() + 5);
    lines.push(format!("typedef struct _{name} {{"));
    for field in &descriptor.fields {
        let sep = if field.ty.ends_with('*') { "" } else { " " };
        lines.push(format!("    {}{sep}{};", field.ty, field.name));
    }
    lines.push(format!("}} {name};"));
    lines.push(format!("static void {name}_async(void *____arg) {{"));
    lines.push(format!("    {name} *ctx = ({name} *)____arg;"));
    lines.push("}".to_string());
    lines
}

/// Heap allocation of the record and one copy per captured variable.
pub fn render_capture(descriptor: &CaptureDescriptor, ctx: &str) -> Vec<String> {
    let name = &descriptor.region_name;
    let mut lines = Vec::with_capacity(descriptor.fields.len() + 1);
    lines.push(format!("{name} *{ctx} = ({name} *)malloc(sizeof({name}));"));
    for field in &descriptor.fields {
        lines.push(format!("{ctx}->{0} = {0};", field.name));
    }
    lines
}

/// Insert capture records ahead of the lines their descriptors bind to.
///
/// Generated code goes before the marker lines that immediately precede the
/// bound line, so each marker keeps adjoining the content it numbers. The
/// bound line itself is copied unchanged.
///
/// Without `main_file`, the file named by the first file marker is taken as
/// the main file, so lines of included headers never match a binding.
pub fn insert_structs<R, W>(
    input: R,
    out: &mut W,
    table: &CaptureTable,
    main_file: Option<&str>,
) -> Result<()>
where
    R: BufRead,
    W: Write,
{
    let mut main_file = main_file.map(str::to_string);
    let mut cursor = LineCursor::for_main_file(main_file.as_deref());
    let mut pending_markers: Vec<SourceLine> = Vec::new();
    let mut emitted: FxHashSet<u32> = FxHashSet::default();
    let mut next_ctx = 0usize;

    for line in source_lines(input) {
        let line = line?;
        if main_file.is_none() {
            if let Some(LineMarker {
                file: Some(file), ..
            }) = LineMarker::parse(line.text())
            {
                debug!("main file is {file}");
                main_file = Some(file);
            }
        }
        let (next, step) = cursor.step(line.text(), main_file.as_deref());
        cursor = next;

        let LineStep::Content {
            line_no,
            in_main_file,
        } = step
        else {
            pending_markers.push(line);
            continue;
        };

        if in_main_file {
            if let Some((role, descriptor)) = table.binding(line_no) {
                if emitted.insert(line_no) {
                    let generated = match role {
                        BindingRole::Declaration => {
                            debug!("struct {} before line {line_no}", descriptor.region_name);
                            render_declaration(descriptor)
                        }
                        BindingRole::Capture => {
                            let ctx = format!("ctx{next_ctx}");
                            next_ctx += 1;
                            debug!("{ctx} captures {} at line {line_no}", descriptor.region_name);
                            render_capture(descriptor, &ctx)
                        }
                    };
                    for g in generated {
                        write!(out, "{g}{}", line.newline())?;
                    }
                }
            }
        }

        for marker in pending_markers.drain(..) {
            write!(out, "{marker}")?;
        }
        write!(out, "{line}")?;
    }

    for marker in pending_markers {
        write!(out, "{marker}")?;
    }

    let missing = table
        .descriptors()
        .iter()
        .filter(|d| !emitted.contains(&d.declaration_line))
        .count();
    if missing > 0 {
        warn!("{missing} capture record(s) bound to lines not present in the input");
    }
    Ok(())
}
