use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// Terminates every descriptor block.
const BLOCK_END: &str = "=====";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub ty: String,
    pub name: String,
}

impl Field {
    /// `<type tokens…> <name>`. Leading `*` on the name belong to the type.
    fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (&last, type_tokens) = tokens.split_last()?;
        if type_tokens.is_empty() {
            return None;
        }
        let name = last.trim_start_matches('*');
        if name.is_empty() {
            return None;
        }
        let stars = &last[..last.len() - name.len()];
        let mut ty = type_tokens.join(" ");
        if !stars.is_empty() {
            ty.push(' ');
            ty.push_str(stars);
        }
        Some(Self {
            ty,
            name: name.to_string(),
        })
    }
}

/// Variables captured by one pragma-delimited region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDescriptor {
    pub region_name: String,
    pub fields: Vec<Field>,
    /// Line where the enclosing declaration begins.
    pub declaration_line: u32,
    /// Line of the pragma opening the region, when known.
    pub capture_line: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingRole {
    Declaration,
    Capture,
}

impl fmt::Display for BindingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingRole::Declaration => f.write_str("declaration site"),
            BindingRole::Capture => f.write_str("capture site"),
        }
    }
}

/// Descriptors indexed by the logical lines they bind to.
#[derive(Debug, Clone, Default)]
pub struct CaptureTable {
    descriptors: Vec<CaptureDescriptor>,
    bindings: FxHashMap<u32, (BindingRole, usize)>,
}

impl CaptureTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. A line may carry exactly one binding.
    pub fn add(&mut self, descriptor: CaptureDescriptor) -> Result<()> {
        let index = self.descriptors.len();
        let mut sites = vec![(descriptor.declaration_line, BindingRole::Declaration)];
        if let Some(line) = descriptor.capture_line {
            sites.push((line, BindingRole::Capture));
        }

        for (i, &(line, role)) in sites.iter().enumerate() {
            let earlier = sites[..i].iter().find(|(l, _)| *l == line);
            let existing = match earlier {
                Some(&(_, first_role)) => Some((first_role, descriptor.region_name.as_str())),
                None => self
                    .bindings
                    .get(&line)
                    .map(|&(r, idx)| (r, self.descriptors[idx].region_name.as_str())),
            };
            if let Some((first_role, first_name)) = existing {
                return Err(Error::ConflictingBinding {
                    line,
                    first: format!("{first_role} of `{first_name}`"),
                    second: format!("{role} of `{}`", descriptor.region_name),
                });
            }
        }

        for (line, role) in sites {
            self.bindings.insert(line, (role, index));
        }
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn binding(&self, line: u32) -> Option<(BindingRole, &CaptureDescriptor)> {
        self.bindings
            .get(&line)
            .map(|&(role, idx)| (role, &self.descriptors[idx]))
    }

    pub fn descriptors(&self) -> &[CaptureDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Parse the descriptor file: header (4th token is the region name),
    /// binding line (5th token declaration site, optional 6th capture site),
    /// field lines, `=====` terminator.
    pub fn parse<R: BufRead>(reader: R, source_name: &str) -> Result<Self> {
        let mut table = Self::new();
        let mut lines = reader.lines().enumerate().map(|(i, l)| (i + 1, l));

        while let Some((header_no, header)) = lines.next() {
            let header = header?;
            if header.trim().is_empty() {
                continue;
            }
            let region_name = header
                .split_whitespace()
                .nth(3)
                .ok_or_else(|| Error::malformed(source_name, header_no, "header has no region name"))?
                .to_string();

            let (site_no, site) = lines.next().ok_or_else(|| {
                Error::malformed(source_name, header_no, "block ends before its binding line")
            })?;
            let site = site?;
            let site_tokens: Vec<&str> = site.split_whitespace().collect();
            let line_at = |idx: usize| -> Result<Option<u32>> {
                site_tokens
                    .get(idx)
                    .map(|t| {
                        t.parse::<u32>().map_err(|_| {
                            Error::malformed(source_name, site_no, format!("`{t}` is not a line number"))
                        })
                    })
                    .transpose()
            };
            let declaration_line = line_at(4)?.ok_or_else(|| {
                Error::malformed(source_name, site_no, "binding line has no declaration site")
            })?;
            let capture_line = line_at(5)?;

            let mut fields = Vec::new();
            loop {
                let (field_no, field) = lines.next().ok_or_else(|| {
                    Error::malformed(source_name, site_no, "block is missing its `=====` terminator")
                })?;
                let field = field?;
                if field.starts_with(BLOCK_END) {
                    if fields.is_empty() {
                        return Err(Error::malformed(source_name, field_no, "block has no fields"));
                    }
                    break;
                }
                let parsed = Field::parse(&field).ok_or_else(|| {
                    Error::malformed(source_name, field_no, "expected `<type> <name>`")
                })?;
                fields.push(parsed);
            }

            table.add(CaptureDescriptor {
                region_name,
                fields,
                declaration_line,
                capture_line,
            })?;
        }

        Ok(table)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file), &path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_pointer_stars_move_to_type() {
        let f = Field::parse("const double *restrict *grid").unwrap();
        assert_eq!(f.ty, "const double *restrict *");
        assert_eq!(f.name, "grid");

        let f = Field::parse("unsigned long n").unwrap();
        assert_eq!(f.ty, "unsigned long");
        assert_eq!(f.name, "n");

        assert_eq!(Field::parse("lonely"), None);
        assert_eq!(Field::parse("int **"), None);
    }

    #[test]
    fn same_descriptor_cannot_bind_one_line_twice() {
        let mut table = CaptureTable::new();
        let err = table
            .add(CaptureDescriptor {
                region_name: "r".into(),
                fields: vec![],
                declaration_line: 4,
                capture_line: Some(4),
            })
            .unwrap_err();
        assert!(matches!(err, Error::ConflictingBinding { line: 4, .. }));
        assert!(table.is_empty());
    }
}
