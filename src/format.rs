use chrono::{DateTime, FixedOffset};
use std::fmt::Write as _;

use crate::record::{Attr, Value};
use crate::theme::{Painter, Role};

/// Depth handed to children of a group rendered inline. Inline output
/// never indents, so the depth has no visible effect there.
pub const INLINE_GROUP_DEPTH: usize = 2;

/// Layout of rendered attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// ` key=value` pairs on the header line.
    Inline,
    /// `key: value` lines indented two spaces per depth level.
    Multiline,
}

/// Renders attributes, recursing into groups.
///
/// Formatting is total: every value kind produces text, and tombstone
/// attributes and empty groups produce nothing.
#[derive(Debug, Clone, Copy)]
pub struct AttrFormatter<'a> {
    painter: Painter<'a>,
    time_format: &'a str,
}

impl<'a> AttrFormatter<'a> {
    pub fn new(painter: Painter<'a>, time_format: &'a str) -> Self {
        AttrFormatter {
            painter,
            time_format,
        }
    }

    /// Append `attr` to `buf` in the given layout at indentation `depth`.
    pub fn append(&self, buf: &mut String, attr: &Attr, layout: Layout, depth: usize) {
        let resolved;
        let value = match &attr.value {
            Value::Lazy(_) => {
                resolved = attr.value.clone().resolve();
                &resolved
            }
            other => other,
        };

        if attr.key.is_empty() && value.is_nil() {
            return;
        }

        let text = match value {
            Value::Group(children) => {
                self.append_group(buf, &attr.key, children, layout, depth);
                return;
            }
            Value::String(s) => match layout {
                Layout::Inline => format!("{:?}", s),
                Layout::Multiline => s.clone(),
            },
            Value::Time(t) => {
                let formatted = format_time(t, self.time_format);
                match layout {
                    Layout::Inline => format!("{:?}", formatted),
                    Layout::Multiline => formatted,
                }
            }
            // Numbers, bools, durations, Nil and Any all print their canonical text.
            _ => value.to_string(),
        };

        let key = self.painter.paint(Role::Key, &attr.key);
        let val = self.painter.paint(Role::Value, &text);
        match layout {
            Layout::Inline => {
                let _ = write!(buf, " {}={}", key, val);
            }
            Layout::Multiline => {
                push_indent(buf, depth);
                let _ = writeln!(buf, "{}: {}", key, val);
            }
        }
    }

    fn append_group(&self, buf: &mut String, key: &str, children: &[Attr], layout: Layout, depth: usize) {
        if children.is_empty() {
            return;
        }

        // An unnamed group contributes its children in place.
        if key.is_empty() {
            for child in children {
                self.append(buf, child, layout, depth);
            }
            return;
        }

        let label = self.painter.paint(Role::Key, key);
        match layout {
            Layout::Multiline => {
                push_indent(buf, depth);
                let _ = writeln!(buf, "{}:", label);
                for child in children {
                    self.append(buf, child, layout, depth + 1);
                }
            }
            Layout::Inline => {
                let _ = write!(buf, " {}:", label);
                for child in children {
                    self.append(buf, child, layout, INLINE_GROUP_DEPTH);
                }
            }
        }
    }
}

pub(crate) fn push_indent(buf: &mut String, depth: usize) {
    for _ in 0..depth {
        buf.push_str("  ");
    }
}

/// Format `time` with a chrono strftime pattern, falling back to RFC 3339
/// when the pattern is invalid.
pub fn format_time(time: &DateTime<FixedOffset>, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", time.format(pattern)).is_err() {
        out.clear();
        out.push_str(&time.to_rfc3339());
    }
    out
}
