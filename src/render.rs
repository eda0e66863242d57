use std::fmt::Write as _;

use crate::format::format_time;
use crate::record::Record;
use crate::theme::{Painter, Role};

/// Column width of the level label.
pub const LEVEL_WIDTH: usize = 7;

/// Builds the fixed part of a line: timestamp, level, message and source.
#[derive(Debug, Clone, Copy)]
pub struct HeaderRenderer<'a> {
    painter: Painter<'a>,
    time_format: &'a str,
    add_source: bool,
}

impl<'a> HeaderRenderer<'a> {
    pub fn new(painter: Painter<'a>, time_format: &'a str, add_source: bool) -> Self {
        HeaderRenderer {
            painter,
            time_format,
            add_source,
        }
    }

    /// Append the header of `record` to `buf`, without a trailing newline.
    pub fn append(&self, buf: &mut String, record: &Record) {
        if let Some(time) = &record.time {
            let stamp = format_time(time, self.time_format);
            let _ = write!(buf, "{} ", self.painter.paint(Role::Timestamp, &stamp));
        }

        // Pad before coloring so escapes do not eat into the column width.
        let label = format!("{:<width$}", record.level, width = LEVEL_WIDTH);
        buf.push_str(&self.painter.paint_opt(Role::for_level(record.level), &label));

        let _ = write!(buf, " {}", self.painter.paint(Role::Message, &record.message));

        if self.add_source {
            if let Some(source) = &record.source {
                let text = format!("source: {}:{}", source.file_name(), source.line);
                let _ = write!(buf, " {}", self.painter.paint(Role::Source, &text));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DEFAULT_TIME_FORMAT;
    use crate::record::{Level, Source};
    use crate::theme::{strip_ansi, ColorTheme};
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn at() -> Option<DateTime<FixedOffset>> {
        FixedOffset::east_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 0)
            .single()
    }

    fn header(record: &Record, add_source: bool) -> String {
        let renderer = HeaderRenderer::new(Painter::plain(), DEFAULT_TIME_FORMAT, add_source);
        let mut buf = String::new();
        renderer.append(&mut buf, record);
        buf
    }

    #[test]
    fn plain_header_layout() {
        let record = Record::new(at(), Level::Info, "Server started");
        assert_eq!(header(&record, false), "2024-01-15 10:30:00.000 INFO    Server started");
    }

    #[test]
    fn labels_share_one_column() {
        for (level, expected) in [
            (Level::Debug, "DEBUG   msg"),
            (Level::Warn, "WARN    msg"),
            (Level::Error, "ERROR   msg"),
            (Level::Trace, "TRACE   msg"),
        ] {
            assert_eq!(header(&Record::new(None, level, "msg"), false), expected);
        }
    }

    #[test]
    fn missing_time_omits_timestamp() {
        let record = Record::new(None, Level::Info, "hi");
        assert_eq!(header(&record, false), "INFO    hi");
    }

    #[test]
    fn source_shows_basename_only_when_enabled() {
        let record = Record::new(None, Level::Warn, "disk low")
            .with_source(Source::new("/home/dev/app/src/disk.rs", 42));
        assert_eq!(header(&record, true), "WARN    disk low source: disk.rs:42");
        assert_eq!(header(&record, false), "WARN    disk low");
    }

    #[test]
    fn colored_header_strips_to_plain() {
        let theme = ColorTheme::default();
        let renderer = HeaderRenderer::new(Painter::new(&theme, true), DEFAULT_TIME_FORMAT, true);
        let record = Record::new(at(), Level::Error, "boom").with_source(Source::new("src/lib.rs", 9));

        let mut colored = String::new();
        renderer.append(&mut colored, &record);

        assert!(colored.contains("\x1b[91mERROR  \x1b[0m"));
        assert_eq!(
            strip_ansi(&colored),
            header(&record, true),
            "colors must not change structure"
        );
    }
}
