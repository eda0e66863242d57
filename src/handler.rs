use std::io::{self, Write};
use std::sync::Arc;

use crate::chain::{ContextChain, GroupOrAttrs};
use crate::format::{push_indent, AttrFormatter, Layout};
use crate::options::Options;
use crate::record::{Attr, Level, Record};
use crate::render::HeaderRenderer;
use crate::sink::OutputSink;
use crate::theme::{ColorTheme, Painter, Role};

/// Capability set a logging front end drives: a level gate, emission, and
/// derivation of handlers with bound attributes or groups.
///
/// Derivation never changes `self`; it returns a new handler.
pub trait Handler: Send + Sync {
    /// Whether records at `level` would be emitted.
    fn enabled(&self, level: Level) -> bool;

    /// Render and write one record.
    ///
    /// **Returns**
    /// - `Ok(())` if the record was written or filtered out by level.
    /// - `Err(..)` with the destination's write error, unchanged.
    fn handle(&self, record: &Record) -> io::Result<()>;

    /// Handler whose records also carry `attrs`. An empty batch yields an
    /// equivalent handler.
    fn with_attrs(&self, attrs: Vec<Attr>) -> Self
    where
        Self: Sized;

    /// Handler whose subsequent attributes are nested under `name`. An empty
    /// name yields an equivalent handler.
    fn with_group(&self, name: &str) -> Self
    where
        Self: Sized;
}

/// [`Handler`] that renders records as colorized, human-readable text.
///
/// Clones and derived handlers share options, theme and destination; each
/// holds its own [`ContextChain`] snapshot.
#[derive(Clone, Debug)]
pub struct PrettyHandler {
    options: Arc<Options>,
    theme: Arc<ColorTheme>,
    chain: ContextChain,
    sink: Arc<OutputSink>,
}

impl PrettyHandler {
    /// Create a handler writing to `out`.
    ///
    /// An empty `options.time_format` is replaced by the default pattern.
    pub fn new<W>(out: W, options: Options) -> Self
    where
        W: Write + Send + 'static,
    {
        PrettyHandler {
            options: Arc::new(options.normalized()),
            theme: Arc::new(ColorTheme::default()),
            chain: ContextChain::new(),
            sink: Arc::new(OutputSink::new(out)),
        }
    }

    /// Replace the color theme.
    #[must_use]
    pub fn with_theme(mut self, theme: ColorTheme) -> Self {
        self.theme = Arc::new(theme);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn chain(&self) -> &ContextChain {
        &self.chain
    }

    /// Flush the destination writer.
    pub fn flush(&self) -> io::Result<()> {
        self.sink.flush()
    }

    /// Render `record` with this handler's bound context, newline included.
    ///
    /// Pure: neither the handler nor its chain is modified.
    pub fn render(&self, record: &Record) -> String {
        let painter = Painter::new(&self.theme, self.options.colorful);
        let time_format = self.options.time_format.as_str();
        let attrs = AttrFormatter::new(painter, time_format);

        let mut buf = String::with_capacity(1024);
        HeaderRenderer::new(painter, time_format, self.options.add_source).append(&mut buf, record);

        let chain = if record.num_attrs() == 0 {
            self.chain.without_trailing_groups()
        } else {
            self.chain.clone()
        };

        if self.options.multiline {
            buf.push('\n');
            let depth = append_multiline_chain(&mut buf, &chain, &attrs, painter, 1);
            for attr in record.attrs() {
                attrs.append(&mut buf, attr, Layout::Multiline, depth);
            }
        } else {
            append_inline_chain(&mut buf, &chain, &attrs, painter);
            for attr in record.attrs() {
                attrs.append(&mut buf, attr, Layout::Inline, 0);
            }
            buf.push('\n');
        }
        buf
    }

    fn derive(&self, chain: ContextChain) -> Self {
        PrettyHandler {
            options: Arc::clone(&self.options),
            theme: Arc::clone(&self.theme),
            chain,
            sink: Arc::clone(&self.sink),
        }
    }
}

impl Handler for PrettyHandler {
    fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    fn handle(&self, record: &Record) -> io::Result<()> {
        if !self.enabled(record.level) {
            return Ok(());
        }
        let buf = self.render(record);
        self.sink.write(buf.as_bytes())
    }

    fn with_attrs(&self, attrs: Vec<Attr>) -> Self {
        self.derive(self.chain.with_attrs(attrs))
    }

    fn with_group(&self, name: &str) -> Self {
        self.derive(self.chain.with_group(name))
    }
}

/// Bound context as indented lines; each group opens a deeper level.
/// Returns the depth at which the record's own attributes belong.
fn append_multiline_chain(
    buf: &mut String,
    chain: &ContextChain,
    attrs: &AttrFormatter<'_>,
    painter: Painter<'_>,
    mut depth: usize,
) -> usize {
    for item in chain {
        match item {
            GroupOrAttrs::Group(name) => {
                push_indent(buf, depth);
                buf.push_str(&painter.paint(Role::Group, name));
                buf.push_str(":\n");
                depth += 1;
            }
            GroupOrAttrs::Attrs(batch) => {
                for attr in batch {
                    attrs.append(buf, attr, Layout::Multiline, depth);
                }
            }
        }
    }
    depth
}

fn append_inline_chain(buf: &mut String, chain: &ContextChain, attrs: &AttrFormatter<'_>, painter: Painter<'_>) {
    for item in chain {
        match item {
            GroupOrAttrs::Group(name) => {
                buf.push(' ');
                buf.push_str(&painter.paint(Role::InlineGroup, name));
                buf.push(':');
            }
            GroupOrAttrs::Attrs(batch) => {
                for attr in batch {
                    attrs.append(buf, attr, Layout::Inline, 0);
                }
            }
        }
    }
}
