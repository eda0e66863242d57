use chrono::Local;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::handler::{Handler, PrettyHandler};
use crate::record::{Attr, Level, Record, Source, Value};

/// `tracing_subscriber` layer that renders events through a [`Handler`].
///
/// The handler's level threshold is applied in `on_event` only, so layers
/// stacked next to this one still see every event.
///
/// Every span in an event's scope becomes a group named after the span,
/// holding the span's fields, outermost span first. Event fields become the
/// record's own attributes and the `message` field its message.
pub struct PrettyLayer<H = PrettyHandler> {
    handler: H,
}

impl<H> PrettyLayer<H>
where
    H: Handler + Clone + 'static,
{
    pub fn new(handler: H) -> Self {
        PrettyLayer { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Span fields captured at creation and updated by `Span::record`.
struct SpanAttrs(Vec<Attr>);

impl<S, H> Layer<S> for PrettyLayer<H>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    H: Handler + Clone + 'static,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut fields = Vec::new();
        attrs.record(&mut FieldVisitor::new(&mut fields));
        span.extensions_mut().insert(SpanAttrs(fields));
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut updates = Vec::new();
        values.record(&mut FieldVisitor::new(&mut updates));

        let mut extensions = span.extensions_mut();
        if let Some(SpanAttrs(fields)) = extensions.get_mut::<SpanAttrs>() {
            for update in updates {
                match fields.iter_mut().find(|f| f.key == update.key) {
                    Some(existing) => *existing = update,
                    None => fields.push(update),
                }
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = Level::from(*meta.level());
        if !self.handler.enabled(level) {
            return;
        }

        let mut message = String::new();
        let mut fields = Vec::new();
        event.record(&mut FieldVisitor::with_message(&mut fields, &mut message));

        let mut record = Record::new(Some(Local::now().into()), level, message);
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record = record.with_source(Source::new(file, line));
        }
        record.add_attrs(fields);

        let mut handler = self.handler.clone();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                handler = handler.with_group(span.name());
                if let Some(SpanAttrs(fields)) = span.extensions().get::<SpanAttrs>() {
                    handler = handler.with_attrs(fields.clone());
                }
            }
        }

        if let Err(e) = handler.handle(&record) {
            eprintln!("error writing log record: {}", e);
        }
    }
}

/// Collects `tracing` fields as typed [`Attr`]s, optionally diverting the
/// `message` field into a separate string.
pub struct FieldVisitor<'a> {
    pub attrs: &'a mut Vec<Attr>,
    pub message: Option<&'a mut String>,
}

impl<'a> FieldVisitor<'a> {
    pub fn new(attrs: &'a mut Vec<Attr>) -> Self {
        FieldVisitor { attrs, message: None }
    }

    pub fn with_message(attrs: &'a mut Vec<Attr>, message: &'a mut String) -> Self {
        FieldVisitor {
            attrs,
            message: Some(message),
        }
    }

    fn push(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            if let Some(message) = self.message.as_mut() {
                **message = value.to_string();
                return;
            }
        }
        self.attrs.push(Attr::new(field.name(), value));
    }
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, Value::Int64(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, Value::Uint64(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, Value::Float64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, Value::Bool(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, Value::Any(Arc::new(value.to_string())));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.push(field, Value::Any(Arc::new(format!("{:?}", value))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::sink::SharedBuffer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn capture<F: FnOnce()>(options: Options, f: F) -> String {
        let buffer = SharedBuffer::new();
        let layer = PrettyLayer::new(PrettyHandler::new(buffer.clone(), options));
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    fn untimed(line: &str) -> &str {
        // Skip "YYYY-MM-DD HH:MM:SS.mmm ".
        &line[24..]
    }

    fn plain() -> Options {
        Options {
            colorful: false,
            ..Options::default()
        }
    }

    #[test]
    fn event_fields_become_typed_attrs() {
        let out = capture(plain(), || {
            tracing::info!(port = 8080u64, secure = false, ratio = 0.5, host = "db", "Server started");
        });
        assert_eq!(
            untimed(&out),
            "INFO    Server started port=8080 secure=false ratio=0.5 host=\"db\"\n"
        );
    }

    #[test]
    fn spans_become_groups_with_their_fields() {
        let out = capture(plain(), || {
            let span = tracing::info_span!("request", id = 7);
            let _guard = span.enter();
            tracing::warn!(status = 503, "upstream failed");
        });
        assert_eq!(
            untimed(&out),
            "WARN    upstream failed request: id=7 status=503\n"
        );
    }

    #[test]
    fn recorded_span_fields_replace_placeholders() {
        let out = capture(plain(), || {
            let span = tracing::info_span!("job", state = tracing::field::Empty);
            span.record("state", "done");
            let _guard = span.enter();
            tracing::info!("finished");
        });
        assert_eq!(untimed(&out), "INFO    finished job: state=\"done\"\n");
    }

    #[test]
    fn filtered_levels_produce_nothing() {
        let out = capture(plain(), || {
            tracing::debug!(k = 1, "hidden");
            tracing::trace!("hidden too");
        });
        assert!(out.is_empty());
    }

    #[derive(Clone, Default)]
    struct Counting(Arc<std::sync::atomic::AtomicUsize>);

    impl<S: Subscriber> Layer<S> for Counting {
        fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    }

    #[test]
    fn threshold_does_not_hide_events_from_sibling_layers() {
        let buffer = SharedBuffer::new();
        let counting = Counting::default();
        let subscriber = Registry::default()
            .with(PrettyLayer::new(PrettyHandler::new(buffer.clone(), plain())))
            .with(counting.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("below threshold");
            tracing::info!("above threshold");
        });

        assert_eq!(counting.0.load(std::sync::atomic::Ordering::Relaxed), 2);
        assert_eq!(buffer.contents().lines().count(), 1);
        assert!(buffer.contents().contains("above threshold"));
    }

    #[test]
    fn debug_and_error_fields_use_display_text() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
        let out = capture(plain(), || {
            tracing::error!(error = &err as &(dyn std::error::Error + 'static), tags = ?vec!["a", "b"], "failed");
        });
        assert_eq!(
            untimed(&out),
            "ERROR   failed error=connection refused tags=[\"a\", \"b\"]\n"
        );
    }

    #[test]
    fn source_location_comes_from_callsite() {
        let options = Options {
            add_source: true,
            ..plain()
        };
        let out = capture(options, || tracing::info!("here"));
        assert!(untimed(&out).starts_with("INFO    here source: layer.rs:"), "{}", out);
    }
}
