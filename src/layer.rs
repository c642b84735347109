use crate::field::Field;
use crate::level::Level;
use crate::record::LogRecord;
use crate::sink::EntrySink;
use std::sync::Arc;
use tracing::field::{Field as EventField, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that routes spans and events through an
/// [`EntrySink`] enrichment core.
///
/// Span fields become a derived scope (label-prefixed ones land in the
/// scope's permanent labels), event fields become one write on the
/// innermost enclosing scope. Everything runs synchronously on the
/// emitting thread; a sink failure is noted on stderr and never
/// propagates into the instrumented code.
pub struct DriverLayer {
    root: Arc<dyn EntrySink>,
}

impl DriverLayer {
    pub fn new(core: Arc<dyn EntrySink>) -> Self {
        DriverLayer { root: core }
    }
}

/// Per-span extension holding the scope derived from the span's fields.
struct ScopeSink(Arc<dyn EntrySink>);

fn level_from(level: &tracing::Level) -> Level {
    if *level == tracing::Level::TRACE {
        Level::Trace
    } else if *level == tracing::Level::DEBUG {
        Level::Debug
    } else if *level == tracing::Level::INFO {
        Level::Info
    } else if *level == tracing::Level::WARN {
        Level::Warn
    } else {
        Level::Error
    }
}

impl<S> Layer<S> for DriverLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.root.enabled(level_from(metadata.level()))
    }

    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        id: &tracing::span::Id,
        ctx: Context<'_, S>,
    ) {
        let span = match ctx.span(id) {
            Some(span) => span,
            None => return,
        };

        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);

        let parent = span
            .parent()
            .and_then(|p| p.extensions().get::<ScopeSink>().map(|s| Arc::clone(&s.0)))
            .unwrap_or_else(|| Arc::clone(&self.root));

        let scoped = parent.with(visitor.fields);
        span.extensions_mut().insert(ScopeSink(scoped));
    }

    fn on_record(
        &self,
        id: &tracing::span::Id,
        values: &tracing::span::Record<'_>,
        ctx: Context<'_, S>,
    ) {
        let span = match ctx.span(id) {
            Some(span) => span,
            None => return,
        };

        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);
        if visitor.fields.is_empty() {
            return;
        }

        let mut extensions = span.extensions_mut();
        if let Some(scope) = extensions.get_mut::<ScopeSink>() {
            let updated = scope.0.with(visitor.fields);
            scope.0 = updated;
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let core = ctx
            .event_span(event)
            .and_then(|span| span.extensions().get::<ScopeSink>().map(|s| Arc::clone(&s.0)))
            .unwrap_or_else(|| Arc::clone(&self.root));

        let meta = event.metadata();
        let level = level_from(meta.level());
        if !core.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = LogRecord::new(level, visitor.message.unwrap_or_default());
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record = record.with_caller(file, line, meta.module_path().map(str::to_string));
        }

        if let Err(e) = core.write(&record, visitor.fields) {
            eprintln!("log write failed: {}", e);
        }
    }
}

/// Converts `tracing` event/span values into typed fields, pulling the
/// `message` value out separately.
#[derive(Default)]
pub struct FieldVisitor {
    pub fields: Vec<Field>,
    pub message: Option<String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &EventField, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(Field::str(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &EventField, value: i64) {
        self.fields.push(Field::i64(field.name(), value));
    }

    fn record_u64(&mut self, field: &EventField, value: u64) {
        self.fields.push(Field::u64(field.name(), value));
    }

    fn record_f64(&mut self, field: &EventField, value: f64) {
        self.fields.push(Field::f64(field.name(), value));
    }

    fn record_bool(&mut self, field: &EventField, value: bool) {
        self.fields.push(Field::bool(field.name(), value));
    }

    fn record_error(&mut self, field: &EventField, value: &(dyn std::error::Error + 'static)) {
        self.fields.push(Field::error(field.name(), value));
    }

    fn record_debug(&mut self, field: &EventField, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push(Field::str(field.name(), format!("{:?}", value)));
        }
    }
}
