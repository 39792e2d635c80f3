//! JSON Lines tracing layer.
//!
//! One object per event on stderr. Correlation fields (`run_id`, `stage`,
//! `event_id`) are lifted out of the enclosing spans; everything else the
//! event records lands under `fields`.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

const CORRELATION_KEYS: [&str; 3] = ["run_id", "stage", "event_id"];

/// Recorded values keyed by field name.
#[derive(Default)]
struct FieldCollector {
    values: Map<String, Value>,
    message: Option<String>,
}

impl FieldCollector {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.values.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON form
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.put(field, Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}

/// Correlation fields a span carries, stored in its extensions.
#[derive(Debug, Clone, Default)]
struct Correlation(Map<String, Value>);

#[derive(Serialize)]
struct LogLine<'a> {
    ts: String,
    level: Level,
    event: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    fields: Map<String, Value>,
}

/// Tracing layer writing JSON Lines.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer::new(io::stderr())
    }
}

impl<W: Write> JsonlLayer<W> {
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut collector = FieldCollector::default();
        attrs.record(&mut collector);

        let mut correlation = Correlation::default();
        for key in CORRELATION_KEYS {
            if let Some(value) = collector.values.remove(key) {
                correlation.0.insert(key.to_string(), value);
            }
        }
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(correlation);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        // Walk outermost to innermost so inner spans overwrite outer ones.
        let mut context = Map::new();
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope.from_root() {
                if let Some(Correlation(values)) = span.extensions().get::<Correlation>() {
                    context.extend(values.clone());
                }
            }
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let stage = collector
            .values
            .remove("stage")
            .or_else(|| context.remove("stage"));

        let line = LogLine {
            ts: Utc::now().to_rfc3339(),
            level: (*event.metadata().level()).into(),
            event: event.metadata().target(),
            stage,
            run_id: context.remove("run_id"),
            event_id: context.remove("event_id"),
            message: collector.message,
            fields: collector.values,
        };

        let Ok(json) = serde_json::to_string(&line) else {
            return;
        };
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", json);
        }
    }
}
