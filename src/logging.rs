//! Logging setup and the real-time log sink
//!
//! Log lines go to stderr through `tracing-subscriber` and, at the same
//! time, to a broadcast channel that any number of consumers (a UI stream,
//! a test) can subscribe to. Sending never waits: with no subscriber or a
//! lagging one the event is simply dropped.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Buffered events per subscriber before the oldest are dropped
const SINK_CAPACITY: usize = 1024;

/// One log line as delivered to sink subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub message: String,
    pub severity: Level,
    pub timestamp: DateTime<Utc>,
}

/// Fan-out point for log events
#[derive(Debug, Clone)]
pub struct LogSink {
    sender: broadcast::Sender<LogEvent>,
}

impl LogSink {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SINK_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.sender.subscribe()
    }

    /// Publishes an event; never blocks and never fails
    pub fn publish(&self, event: LogEvent) {
        let _ = self.sender.send(event);
    }

    /// Layer forwarding every event to this sink
    pub fn layer(&self) -> LogSinkLayer {
        LogSinkLayer { sink: self.clone() }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// `tracing` layer feeding a [`LogSink`]
#[derive(Debug, Clone)]
pub struct LogSinkLayer {
    sink: LogSink,
}

/// Collects the message and any extra fields of an event
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{:?}", value);
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S> Layer<S> for LogSinkLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.sink.publish(LogEvent {
            message: format!("{}{}", visitor.message, visitor.fields),
            severity: *event.metadata().level(),
            timestamp: Utc::now(),
        });
    }
}

/// Filter for the given verbosity
fn filter_for(verbose: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    match verbose {
        0 => EnvFilter::new("furnish_scout=info,warn"),
        1 => EnvFilter::new("furnish_scout=debug,info"),
        2 => EnvFilter::new("furnish_scout=trace,debug"),
        _ => EnvFilter::new("trace"),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Returns the sink receiving the same events as the console.
pub fn setup_logging(verbose: u8, quiet: bool) -> LogSink {
    let sink = LogSink::new();

    let result = tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_writer(std::io::stderr),
        )
        .with(sink.layer())
        .try_init();

    if let Err(e) = result {
        eprintln!("Logging was already initialized: {}", e);
    }

    sink
}
