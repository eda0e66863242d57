use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ParseLevelError;

/// Number of times a [`LogValuer`] chain is followed before giving up.
const MAX_LOG_VALUER_CALLS: usize = 100;

/// Severity of a [`Record`], totally ordered from `Trace` to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        if level == tracing::Level::ERROR {
            Level::Error
        } else if level == tracing::Level::WARN {
            Level::Warn
        } else if level == tracing::Level::INFO {
            Level::Info
        } else if level == tracing::Level::DEBUG {
            Level::Debug
        } else {
            Level::Trace
        }
    }
}

/// A value whose concrete form is computed only when a record is rendered.
///
/// Returning another [`Value::Lazy`] is allowed; resolution follows the
/// chain a bounded number of times.
pub trait LogValuer: Send + Sync {
    fn log_value(&self) -> Value;
}

/// Typed payload of an [`Attr`].
#[derive(Clone, Default)]
pub enum Value {
    /// The zero value. Paired with an empty key it forms a tombstone attribute.
    #[default]
    Nil,
    String(String),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    Bool(bool),
    Duration(Duration),
    Time(DateTime<FixedOffset>),
    Group(Vec<Attr>),
    /// Anything else, rendered through its `Display` text.
    Any(Arc<dyn fmt::Display + Send + Sync>),
    Lazy(Arc<dyn LogValuer>),
}

impl Value {
    pub fn any<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Value::Any(Arc::new(value))
    }

    pub fn lazy<T>(valuer: T) -> Self
    where
        T: LogValuer + 'static,
    {
        Value::Lazy(Arc::new(valuer))
    }

    pub fn group(attrs: impl IntoIterator<Item = Attr>) -> Self {
        Value::Group(attrs.into_iter().collect())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Force any deferred computation and return a concrete value.
    ///
    /// Groups are not resolved recursively; their children are resolved
    /// when they are rendered.
    pub fn resolve(self) -> Value {
        let mut value = self;
        for _ in 0..MAX_LOG_VALUER_CALLS {
            if let Value::Lazy(valuer) = &value {
                let next = valuer.log_value();
                value = next;
            } else {
                return value;
            }
        }
        if let Value::Lazy(_) = value {
            return Value::any(format!(
                "!ERROR: log value still deferred after {} calls",
                MAX_LOG_VALUER_CALLS
            ));
        }
        value
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Int64(v) => f.debug_tuple("Int64").field(v).finish(),
            Value::Uint64(v) => f.debug_tuple("Uint64").field(v).finish(),
            Value::Float64(v) => f.debug_tuple("Float64").field(v).finish(),
            Value::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Value::Duration(v) => f.debug_tuple("Duration").field(v).finish(),
            Value::Time(v) => f.debug_tuple("Time").field(v).finish(),
            Value::Group(attrs) => f.debug_tuple("Group").field(attrs).finish(),
            Value::Any(v) => f.debug_tuple("Any").field(&v.to_string()).finish(),
            Value::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Canonical, unquoted text of a value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("<nil>"),
            Value::String(s) => f.write_str(s),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Duration(d) => f.write_str(&format_duration(*d)),
            Value::Time(t) => f.write_str(&t.to_rfc3339()),
            Value::Group(attrs) => {
                f.write_str("[")?;
                for (i, attr) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}={}", attr.key, attr.value)?;
                }
                f.write_str("]")
            }
            Value::Any(v) => write!(f, "{}", v),
            Value::Lazy(_) => f.write_str("<lazy>"),
        }
    }
}

/// Render a duration the way Go's `time.Duration` prints: `0s`, `850ns`,
/// `1.5ms`, `2s`, `5m0s`, `1h2m3.25s`.
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", decimal(nanos, 1_000_000));
    }

    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs_nanos = u128::from(total_secs % 60) * 1_000_000_000 + u128::from(d.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&decimal(secs_nanos, 1_000_000_000));
    out.push('s');
    out
}

/// `value / unit` as a decimal with trailing zeros removed. `unit` is a power of ten.
fn decimal(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(i64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Uint64(u64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Uint64(v as u64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::Time(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v.into())
    }
}

impl From<DateTime<Local>> for Value {
    fn from(v: DateTime<Local>) -> Self {
        Value::Time(v.into())
    }
}

impl From<Vec<Attr>> for Value {
    fn from(v: Vec<Attr>) -> Self {
        Value::Group(v)
    }
}

/// JSON objects become groups (keys in map order); arrays keep their
/// compact JSON text.
#[cfg(feature = "json")]
impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match v {
            Json::Null => Value::Nil,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint64(u)
                } else {
                    Value::Float64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::any(Json::Array(items).to_string()),
            Json::Object(map) => Value::Group(
                map.into_iter()
                    .map(|(key, value)| Attr::new(key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// A key plus a typed [`Value`].
#[derive(Debug, Clone, Default)]
pub struct Attr {
    pub key: String,
    pub value: Value,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }

    /// A group attribute nesting `attrs` under `key`.
    pub fn group(key: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) -> Self {
        Attr {
            key: key.into(),
            value: Value::group(attrs),
        }
    }

    /// True for the tombstone attribute: empty key and [`Value::Nil`].
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.value.is_nil()
    }
}

/// Caller location attached to a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub file: String,
    pub line: u32,
}

impl Source {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Source {
            file: file.into(),
            line,
        }
    }

    /// File name with any directory stripped. Both `/` and `\` separate directories.
    pub fn file_name(&self) -> &str {
        let last = self.file.rsplit(['/', '\\']).next().unwrap_or(self.file.as_str());
        if last.is_empty() {
            return Path::new(&self.file)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(self.file.as_str());
        }
        last
    }
}

/// One structured log event.
#[derive(Debug, Clone)]
pub struct Record {
    /// `None` suppresses the timestamp column.
    pub time: Option<DateTime<FixedOffset>>,
    pub level: Level,
    pub message: String,
    pub source: Option<Source>,
    attrs: Vec<Attr>,
}

impl Record {
    pub fn new(time: Option<DateTime<FixedOffset>>, level: Level, message: impl Into<String>) -> Self {
        Record {
            time,
            level,
            message: message.into(),
            source: None,
            attrs: Vec::new(),
        }
    }

    /// A record stamped with the current local time.
    pub fn now(level: Level, message: impl Into<String>) -> Self {
        Record::new(Some(Local::now().into()), level, message)
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_attr(mut self, attr: Attr) -> Self {
        self.attrs.push(attr);
        self
    }

    pub fn add_attrs(&mut self, attrs: impl IntoIterator<Item = Attr>) {
        self.attrs.extend(attrs);
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn num_attrs(&self) -> usize {
        self.attrs.len()
    }
}
