//! Directive parser for selector-style queries.
//!
//! A query such as `myQuery{job="api",series_count=3,test}` is split into its
//! labels (kept in first-seen order) and the control directives embedded among
//! them. Directives stay visible as ordinary labels; they are additionally
//! interpreted into a typed [`Directives`] configuration so synthesis never has
//! to look at strings again.

use std::time::Duration;

use thiserror::Error;

use crate::series::Label;

/// Upper bound on `series_count` accepted from a query.
pub const MAX_SERIES_COUNT: usize = 10_000;

/// Default inclusive lower bound for generated values.
pub const DEFAULT_MIN_VALUE: i64 = 0;

/// Default inclusive upper bound for generated values.
pub const DEFAULT_MAX_VALUE: i64 = 100;

const SERIES_COUNT: &str = "series_count";
const MIN_VALUE: &str = "min_value";
const MAX_VALUE: &str = "max_value";
const LATENCY_MS: &str = "latency_ms";
const RANGE_LATENCY_MS: &str = "range_latency_ms";
const LINE_PATTERN: &str = "line_pattern";
const STATUS_CODE: &str = "status_code";
const INVALID_RESPONSE_BODY: &str = "invalid_response_body";
const SERIES_ID: &str = "series_id";

const USAGE_CURVE: &str = "usage_curve";

/// Errors produced while parsing a selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Opening and closing braces do not pair up.
    #[error("unbalanced braces in selector: {0}")]
    UnbalancedBraces(String),
    /// A quoted label value is never closed.
    #[error("unterminated quoted value in selector: {0}")]
    UnterminatedQuote(String),
    /// The metric name before `{` is not a valid identifier.
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),
    /// A label key is empty or not a valid identifier.
    #[error("invalid label name: {0:?}")]
    InvalidLabelName(String),
    /// A label value is neither bare nor properly quoted.
    #[error("invalid value for label {name}: {value}")]
    InvalidLabelValue { name: String, value: String },
    /// Only equality matchers can be turned into labels.
    #[error("unsupported matcher {0:?}: only `=` is accepted")]
    UnsupportedMatcher(String),
    /// A recognized directive carries a value it cannot be interpreted as.
    #[error("invalid value for directive {key}: {value:?}")]
    InvalidDirective { key: String, value: String },
}

/// Shape of the generated values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinePattern {
    /// Independent pseudo-random points.
    #[default]
    Random,
    /// Triangular day curve, high at the span edges and zero at its midpoint.
    UsageCurve,
}

/// A single recognized control directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    SeriesCount(usize),
    MinValue(i64),
    MaxValue(i64),
    Latency(Duration),
    RangeLatency(Duration),
    LinePattern(LinePattern),
    StatusCode(u16),
    InvalidResponseBody,
    SeriesId(u64),
}

impl Directive {
    /// Interpret a label as a directive.
    ///
    /// # Parameters
    ///
    /// - `key` - Label name
    /// - `value` - Unquoted label value (empty for bare tags)
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` for pass-through labels, `Ok(Some(_))` for directives.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidDirective` if a directive value is out of range
    /// or not a number where one is required.
    pub fn parse(key: &str, value: &str) -> Result<Option<Self>, ParseError> {
        let directive = match key {
            SERIES_COUNT => {
                let count: usize = parse_number(key, value)?;
                if count > MAX_SERIES_COUNT {
                    return Err(invalid_directive(key, value));
                }
                Self::SeriesCount(count)
            }
            MIN_VALUE => Self::MinValue(parse_number(key, value)?),
            MAX_VALUE => Self::MaxValue(parse_number(key, value)?),
            LATENCY_MS => Self::Latency(Duration::from_millis(parse_number(key, value)?)),
            RANGE_LATENCY_MS => {
                Self::RangeLatency(Duration::from_millis(parse_number(key, value)?))
            }
            LINE_PATTERN if value == USAGE_CURVE => Self::LinePattern(LinePattern::UsageCurve),
            LINE_PATTERN => Self::LinePattern(LinePattern::Random),
            STATUS_CODE => {
                let code: u16 = parse_number(key, value)?;
                if !(100..=599).contains(&code) {
                    return Err(invalid_directive(key, value));
                }
                Self::StatusCode(code)
            }
            INVALID_RESPONSE_BODY => Self::InvalidResponseBody,
            SERIES_ID => Self::SeriesId(parse_number(key, value)?),
            _ => return Ok(None),
        };
        Ok(Some(directive))
    }
}

/// Typed synthesis configuration collected from the directives of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directives {
    pub series_count: usize,
    pub min_value: i64,
    pub max_value: i64,
    /// Advisory delay for instant queries.
    pub latency: Option<Duration>,
    /// Advisory delay for range queries.
    pub range_latency: Option<Duration>,
    pub line_pattern: LinePattern,
    pub status_code: Option<u16>,
    pub invalid_response_body: bool,
    /// First series id; series are numbered upward from here.
    pub series_id: Option<u64>,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            series_count: 1,
            min_value: DEFAULT_MIN_VALUE,
            max_value: DEFAULT_MAX_VALUE,
            latency: None,
            range_latency: None,
            line_pattern: LinePattern::Random,
            status_code: None,
            invalid_response_body: false,
            series_id: None,
        }
    }
}

impl Directives {
    fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::SeriesCount(n) => self.series_count = n,
            Directive::MinValue(v) => self.min_value = v,
            Directive::MaxValue(v) => self.max_value = v,
            Directive::Latency(d) => self.latency = Some(d),
            Directive::RangeLatency(d) => self.range_latency = Some(d),
            Directive::LinePattern(p) => self.line_pattern = p,
            Directive::StatusCode(c) => self.status_code = Some(c),
            Directive::InvalidResponseBody => self.invalid_response_body = true,
            Directive::SeriesId(id) => self.series_id = Some(id),
        }
    }
}

/// Parsed query: ordered labels, their canonical string and the directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    raw_string: String,
    labels: Vec<Label>,
    directives: Directives,
}

impl Modifiers {
    /// Parse a selector like `name{a=b,c="d",tag}`.
    ///
    /// # Parameters
    ///
    /// - `query` - Selector string; the metric name and braces are optional
    ///
    /// # Returns
    ///
    /// Returns the parsed `Modifiers`. Parsing the same query always yields the
    /// same `raw_string`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` on malformed syntax or invalid directive values. No
    /// partial result is produced.
    pub fn parse(query: &str) -> Result<Self, ParseError> {
        let (name, body) = split_selector(query.trim())?;
        if !name.is_empty() && !is_metric_name(name) {
            return Err(ParseError::InvalidMetricName(name.to_string()));
        }

        let mut labels: Vec<Label> = Vec::new();
        for part in split_label_expressions(body)? {
            let label = parse_label(&part)?;
            match labels.iter_mut().find(|l| l.name == label.name) {
                Some(existing) => existing.value = label.value,
                None => labels.push(label),
            }
        }

        let mut directives = Directives::default();
        for label in &labels {
            if let Some(directive) = Directive::parse(&label.name, &label.value)? {
                directives.apply(directive);
            }
        }
        if let Some(first) = directives.series_id {
            let last_offset = directives.series_count.saturating_sub(1) as u64;
            if first.checked_add(last_offset).is_none() {
                return Err(invalid_directive(SERIES_ID, &first.to_string()));
            }
        }

        let mut modifiers = Self { raw_string: String::new(), labels: Vec::new(), directives };
        for label in labels {
            modifiers.add_label(&format!("\"{}\":\"{}\"", label.name, escape(&label.value)));
            modifiers.labels.push(label);
        }
        Ok(modifiers)
    }

    /// Canonical `"key":"value",...` rendering of the labels; also the generation seed.
    pub fn raw_string(&self) -> &str {
        &self.raw_string
    }

    /// Labels in first-seen order, directives included.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn directives(&self) -> &Directives {
        &self.directives
    }

    /// Append an already rendered label to `raw_string`, comma separated.
    pub(crate) fn add_label(&mut self, label: &str) {
        if !self.raw_string.is_empty() {
            self.raw_string.push(',');
        }
        self.raw_string.push_str(label);
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
fn is_metric_name(name: &str) -> bool {
    is_identifier(name, |c| c == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
fn is_label_name(name: &str) -> bool {
    is_identifier(name, |_| false)
}

fn is_identifier(name: &str, extra: impl Fn(char) -> bool) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_' || extra(first))
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || extra(c))
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| invalid_directive(key, value))
}

fn invalid_directive(key: &str, value: &str) -> ParseError {
    ParseError::InvalidDirective { key: key.to_string(), value: value.to_string() }
}

/// Split `name{...}` into the metric name and the text between the braces.
fn split_selector(query: &str) -> Result<(&str, &str), ParseError> {
    let Some(pos) = query.find('{') else {
        if query.contains('}') {
            return Err(ParseError::UnbalancedBraces(query.to_string()));
        }
        return Ok((query, ""));
    };

    let inner = query[pos + 1..]
        .strip_suffix('}')
        .ok_or_else(|| ParseError::UnbalancedBraces(query.to_string()))?;
    Ok((query[..pos].trim(), inner))
}

/// Split label expressions by comma, handling quoted strings
fn split_label_expressions(input: &str) -> Result<Vec<String>, ParseError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        match ch {
            '\\' if in_quotes => {
                escape_next = true;
                current.push(ch);
            }
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '{' | '}' if !in_quotes => {
                return Err(ParseError::UnbalancedBraces(input.to_string()));
            }
            ',' if !in_quotes => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => {
                current.push(ch);
            }
        }
    }

    if in_quotes || escape_next {
        return Err(ParseError::UnterminatedQuote(input.to_string()));
    }

    // A single trailing comma is tolerated, as in PromQL.
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    Ok(parts)
}

/// Parse a single `key=value`, `key="value"` or bare `key` expression.
fn parse_label(expr: &str) -> Result<Label, ParseError> {
    let Some(pos) = expr.find('=') else {
        return validated_name(expr).map(|name| Label::new(name, ""));
    };

    let name = expr[..pos].trim();
    let raw_value = expr[pos + 1..].trim();
    if name.ends_with('!') || raw_value.starts_with('~') {
        return Err(ParseError::UnsupportedMatcher(expr.to_string()));
    }

    let name = validated_name(name)?;
    let value = parse_value(name, raw_value)?;
    Ok(Label::new(name, value))
}

fn validated_name(name: &str) -> Result<&str, ParseError> {
    let name = name.trim();
    if is_label_name(name) {
        Ok(name)
    } else {
        Err(ParseError::InvalidLabelName(name.to_string()))
    }
}

/// Strip quotes and resolve escapes; bare values are taken verbatim.
fn parse_value(name: &str, raw: &str) -> Result<String, ParseError> {
    let invalid =
        || ParseError::InvalidLabelValue { name: name.to_string(), value: raw.to_string() };

    if let Some(quoted) = raw.strip_prefix('"') {
        let inner = quoted.strip_suffix('"').ok_or_else(invalid)?;
        let mut value = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(ch) = chars.next() {
            match ch {
                '\\' => match chars.next() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some(other) => value.push(other),
                    None => return Err(invalid()),
                },
                '"' => return Err(invalid()),
                _ => value.push(ch),
            }
        }
        return Ok(value);
    }

    if raw.chars().any(|c| c == '"' || c.is_whitespace()) {
        return Err(invalid());
    }
    Ok(raw.to_string())
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
