//! Threshold expressions: pass/fail rules over aggregated metrics
//!
//! Expressions follow the familiar load-testing grammar: an aggregate, a
//! comparison operator and a numeric bound, e.g. `rate<0.01`, `p(95)<1000`,
//! `count>=10`. A [`Threshold`] pairs one expression with the metric it
//! judges. Parsing is strict so a typo fails configuration validation
//! instead of silently passing the run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing a threshold expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ThresholdParseError {
    #[error("empty threshold expression")]
    Empty,

    #[error("missing comparison operator in '{0}' (expected <, <=, >, >= or ==)")]
    MissingOperator(String),

    #[error("unknown aggregate '{0}' (expected rate, count, avg, min, max or p(N))")]
    UnknownAggregate(String),

    #[error("invalid percentile in '{0}': {1}")]
    InvalidPercentile(String, String),

    #[error("invalid bound in '{0}': {1}")]
    InvalidBound(String, String),
}

/// Aggregate functions a threshold can apply to a metric series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    /// Proportion of flagged samples in a rate series, `flagged / total`.
    Rate,
    /// Total number of observations.
    Count,
    /// Mean of a latency series.
    Avg,
    /// Minimum of a latency series.
    Min,
    /// Maximum of a latency series.
    Max,
    /// Percentile of a latency series, in percent (`p(95)` is 95.0).
    Percentile(f64),
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Rate => write!(f, "rate"),
            Aggregate::Count => write!(f, "count"),
            Aggregate::Avg => write!(f, "avg"),
            Aggregate::Min => write!(f, "min"),
            Aggregate::Max => write!(f, "max"),
            Aggregate::Percentile(p) => {
                if p.fract() == 0.0 {
                    write!(f, "p({})", *p as u64)
                } else {
                    write!(f, "p({})", p)
                }
            }
        }
    }
}

/// Comparison operators usable in threshold expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Eq => "==",
        }
    }

    /// Apply the comparison with the observed value on the left.
    pub fn compare(&self, observed: f64, bound: f64) -> bool {
        match self {
            CompareOp::Lt => observed < bound,
            CompareOp::Le => observed <= bound,
            CompareOp::Gt => observed > bound,
            CompareOp::Ge => observed >= bound,
            CompareOp::Eq => observed == bound,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed threshold expression: aggregate, operator, bound.
///
/// Serializes as its source string (`"p(95)<1000"`) so reports and configs
/// stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ThresholdExpr {
    pub aggregate: Aggregate,
    pub op: CompareOp,
    pub bound: f64,
}

impl fmt::Display for ThresholdExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.aggregate, self.op, self.bound)
    }
}

impl From<ThresholdExpr> for String {
    fn from(expr: ThresholdExpr) -> Self {
        expr.to_string()
    }
}

impl TryFrom<String> for ThresholdExpr {
    type Error = ThresholdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ThresholdExpr {
    type Err = ThresholdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ThresholdParseError::Empty);
        }

        // Two-character operators must be matched before their one-character
        // prefixes.
        let (agg_str, op, bound_str) = ["<=", ">=", "==", "<", ">"]
            .iter()
            .find_map(|op_str| {
                trimmed.split_once(op_str).map(|(lhs, rhs)| {
                    let op = match *op_str {
                        "<=" => CompareOp::Le,
                        ">=" => CompareOp::Ge,
                        "==" => CompareOp::Eq,
                        "<" => CompareOp::Lt,
                        _ => CompareOp::Gt,
                    };
                    (lhs.trim(), op, rhs.trim())
                })
            })
            .ok_or_else(|| ThresholdParseError::MissingOperator(trimmed.to_string()))?;

        let aggregate = parse_aggregate(agg_str, trimmed)?;
        let bound: f64 = bound_str
            .parse()
            .map_err(|e: std::num::ParseFloatError| {
                ThresholdParseError::InvalidBound(trimmed.to_string(), e.to_string())
            })?;

        Ok(Self { aggregate, op, bound })
    }
}

fn parse_aggregate(agg: &str, expr: &str) -> Result<Aggregate, ThresholdParseError> {
    match agg {
        "rate" => Ok(Aggregate::Rate),
        "count" => Ok(Aggregate::Count),
        "avg" => Ok(Aggregate::Avg),
        "min" => Ok(Aggregate::Min),
        "max" => Ok(Aggregate::Max),
        _ => {
            if let Some(inner) = agg.strip_prefix("p(").and_then(|a| a.strip_suffix(')')) {
                let p: f64 = inner.trim().parse().map_err(|e: std::num::ParseFloatError| {
                    ThresholdParseError::InvalidPercentile(expr.to_string(), e.to_string())
                })?;
                if !(0.0..=100.0).contains(&p) {
                    return Err(ThresholdParseError::InvalidPercentile(
                        expr.to_string(),
                        format!("{} is outside 0..=100", p),
                    ));
                }
                Ok(Aggregate::Percentile(p))
            } else {
                Err(ThresholdParseError::UnknownAggregate(agg.to_string()))
            }
        }
    }
}

/// A named metric paired with a threshold expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    /// Metric the expression is evaluated against, e.g. `http_req_failed`.
    pub metric: String,

    pub expr: ThresholdExpr,
}

impl Threshold {
    pub fn parse(metric: impl Into<String>, expr: &str) -> Result<Self, ThresholdParseError> {
        Ok(Self {
            metric: metric.into(),
            expr: expr.parse()?,
        })
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.metric, self.expr)
    }
}
