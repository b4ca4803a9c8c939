//! Metrics definitions for the aggregator.

use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Route request duration in seconds. Tagged with route, status.",
};

pub const FALLBACK_RESOLVED: MetricDef = MetricDef {
    name: "fallback.resolved",
    metric_type: MetricType::Counter,
    description: "Lookups resolved by the fallback resolver. Tagged with route, stage.",
};

pub const RATE_LIMIT_REJECTED: MetricDef = MetricDef {
    name: "rate_limit.rejected",
    metric_type: MetricType::Counter,
    description: "Requests rejected because the client is still in its cooldown window",
};

pub const TOKEN_EXCHANGE_FAILED: MetricDef = MetricDef {
    name: "token_exchange.failed",
    metric_type: MetricType::Counter,
    description: "Refresh-token exchanges that did not yield an access token",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    FALLBACK_RESOLVED,
    RATE_LIMIT_REJECTED,
    TOKEN_EXCHANGE_FAILED,
];
