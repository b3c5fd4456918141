//! Log event family: application logs, HTTP access logs, host metrics and
//! security events.

use super::maybe;
use crate::document::Document;
use crate::fake::FakeData;
use crate::registry::{CorpusRng, SizeBand, TemplateError, TemplateFamily, TierSpec};
use rand::Rng;
use serde_json::{json, Value};

const TIERS: &[TierSpec] = &[
    TierSpec {
        name: "app",
        weight: 0.50,
        band: SizeBand::new(400, 2_000),
        description: "application log line",
    },
    TierSpec {
        name: "access",
        weight: 0.30,
        band: SizeBand::new(500, 1_500),
        description: "HTTP access log",
    },
    TierSpec {
        name: "metric",
        weight: 0.15,
        band: SizeBand::new(800, 2_000),
        description: "host and process metrics sample",
    },
    TierSpec {
        name: "security",
        weight: 0.05,
        band: SizeBand::new(400, 1_500),
        description: "security audit event",
    },
];

const LEVELS: &[&str] = &["DEBUG", "INFO", "WARN", "ERROR", "FATAL"];

const SERVICES: &[&str] = &[
    "auth-service",
    "user-service",
    "payment-service",
    "order-service",
    "inventory-service",
    "notification-service",
    "api-gateway",
    "web-frontend",
    "mobile-backend",
    "analytics-service",
    "search-service",
    "recommendations",
];

const ENVIRONMENTS: &[&str] = &["production", "staging", "development", "test"];
const DATACENTERS: &[&str] = &["us-east", "us-west", "eu-central", "ap-south"];
const EXCEPTIONS: &[&str] = &[
    "NullPointerException",
    "SQLException",
    "TimeoutException",
    "ValidationException",
];

const HTTP_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"];
const STATUS_CODES: &[i64] = &[200, 201, 204, 301, 302, 400, 401, 403, 404, 500, 502, 503];
const CONTENT_TYPES: &[&str] = &[
    "text/html",
    "application/json",
    "text/css",
    "application/javascript",
    "image/png",
];
const CACHE_STATUSES: &[&str] = &["HIT", "MISS", "BYPASS"];
const LANGUAGES: &[&str] = &["en-US", "en-GB", "es-ES", "fr-FR", "de-DE"];
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_7_1 like Mac OS X)",
    "Mozilla/5.0 (Android 11; Mobile; rv:68.0) Gecko/68.0",
];

const ALERT_TYPES: &[&str] = &["cpu_high", "memory_high", "disk_full", "service_down"];
const ALERT_SEVERITIES: &[&str] = &["warning", "critical"];

const SECURITY_EVENTS: &[&str] = &[
    "login_attempt",
    "permission_denied",
    "suspicious_activity",
    "data_access",
    "config_change",
];
const SEVERITIES: &[&str] = &["low", "medium", "high", "critical"];
const USER_ROLES: &[&str] = &["admin", "user", "guest", "service"];
const RESOURCE_TYPES: &[&str] = &["file", "database", "api_endpoint", "configuration"];
const PERMISSIONS: &[&str] = &["read", "write", "execute", "admin"];
const ACTIONS: &[&str] = &["access", "modify", "delete", "create", "login"];
const RESULTS: &[&str] = &["success", "failure", "blocked"];
const DEVICE_TYPES: &[&str] = &["desktop", "mobile", "tablet", "server"];
const OPERATING_SYSTEMS: &[&str] = &["Windows", "macOS", "Linux", "iOS", "Android"];

/// `app`/`access`/`metric`/`security` log tiers
#[derive(Debug, Clone, Copy, Default)]
pub struct LogsFamily;

impl TemplateFamily for LogsFamily {
    fn name(&self) -> &'static str {
        "logs"
    }

    fn tiers(&self) -> &'static [TierSpec] {
        TIERS
    }

    fn generate(
        &self,
        tier: &str,
        id: &str,
        rng: &mut CorpusRng,
    ) -> Result<Document, TemplateError> {
        let mut fake = FakeData::new(rng);
        let value = match tier {
            "app" => application_log(id, &mut fake),
            "access" => access_log(id, &mut fake),
            "metric" => system_metric(id, &mut fake),
            "security" => security_event(id, &mut fake),
            other => return Err(self.unknown_tier(other)),
        };
        Document::from_value(value)
    }
}

fn host<R: Rng>(fake: &mut FakeData<R>) -> String {
    format!("server-{:03}", fake.int_range(1, 20))
}

fn stack_trace<R: Rng>(fake: &mut FakeData<R>, min: i64, max: i64) -> Vec<String> {
    let frames = fake.int_range(min, max);
    (0..frames)
        .map(|_| {
            format!(
                "at {}.{}({}.java:{})",
                fake.word(),
                fake.word(),
                fake.word(),
                fake.int_range(1, 500)
            )
        })
        .collect()
}

fn application_log<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let timestamp = fake.datetime_within(7);
    let level = *fake.pick(LEVELS);
    let service = *fake.pick(SERVICES);

    let (message, exception) = match level {
        "ERROR" => {
            let message = format!("Error processing request: {}", fake.any_sentence());
            let exception = maybe(fake, 0.7, |f| {
                json!({
                    "type": f.pick(EXCEPTIONS),
                    "message": f.any_sentence(),
                    "stack_trace": stack_trace(f, 3, 8),
                })
            });
            (message, exception)
        }
        "WARN" => (format!("Warning: {}", fake.any_sentence()), Value::Null),
        "INFO" => (
            format!("Successfully processed: {}", fake.any_sentence()),
            Value::Null,
        ),
        "DEBUG" => (format!("Debug info: {}", fake.any_sentence()), Value::Null),
        _ => {
            let message = format!("Critical system failure: {}", fake.any_sentence());
            let exception = json!({
                "type": "SystemException",
                "message": fake.any_sentence(),
                "stack_trace": stack_trace(fake, 5, 15),
            });
            (message, exception)
        }
    };

    let host = host(fake);
    let environment = fake.pick(ENVIRONMENTS);
    let thread = format!("thread-{}", fake.int_range(1, 100));
    let logger = format!("{}.{}", service, fake.word());
    let correlation_id = fake.hex_token(8);
    let session_id = maybe(fake, 0.6, |f| json!(f.hex_token(16)));
    let user_id = maybe(fake, 0.4, |f| json!(f.int_range(1, 100_000)));
    let request_id = maybe(fake, 0.8, |f| json!(f.uuid()));
    let duration_ms = if matches!(level, "INFO" | "WARN") {
        json!(fake.int_range(1, 5000))
    } else {
        Value::Null
    };
    let memory_usage = maybe(fake, 0.2, |f| {
        json!({
            "heap": format!("{}MB", f.int_range(100, 2048)),
            "non_heap": format!("{}MB", f.int_range(50, 512)),
            "used": format!("{}MB", f.int_range(200, 1500)),
        })
    });
    let tag_count = fake.int_range(1, 4) as usize;

    json!({
        "id": id,
        "timestamp": timestamp,
        "type": "application",
        "level": level,
        "message": message,
        "service": service,
        "host": host,
        "environment": environment,
        "thread": thread,
        "logger": logger,
        "correlation_id": correlation_id,
        "session_id": session_id,
        "user_id": user_id,
        "request_id": request_id,
        "duration_ms": duration_ms,
        "memory_usage": memory_usage,
        "exception": exception,
        "tags": fake.words(tag_count),
        "metadata": {
            "version": format!(
                "{}.{}.{}",
                fake.int_range(1, 3),
                fake.int_range(0, 9),
                fake.int_range(0, 9)
            ),
            "build": format!("build-{}", fake.int_range(1000, 9999)),
            "region": fake.country_code(),
            "datacenter": format!("dc-{}", fake.pick(DATACENTERS)),
        },
    })
}

fn access_log<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let timestamp = fake.datetime_within(7);
    let method = fake.pick(HTTP_METHODS);
    let status_code = *fake.pick(STATUS_CODES);
    let remote_addr = fake.ipv4();
    let remote_user = maybe(fake, 0.3, |f| json!(f.user_name()));

    let request = json!({
        "method": method,
        "url": fake.uri_path(),
        "query_string": maybe(fake, 0.4, |f| json!(f.uri_path())),
        "protocol": "HTTP/1.1",
        "headers": {
            "user_agent": fake.pick(USER_AGENTS),
            "referer": maybe(fake, 0.6, |f| json!(f.url())),
            "accept_language": fake.pick(LANGUAGES),
            "x_forwarded_for": maybe(fake, 0.3, |f| json!(f.ipv4())),
        },
    });

    let content_length = if status_code == 200 {
        fake.int_range(100, 50_000)
    } else {
        fake.int_range(0, 1000)
    };
    let response = json!({
        "status_code": status_code,
        "content_length": content_length,
        "content_type": fake.pick(CONTENT_TYPES),
        "cache_status": maybe(fake, 0.7, |f| json!(f.pick(CACHE_STATUSES))),
    });

    let timing = json!({
        "response_time_ms": fake.int_range(1, 3000),
        "upstream_time_ms": maybe(fake, 0.6, |f| json!(f.int_range(1, 2000))),
    });

    let geo = maybe(fake, 0.8, |f| {
        let (city, _, code) = f.place();
        let (lat, lon) = f.coordinates();
        json!({
            "country": code,
            "city": city,
            "coordinates": { "lat": lat, "lon": lon },
        })
    });

    json!({
        "id": id,
        "timestamp": timestamp,
        "type": "access",
        "remote_addr": remote_addr,
        "remote_user": remote_user,
        "request": request,
        "response": response,
        "timing": timing,
        "geo": geo,
        "session_id": maybe(fake, 0.5, |f| json!(f.hex_token(16))),
        "user_id": maybe(fake, 0.3, |f| json!(f.int_range(1, 100_000))),
        "host": host(fake),
        "server_name": fake.domain(),
        "ssl": fake.bool_with_probability(0.8),
        "bot_detected": fake.bool_with_probability(0.1),
    })
}

fn system_metric<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let timestamp = fake.datetime_within(7);
    let host = host(fake);
    let service = fake.pick(SERVICES);

    let metrics = json!({
        "cpu": {
            "usage_percent": fake.float(0.0, 100.0, 2),
            "load_1m": fake.float(0.0, 8.0, 2),
            "load_5m": fake.float(0.0, 6.0, 2),
            "load_15m": fake.float(0.0, 4.0, 2),
        },
        "memory": {
            "usage_percent": fake.float(20.0, 95.0, 2),
            "used_mb": fake.int_range(1000, 8000),
            "available_mb": fake.int_range(2000, 16_000),
            "swap_used_mb": fake.int_range(0, 2000),
        },
        "disk": {
            "usage_percent": fake.float(10.0, 90.0, 2),
            "read_iops": fake.int_range(0, 1000),
            "write_iops": fake.int_range(0, 500),
            "read_throughput_mb": fake.float(0.0, 100.0, 2),
            "write_throughput_mb": fake.float(0.0, 50.0, 2),
        },
        "network": {
            "rx_bytes": fake.int_range(1_000_000, 100_000_000),
            "tx_bytes": fake.int_range(500_000, 50_000_000),
            "rx_packets": fake.int_range(1000, 100_000),
            "tx_packets": fake.int_range(500, 50_000),
            "errors": fake.int_range(0, 10),
        },
        "application": {
            "active_connections": fake.int_range(0, 1000),
            "queue_size": fake.int_range(0, 100),
            "threads_active": fake.int_range(5, 200),
            "heap_usage_mb": fake.int_range(100, 2048),
            "gc_collections": fake.int_range(0, 20),
            "gc_time_ms": fake.int_range(0, 500),
        },
    });

    let alerts: Vec<Value> = if fake.bool_with_probability(0.1) {
        let count = fake.int_range(0, 2);
        (0..count)
            .map(|_| {
                json!({
                    "type": fake.pick(ALERT_TYPES),
                    "severity": fake.pick(ALERT_SEVERITIES),
                    "message": fake.any_sentence(),
                })
            })
            .collect()
    } else {
        Vec::new()
    };

    json!({
        "id": id,
        "timestamp": timestamp,
        "type": "metric",
        "host": host,
        "service": service,
        "metrics": metrics,
        "alerts": alerts,
        "environment": fake.pick(ENVIRONMENTS),
    })
}

fn security_event<R: Rng>(id: &str, fake: &mut FakeData<R>) -> Value {
    let timestamp = fake.datetime_within(7);
    let event_type = fake.pick(SECURITY_EVENTS);
    let severity = fake.pick(SEVERITIES);
    let source_ip = fake.ipv4();

    let user = json!({
        "id": maybe(fake, 0.8, |f| json!(f.int_range(1, 100_000))),
        "username": maybe(fake, 0.8, |f| json!(f.user_name())),
        "role": maybe(fake, 0.8, |f| json!(f.pick(USER_ROLES))),
    });

    let resource = json!({
        "type": fake.pick(RESOURCE_TYPES),
        "path": fake.file_path(),
        "permissions": fake.pick(PERMISSIONS),
    });

    let action = json!({
        "attempted": fake.pick(ACTIONS),
        "result": fake.pick(RESULTS),
        "details": fake.any_sentence(),
    });

    let geo_location = maybe(fake, 0.7, |f| {
        let (city, _, code) = f.place();
        let (lat, lon) = f.coordinates();
        json!({
            "country": code,
            "city": city,
            "coordinates": { "lat": lat, "lon": lon },
        })
    });

    let device_info = maybe(fake, 0.6, |f| {
        json!({
            "user_agent": f.pick(USER_AGENTS),
            "device_type": f.pick(DEVICE_TYPES),
            "os": f.pick(OPERATING_SYSTEMS),
        })
    });

    let tag_count = fake.int_range(1, 4) as usize;

    json!({
        "id": id,
        "timestamp": timestamp,
        "type": "security",
        "event_type": event_type,
        "severity": severity,
        "source_ip": source_ip,
        "user": user,
        "resource": resource,
        "action": action,
        "geo_location": geo_location,
        "device_info": device_info,
        "risk_score": fake.float(0.0, 100.0, 1),
        "tags": fake.words(tag_count),
        "correlation_id": fake.hex_token(8),
    })
}
