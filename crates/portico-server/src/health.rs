use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use portico_gateway::GatewayState;
use serde::Serialize;
use portico_resilience::BreakerHealth;

/// Health endpoint payload: service level, feature allow-list, and
/// per-dependency circuit breaker state
#[derive(Serialize)]
struct HealthReport {
    status: &'static str,
    service_level: &'static str,
    features: &'static [&'static str],
    dependencies: Vec<BreakerHealth>,
}

/// Handle `GET /health`
pub async fn health_handler(State(state): State<GatewayState>) -> impl IntoResponse {
    let level = state.degradation().current_level();

    let report = HealthReport {
        status: if state.degradation().is_feature_available("completions") {
            "ok"
        } else {
            "degraded"
        },
        service_level: level.as_str(),
        features: level.features(),
        dependencies: state.breakers().snapshot(),
    };

    Json(report)
}
