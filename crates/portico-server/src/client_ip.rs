use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::Response;
use portico_config::ClientIpConfig;

/// Best available client identifier for this request, resolved once and
/// shared with the rate limiter and request context
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

/// Resolve the client IP and store it as a request extension.
///
/// Proxy-chain aware: with `trusted_hops` configured, the address that many
/// hops from the end of `x-forwarded-for` is used; otherwise the first
/// entry. Falls back to `x-real-ip`, then the direct peer address.
pub async fn client_ip_middleware(config: Option<ClientIpConfig>, mut request: Request, next: Next) -> Response {
    let ip = resolve(&request, config.as_ref());
    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}

fn resolve(request: &Request, config: Option<&ClientIpConfig>) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
    {
        let hops: Vec<&str> = value.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
        let trusted_hops = config.and_then(|c| c.trusted_hops);

        let picked = match trusted_hops {
            Some(n) if n > 0 && n <= hops.len() => hops.get(hops.len() - n),
            Some(_) => None,
            None => hops.first(),
        };
        if let Some(ip) = picked {
            return (*ip).to_owned();
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
    {
        return value.trim().to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |info| info.0.ip().to_string())
}
