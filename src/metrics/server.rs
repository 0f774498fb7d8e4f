use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::Next;
use actix_web::{web, HttpResponse, Responder};
use prometheus::{Encoder, TextEncoder};
use std::time::Instant;

use super::ServiceMetrics;

/// GET /metrics in Prometheus text exposition format
pub async fn metrics_handler(metrics: web::Data<ServiceMetrics>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

/// Request counting/latency middleware, mounted with `middleware::from_fn`.
///
/// Routes are labelled by their pattern (`/analytics/stats/user/{user_id}`)
/// rather than the concrete path to keep label cardinality bounded.
pub async fn track_requests(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let metrics = req.app_data::<web::Data<ServiceMetrics>>().cloned();
    let method = req.method().to_string();
    let route = req.match_pattern().unwrap_or_else(|| "unmatched".to_string());
    let started = Instant::now();

    let response = next.call(req).await?;

    if let Some(metrics) = metrics {
        metrics.record_request(
            &method,
            &route,
            response.status().as_u16(),
            started.elapsed().as_secs_f64(),
        );
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{middleware, test, App};

    #[actix_web::test]
    async fn test_metrics_endpoint_reports_requests() {
        let metrics = web::Data::new(ServiceMetrics::new().unwrap());
        let app = test::init_service(
            App::new()
                .app_data(metrics.clone())
                .wrap(middleware::from_fn(track_requests))
                .route("/ping", web::get().to(|| async { HttpResponse::Ok().finish() }))
                .route("/metrics", web::get().to(metrics_handler)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;
        assert!(resp.status().is_success());

        let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("http_requests_total"));
        assert!(text.contains("route=\"/ping\""));
    }
}
