use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::PushReceipt;
use crate::constants::CONTENT_TYPE_HTML;
use crate::generator::render;
use crate::models::{AppState, Node, SubscriptionTarget};
use crate::utils::{match_user_agent, ClientKind};
use crate::web_handlers::status_page::render_status_page;

/// Query parameters for subscription requests
#[derive(Deserialize, Debug, Default, Clone)]
pub struct SubQuery {
    /// Output format, `clash` or anything else for the link bundle
    pub format: Option<String>,
}

/// Body accepted by `POST /update`
#[derive(Deserialize, Debug)]
pub struct UpdatePayload {
    pub nodes: Vec<Node>,
}

fn header_value<'a>(req: &'a HttpRequest, name: header::HeaderName) -> &'a str {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}

/// Handler replacing the stored node set
pub async fn update_handler(
    req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    let secret = &app_state.config.api_secret;
    let auth = header_value(&req, header::AUTHORIZATION);
    if secret.is_empty() || auth != secret.as_str() {
        warn!(
            "Rejected node push from {}",
            req.peer_addr()
                .map(|addr| addr.to_string())
                .unwrap_or_else(|| "unknown peer".to_string())
        );
        return HttpResponse::Unauthorized().body("Unauthorized");
    }

    let payload: UpdatePayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            debug!("Invalid push payload: {}", e);
            return HttpResponse::BadRequest().body(format!("Error: {}", e));
        }
    };

    match app_state.save_nodes(&payload.nodes).await {
        Ok(count) => {
            info!("Stored {} nodes", count);
            HttpResponse::Ok().json(PushReceipt::ok(count))
        }
        Err(e) => {
            error!("Failed to store nodes: {}", e);
            HttpResponse::InternalServerError().body(format!("Error: {}", e))
        }
    }
}

/// Handler serving the stored node set in a negotiated format
pub async fn sub_handler(
    req: HttpRequest,
    query: web::Query<SubQuery>,
    app_state: web::Data<Arc<AppState>>,
) -> HttpResponse {
    debug!("Received subscription request: {:?}", query);

    let nodes = match app_state.load_nodes().await {
        Ok(Some(nodes)) => nodes,
        Ok(None) => {
            return HttpResponse::NotFound().body("No nodes found. Please push data first.");
        }
        Err(e) => {
            error!("Failed to load nodes: {}", e);
            return HttpResponse::InternalServerError().body(format!("Error: {}", e));
        }
    };

    // An explicit format always wins over the user agent
    let format = match query.format.as_deref().filter(|f| !f.is_empty()) {
        Some(format) => format.to_string(),
        None => match match_user_agent(header_value(&req, header::USER_AGENT)) {
            ClientKind::Browser => {
                let url = req.full_url().to_string();
                return match render_status_page(&url, nodes.len(), app_state.store.backend_name())
                {
                    Ok(html) => HttpResponse::Ok().content_type(CONTENT_TYPE_HTML).body(html),
                    Err(e) => {
                        error!("Failed to render status page: {}", e);
                        HttpResponse::InternalServerError().body(format!("Error: {}", e))
                    }
                };
            }
            ClientKind::Clash => SubscriptionTarget::Clash.to_str().to_string(),
            ClientKind::Other => SubscriptionTarget::V2Ray.to_str().to_string(),
        },
    };

    let rendered = render(&nodes, &format);
    debug!(
        "Serving {} nodes as {}",
        nodes.len(),
        SubscriptionTarget::from_format(&format).to_str()
    );
    HttpResponse::Ok()
        .content_type(rendered.content_type)
        .body(rendered.content)
}

/// Send the root path to the subscription
pub async fn root_handler() -> HttpResponse {
    HttpResponse::Found()
        .append_header((header::LOCATION, "/sub"))
        .finish()
}

/// Everything not routed explicitly
pub async fn access_denied() -> HttpResponse {
    HttpResponse::Forbidden().body("Access Denied")
}

/// Register the API endpoints with Actix Web
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/update")
            .route(web::post().to(update_handler))
            .default_service(web::to(access_denied)),
    )
    .service(
        web::resource("/sub{tail:.*}")
            .route(web::get().to(sub_handler))
            .default_service(web::to(access_denied)),
    )
    .service(web::resource("/").to(root_handler))
    .default_service(web::to(access_denied));
}
