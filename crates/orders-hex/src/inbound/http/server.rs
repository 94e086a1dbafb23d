use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    serve, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::order_service::OrderService;
use crate::errors::AppError;
use crate::shutdown;
use orders_types::domain::order::{Item, Order, OrderStatus};
use orders_types::ports::order_repository::OrderRepository;
use orders_types::response::ApiResponse;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

#[derive(Clone)]
pub struct HttpServer<R>
where
    R: OrderRepository,
{
    pub service: Arc<OrderService<R>>,
    pub config: HttpServerConfig,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub items: Vec<Item>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Deserialize)]
pub struct UpdateItemsRequest {
    pub items: Vec<Item>,
}

#[derive(Serialize)]
pub struct CreateOrderResponse {
    pub id: String,
    pub status: OrderStatus,
    pub total: f64,
}

impl From<Order> for CreateOrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            status: o.status,
            total: o.total,
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

impl<R> HttpServer<R>
where
    R: OrderRepository,
{
    pub async fn new(service: OrderService<R>, config: HttpServerConfig) -> anyhow::Result<Self> {
        Ok(Self {
            service: Arc::new(service),
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_request(
                |request: &axum::extract::Request<_>, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        method = %request.method(),
                        uri = %request.uri(),
                        "request"
                    );
                },
            )
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/orders", post(create_order::<R>).get(list_orders::<R>))
            .route("/orders/{id}", get(get_order::<R>))
            .route("/orders/{id}/status", patch(update_status::<R>))
            .route("/orders/{id}/items", put(update_items::<R>))
            .layer(trace_layer)
            .with_state(self.service.clone())
    }

    /// Serves until Ctrl+C or SIGTERM, then drains in-flight requests.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown::signal()).await
    }

    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("server stopped");
        Ok(())
    }
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

async fn health() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::ok(serde_json::json!({ "status": "ok" })))
}

async fn create_order<R>(
    State(service): State<Arc<OrderService<R>>>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreateOrderResponse>>), AppError>
where
    R: OrderRepository,
{
    let payload = body(payload)?;
    let order = service.create_order(payload.user_id, payload.items).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(order.into()))))
}

async fn get_order<R>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
) -> ApiResult<Order>
where
    R: OrderRepository,
{
    let order = service.get_order(&id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

async fn list_orders<R>(State(service): State<Arc<OrderService<R>>>) -> ApiResult<Vec<Order>>
where
    R: OrderRepository,
{
    let list = service.list_orders().await?;
    Ok(Json(ApiResponse::ok(list)))
}

async fn update_status<R>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Order>
where
    R: OrderRepository,
{
    let payload = body(payload)?;
    let updated = service.update_status(&id, payload.status).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

async fn update_items<R>(
    State(service): State<Arc<OrderService<R>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateItemsRequest>, JsonRejection>,
) -> ApiResult<Order>
where
    R: OrderRepository,
{
    let payload = body(payload)?;
    let updated = service.update_items(&id, payload.items).await?;
    Ok(Json(ApiResponse::ok(updated)))
}
