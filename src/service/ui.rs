//! HTTP interface
//!
//! Serves the catalog, item pages, bid submission and the admin results as
//! JSON. The server runs on its own tokio runtime; storage calls are blocking
//! and go through `spawn_blocking`.
use crate::{
    auction::{
        format_amount, Bid, BidRequest, ItemId, ItemResult, Rejection, RoundId, RoundWinnings,
        MAX_STORED,
    },
    persistence::Persistence,
    service::{BidError, BiddingService, LoopService, ResultsService},
};
use anyhow::{format_err, Context, Result};
use axum::{
    extract::{Form, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};
use tokio::{runtime::Runtime, sync::oneshot};
use tracing::{error, info, warn};

mod auth;
mod metrics;

pub use self::{auth::AdminCredentials, metrics::Metrics};

/// Everything the request handlers need
#[derive(Clone)]
pub struct AppState<P: Persistence> {
    event: Arc<str>,
    bidding: Arc<BiddingService<P>>,
    results: Arc<ResultsService<P>>,
    admin: Arc<AdminCredentials>,
}

impl<P: Persistence> AppState<P> {
    pub fn new(
        event: &str,
        bidding: BiddingService<P>,
        results: ResultsService<P>,
        admin: AdminCredentials,
    ) -> Self {
        Self {
            event: event.into(),
            bidding: Arc::new(bidding),
            results: Arc::new(results),
            admin: Arc::new(admin),
        }
    }

    /// Item pages live under the event title; anything else is not ours
    fn item_id(&self, event: &str, item_id: &str) -> Result<ItemId, ApiError> {
        if event != &*self.event {
            return Err(ApiError::NotFound);
        }
        parse_number(item_id, "Invalid Item")
    }
}

/// Ids and amounts from the outside, limited to what storage can hold
fn parse_number(input: &str, message: &'static str) -> Result<u64, ApiError> {
    input
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|number| *number <= MAX_STORED)
        .ok_or(ApiError::MalformedInput(message))
}

#[derive(Debug)]
enum ApiError {
    MalformedInput(&'static str),
    NotFound,
    Rejected(Rejection),
    Unauthorized,
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl From<BidError> for ApiError {
    fn from(e: BidError) -> Self {
        match e {
            BidError::Rejected(rejection) => ApiError::Rejected(rejection),
            BidError::Internal(e) => ApiError::Internal(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            ApiError::MalformedInput(message) => {
                (StatusCode::BAD_REQUEST, "malformed_input", message.to_string())
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", "Not found".to_owned()),
            ApiError::Rejected(rejection) => {
                let status = match rejection {
                    Rejection::ItemNotFound => StatusCode::NOT_FOUND,
                    Rejection::AuctionClosed => StatusCode::FORBIDDEN,
                    Rejection::BelowMinimum { .. }
                    | Rejection::BelowHighBid { .. }
                    | Rejection::DuplicateAmount { .. } => StatusCode::CONFLICT,
                };
                (status, rejection.code(), rejection.to_string())
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Unauthorized".to_owned(),
            ),
            ApiError::Internal(e) => {
                error!(?e, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Something went wrong, please try again".to_owned(),
                )
            }
        };

        let mut response = (status, Json(ErrorBody { error, message })).into_response();
        if let ApiError::Unauthorized = self {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(r#"Basic realm="restricted", charset="UTF-8""#),
            );
        }
        response
    }
}

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
}

#[derive(Serialize)]
struct IndexView {
    event: String,
    closes_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct ItemView {
    #[serde(flatten)]
    result: ItemResult,
    value_display: String,
    high_bid_display: Option<String>,
}

impl From<ItemResult> for ItemView {
    fn from(result: ItemResult) -> Self {
        Self {
            value_display: format_amount(result.item.value),
            high_bid_display: result.high_bid.map(|bid| format_amount(bid.amount)),
            result,
        }
    }
}

#[derive(Serialize)]
struct BidView {
    event: String,
    item_name: String,
    bid: Bid,
    amount_display: String,
}

#[derive(Serialize)]
struct AdminView {
    event: String,
    items: Vec<ItemView>,
    winners: BTreeMap<RoundId, RoundWinnings>,
}

#[derive(Deserialize)]
struct BidForm {
    #[serde(rename = "AuctionID", default)]
    auction_id: String,
    #[serde(rename = "BidAmount", default)]
    bid_amount: String,
}

async fn index<P: Persistence>(
    State(state): State<AppState<P>>,
) -> Result<Json<IndexView>, ApiError> {
    Metrics::get()?.index_total.inc();
    Ok(Json(IndexView {
        event: state.event.to_string(),
        closes_at: state.bidding.clock().closes_at(),
    }))
}

async fn list_items<P: Persistence>(
    State(state): State<AppState<P>>,
) -> Result<Json<Vec<ItemView>>, ApiError> {
    let results = state.results.clone();
    let items = blocking(move || Ok(results.item_results()?)).await?;
    Ok(Json(items.into_iter().map(ItemView::from).collect()))
}

async fn get_item<P: Persistence>(
    State(state): State<AppState<P>>,
    Path((event, item_id)): Path<(String, String)>,
) -> Result<Json<ItemView>, ApiError> {
    let item_id = state.item_id(&event, &item_id)?;
    let results = state.results.clone();
    let result = blocking(move || Ok(results.item_result(item_id)?))
        .await?
        .ok_or(ApiError::NotFound)?;
    Metrics::get()?
        .item_total
        .with_label_values(&[result.item.name.as_str(), "GET"])
        .inc();
    info!(item_id, "item requested");
    Ok(Json(result.into()))
}

async fn post_bid<P: Persistence>(
    State(state): State<AppState<P>>,
    Path((event, item_id)): Path<(String, String)>,
    Form(form): Form<BidForm>,
) -> Result<(StatusCode, Json<BidView>), ApiError> {
    let request = BidRequest {
        item_id: state.item_id(&event, &item_id)?,
        round_id: parse_number(&form.auction_id, "Auction ID must be a number")?,
        amount: parse_number(&form.bid_amount, "Bid Amount must be a number")?,
    };

    let bidding = state.bidding.clone();
    let results = state.results.clone();
    let (bid, item) = blocking(move || {
        let bid = bidding.place_bid(request)?;
        let item = results
            .item_result(bid.item_id)?
            .ok_or_else(|| format_err!("admitted bid for missing item {}", bid.item_id))?
            .item;
        Ok((bid, item))
    })
    .await?;

    Metrics::get()?
        .item_total
        .with_label_values(&[item.name.as_str(), "POST"])
        .inc();

    Ok((
        StatusCode::CREATED,
        Json(BidView {
            event: state.event.to_string(),
            item_name: item.name,
            amount_display: format_amount(bid.amount),
            bid,
        }),
    ))
}

async fn admin<P: Persistence>(
    State(state): State<AppState<P>>,
    headers: HeaderMap,
) -> Result<Json<AdminView>, ApiError> {
    if !state.admin.verify(headers.get(header::AUTHORIZATION)) {
        warn!("admin request with bad credentials");
        return Err(ApiError::Unauthorized);
    }

    Metrics::get()?.admin_total.inc();

    let results = state.results.clone();
    let standings = blocking(move || Ok(results.standings()?)).await?;
    info!(rounds = standings.winners.len(), "admin request");

    Ok(Json(AdminView {
        event: state.event.to_string(),
        items: standings.items.into_iter().map(ItemView::from).collect(),
        winners: standings.winners,
    }))
}

async fn serve_metrics() -> Result<String, ApiError> {
    Ok(metrics::encode()?)
}

pub fn router<P: Persistence>(state: AppState<P>) -> Router {
    Router::new()
        .route("/", get(index::<P>))
        .route("/items", get(list_items::<P>))
        .route("/admin", get(admin::<P>))
        .route("/metrics", get(serve_metrics))
        .route("/:event/:item_id", get(get_item::<P>).post(post_bid::<P>))
        .with_state(state)
}

pub struct Ui {
    // cancels all tasks on drop
    _runtime: Runtime,
    server_rx: oneshot::Receiver<Result<()>>,
}

async fn run_http_server(bind_address: SocketAddr, app: Router) -> Result<()> {
    info!(%bind_address, "http server listening");
    axum::Server::try_bind(&bind_address)?
        .serve(app.into_make_service())
        .await?;

    Ok(())
}

impl Ui {
    pub fn new<P: Persistence>(bind_address: SocketAddr, state: AppState<P>) -> Result<Self> {
        let runtime = Runtime::new()?;
        let app = router(state);

        let (tx, rx) = oneshot::channel();

        runtime.spawn(async move {
            let res = run_http_server(bind_address, app)
                .await
                .with_context(|| format!("Failed to run http server on {bind_address}"));
            if tx.send(res).is_err() {
                warn!("http server stopped after the ui service went away");
            }
        });

        Ok(Self {
            _runtime: runtime,
            server_rx: rx,
        })
    }
}

impl LoopService for Ui {
    fn run_iteration(&mut self) -> Result<()> {
        // don't hog the cpu
        std::thread::sleep(std::time::Duration::from_millis(100));

        match self.server_rx.try_recv() {
            Ok(res) => res,
            Err(oneshot::error::TryRecvError::Empty) => Ok(()),
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(format_err!("ui server died without leaving a response?!"))
            }
        }
    }
}
