//! Channel handlers: history scans and message forwarding.

use super::{
    ChannelMediaItem, ChannelMediaQuery, ChannelMediaResponse, DateRange, ForwardRequest,
    ForwardResponse,
};
use crate::api::AppState;
use crate::error::Error;
use crate::provider::{ChannelRef, MediaFilter};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Parse a `YYYY-MM-DD` query parameter
fn parse_window_date(raw: &str, key: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| Error::Config {
        message: format!("invalid date '{raw}', expected YYYY-MM-DD"),
        key: Some(key.to_string()),
    })
}

/// GET /channel/:channel_id/media - Scan a channel's history for media
#[utoipa::path(
    get,
    path = "/channel/{channel_id}/media",
    tag = "channel",
    params(
        ("channel_id" = String, Path, description = "Numeric channel id or public username"),
        ("limit" = Option<usize>, Query, description = "Maximum number of history messages to scan (default: 2000)"),
        ("date_from" = Option<String>, Query, description = "Inclusive start date, YYYY-MM-DD"),
        ("date_to" = Option<String>, Query, description = "Inclusive end date, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Media found inside the window, newest first", body = ChannelMediaResponse),
        (status = 400, description = "Malformed date parameter"),
        (status = 502, description = "Provider could not scan the channel")
    )
)]
pub async fn channel_media(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<ChannelMediaQuery>,
) -> Result<Json<ChannelMediaResponse>, Error> {
    let channel = ChannelRef::parse(&channel_id);

    let from = match query.date_from.as_deref() {
        Some(raw) => parse_window_date(raw, "date_from")?
            .and_time(NaiveTime::MIN)
            .and_utc(),
        None => DateTime::UNIX_EPOCH,
    };

    // The requested end date is inclusive; the scan window's upper bound is
    // exclusive, so advance one day past it
    let until = match query.date_to.as_deref() {
        Some(raw) => {
            let day = parse_window_date(raw, "date_to")?;
            let next = day.succ_opt().ok_or_else(|| Error::Config {
                message: format!("date '{raw}' is out of range"),
                key: Some("date_to".to_string()),
            })?;
            next.and_time(NaiveTime::MIN).and_utc()
        }
        None => Utc::now(),
    };

    let filter = MediaFilter::new(query.limit.unwrap_or(2000), from, until);

    tracing::info!(channel = %channel, limit = filter.limit, "Scanning channel for media");

    let listing = state
        .depot
        .provider()
        .list_media(&channel, &filter)
        .await?;

    let items: Vec<ChannelMediaItem> = listing.items.iter().map(ChannelMediaItem::from).collect();

    tracing::info!(
        channel = %channel,
        found = items.len(),
        scanned = listing.messages_scanned,
        "Channel scan finished"
    );

    Ok(Json(ChannelMediaResponse {
        total_found: items.len(),
        messages_scanned: listing.messages_scanned,
        date_range: DateRange { from, to: until },
        items,
    }))
}

/// POST /forward - Forward messages from one chat to another
#[utoipa::path(
    post,
    path = "/forward",
    tag = "channel",
    request_body = ForwardRequest,
    responses(
        (status = 200, description = "All messages forwarded", body = ForwardResponse),
        (status = 502, description = "Provider refused or failed to forward")
    )
)]
pub async fn forward_messages(
    State(state): State<AppState>,
    Json(payload): Json<ForwardRequest>,
) -> Result<Json<ForwardResponse>, Error> {
    let to_chat = ChannelRef::parse(&payload.to_chat_id);

    tracing::info!(
        from_chat_id = payload.from_chat_id,
        to_chat = %to_chat,
        count = payload.message_ids.len(),
        "Forwarding messages"
    );

    state
        .depot
        .provider()
        .forward(payload.from_chat_id, &to_chat, &payload.message_ids)
        .await?;

    Ok(Json(ForwardResponse {
        status: "success".to_string(),
        forwarded_count: payload.message_ids.len(),
    }))
}
