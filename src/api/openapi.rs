//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the media-depot REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-depot REST API
///
/// This struct is used to generate the OpenAPI 3.1 specification that describes
/// all available endpoints, request/response types, and API behavior.
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-depot REST API",
        version = "0.1.0",
        description = "OpenAPI 3.1 compliant REST API for downloading media from chat channels, polling task progress, and fetching finished artifacts",
        contact(
            name = "media-depot",
            url = "https://github.com/jvz-devx/media-depot"
        ),
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Download lifecycle
        crate::api::routes::request_download,
        crate::api::routes::download_status,
        crate::api::routes::fetch_download,
        crate::api::routes::list_tasks,

        // Channel operations
        crate::api::routes::channel_media,
        crate::api::routes::forward_messages,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::Priority,
        crate::types::SourceRef,
        crate::types::TaskSummary,
        crate::types::TaskPage,
        crate::types::DepotStats,

        // API request/response types from routes
        crate::api::routes::DownloadRequest,
        crate::api::routes::RequestDownloadResponse,
        crate::api::routes::ChannelMediaItem,
        crate::api::routes::ChannelMediaResponse,
        crate::api::routes::DateRange,
        crate::api::routes::ForwardRequest,
        crate::api::routes::ForwardResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "download", description = "Download lifecycle - Submit media, poll task progress, fetch finished artifacts"),
        (name = "channel", description = "Channel operations - Scan history for media and forward messages"),
        (name = "system", description = "System endpoints - Health checks and OpenAPI spec"),
    )
)]
pub struct ApiDoc;
