use crate::modules::video::dto::{
    ConversionStatusResponse, RenditionResponse, ReserveLocationRequest, StorageLocationResponse,
};
use crate::modules::video::model::{VideoFile, VideoStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::video::handler::conversion_status,
        crate::modules::video::handler::convert_quality,
        crate::modules::video::handler::list_files,
        crate::modules::video::handler::reserve_location,
    ),
    components(
        schemas(
            ConversionStatusResponse,
            RenditionResponse,
            ReserveLocationRequest,
            StorageLocationResponse,
            VideoFile,
            VideoStatus
        )
    ),
    tags(
        (name = "Conversion", description = "Video conversion pipeline"),
        (name = "Storage", description = "Storage placement of uploads")
    )
)]
pub struct ApiDoc;
