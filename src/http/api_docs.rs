use utoipa::OpenApi;
use utoipauto::utoipauto;

#[utoipauto(paths = "./src")]
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BloxChaser API",
        description = "Mining network statistics, aggregated from public sources"
    ),
    tags(),
    components(schemas())
)]
pub(super) struct ApiDoc;
