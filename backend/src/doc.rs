//! OpenAPI documentation of the response contract.
//!
//! Routes are owned by the hosting application, so [`ApiDoc`] registers only
//! the schemas every endpoint shares: the envelope's error section, its
//! validation entries, the error taxonomy, and the user view.

use utoipa::OpenApi;

use crate::application::users::UserView;
use crate::domain::{Error, ErrorKind};
use crate::inbound::http::{ErrorDetails, ValidationErrorEntry};

/// OpenAPI component registry for the user service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User service API",
        description = "Response envelope and payload schemas for the user service."
    ),
    components(schemas(UserView, ErrorDetails, ValidationErrorEntry, Error, ErrorKind)),
    tags((name = "users", description = "Operations related to users"))
)]
pub struct ApiDoc;
