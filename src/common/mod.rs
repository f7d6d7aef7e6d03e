pub mod response;

pub use response::{IntoJsonResponse, JsonApi, JsonResponse, make_json_response};
