//! Tests for response envelopes and status mapping.

use actix_web::body::to_bytes;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ErrorList;
use crate::test_support::{MutableClock, fixture_timestamp};

#[fixture]
fn mapper() -> ResponseMapper {
    ResponseMapper::new(Arc::new(MutableClock::default()))
}

fn list(errors: Vec<Error>) -> ErrorList {
    ErrorList::from_vec(errors).expect("non-empty error list")
}

async fn body_of(response: HttpResponse) -> Value {
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("JSON body")
}

#[rstest]
#[case(ErrorKind::Conflict, StatusCode::CONFLICT)]
#[case(ErrorKind::Validation, StatusCode::BAD_REQUEST)]
#[case(ErrorKind::NotFound, StatusCode::NOT_FOUND)]
#[case(ErrorKind::Unauthorized, StatusCode::UNAUTHORIZED)]
#[case(ErrorKind::Forbidden, StatusCode::FORBIDDEN)]
#[case(ErrorKind::Failure, StatusCode::UNPROCESSABLE_ENTITY)]
#[case(ErrorKind::Unexpected, StatusCode::INTERNAL_SERVER_ERROR)]
fn kinds_map_to_fixed_statuses(#[case] kind: ErrorKind, #[case] expected: StatusCode) {
    assert_eq!(status_for(kind), expected);
}

#[rstest]
fn all_validation_errors_aggregate() {
    let errors = list(vec![
        Error::validation("User.NameEmpty", "Name must not be empty."),
        Error::validation("User.EmailEmpty", "Email must not be empty."),
    ]);
    let details = ErrorDetails::from_errors(&errors);

    assert_eq!(details.status(), StatusCode::BAD_REQUEST);
    assert_eq!(details.code, "Validation.Failed");
    assert_eq!(details.validation_errors.len(), 2);
    assert_eq!(details.validation_errors[0].property_name, "User.NameEmpty");
    assert!(details.additional_data.is_empty());
}

#[rstest]
fn first_error_decides_a_mixed_list() {
    let errors = list(vec![
        Error::not_found("User.NotFound", "The user was not found."),
        Error::validation("User.NameEmpty", "Name must not be empty."),
        Error::conflict("User.EmailAlreadyExists", "Taken."),
    ]);
    let details = ErrorDetails::from_errors(&errors);

    assert_eq!(details.status(), StatusCode::NOT_FOUND);
    assert_eq!(details.code, "User.NotFound");
    assert!(details.validation_errors.is_empty());
    assert_eq!(
        details.additional_data.get("additionalErrors"),
        Some(&json!([
            {"code": "User.NameEmpty", "description": "Name must not be empty.", "type": "Validation"},
            {"code": "User.EmailAlreadyExists", "description": "Taken.", "type": "Conflict"},
        ]))
    );
}

#[rstest]
fn empty_error_lists_are_unknown() {
    let details = ErrorDetails::from_errors(std::iter::empty());
    assert_eq!(details.code, "Unknown.Error");
    assert_eq!(details.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[rstest]
#[actix_web::test]
async fn success_envelope_carries_data_and_trace(mapper: ResponseMapper) {
    let trace: TraceId = "00000000000000000000000000000001"
        .parse()
        .expect("valid trace id");
    let response = TraceId::scope(trace, async { mapper.respond(Ok(json!({"id": 7}))) }).await;

    assert_eq!(response.status(), StatusCode::OK);
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .expect("trace header")
        .to_str()
        .expect("ascii header")
        .to_owned();
    assert_eq!(header, trace.to_string());

    let body = body_of(response).await;
    assert_eq!(body["isSuccess"], json!(true));
    assert_eq!(body["data"], json!({"id": 7}));
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["traceId"], json!(trace.to_string()));
    assert_eq!(body["timestamp"], json!(fixture_timestamp()));
}

#[rstest]
#[actix_web::test]
async fn conflict_outcome_maps_to_409(mapper: ResponseMapper) {
    let outcome: Outcome<Value> = Err(Error::conflict("User.EmailAlreadyExists", "Taken.").into());
    let response = mapper.respond(outcome);

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_of(response).await;
    assert_eq!(body["isSuccess"], json!(false));
    assert_eq!(body["data"], Value::Null);
    assert_eq!(body["error"]["code"], json!("User.EmailAlreadyExists"));
    assert_eq!(body["error"]["statusCode"], json!(409));
}

#[rstest]
#[actix_web::test]
async fn empty_success_is_204(mapper: ResponseMapper) {
    let response = mapper.respond_empty(Ok(Success));
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
}

#[rstest]
#[actix_web::test]
async fn created_uses_201(mapper: ResponseMapper) {
    let response = mapper.respond_created(Ok(json!({"id": 1})));
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[rstest]
#[actix_web::test]
async fn faults_are_redacted(mapper: ResponseMapper) {
    let fault = Fault::Storage(StorageError::connection("password=hunter2 host unreachable"));
    let response = mapper.respond_fault(&fault);

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_of(response).await;
    assert_eq!(body["error"]["code"], json!("Internal.ServerError"));
    assert!(!body.to_string().contains("hunter2"));
}

#[rstest]
#[actix_web::test]
async fn storage_conflict_faults_report_as_failures(mapper: ResponseMapper) {
    let result: HandlerResult<Value> = Err(StorageError::conflict("unique violation").into());
    let response = mapper.respond_result(result);

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_of(response).await;
    assert_eq!(body["error"]["code"], json!("Storage.WriteRejected"));
}
