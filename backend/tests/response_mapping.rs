//! Dispatcher outcomes rendered as HTTP responses.

mod common;

use actix_web::body::to_bytes;
use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use common::Service;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use user_service::application::users::{CreateUser, DeleteUser, GetUserById};
use user_service::cancellation::CancellationToken;
use user_service::domain::TraceId;
use user_service::inbound::http::{ResponseMapper, TRACE_ID_HEADER};
use user_service::test_support::LogCapture;
use uuid::Uuid;

#[fixture]
fn service() -> Service {
    Service::new()
}

fn mapper(service: &Service) -> ResponseMapper {
    ResponseMapper::new(service.clock.clone())
}

async fn json_body(response: HttpResponse) -> Value {
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    serde_json::from_slice(&bytes).expect("JSON body")
}

#[rstest]
#[actix_web::test]
async fn validation_failures_list_every_rule(service: Service) {
    let result = service
        .dispatcher
        .send(
            CreateUser {
                email: String::new(),
                name: String::new(),
            },
            &CancellationToken::new(),
        )
        .await;
    let response = mapper(&service).respond_result(result);

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["isSuccess"], json!(false));
    assert_eq!(body["error"]["code"], json!("Validation.Failed"));
    assert_eq!(
        body["error"]["validationErrors"],
        json!([
            {"propertyName": "User.NameEmpty", "message": "Name must not be empty."},
            {"propertyName": "User.EmailEmpty", "message": "Email must not be empty."},
        ])
    );
}

#[rstest]
#[actix_web::test]
async fn duplicate_email_is_409(service: Service) {
    let token = CancellationToken::new();
    let request = CreateUser {
        email: "ada@example.com".into(),
        name: "Ada".into(),
    };
    let first = service.dispatcher.send(request.clone(), &token).await;
    assert_eq!(
        mapper(&service).respond_result(first).status(),
        StatusCode::OK
    );

    let second = service.dispatcher.send(request, &token).await;
    let response = mapper(&service).respond_result(second);
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], json!("User.EmailAlreadyExists"));
    assert_eq!(body["error"]["additionalData"], json!({}));
}

#[rstest]
#[actix_web::test]
async fn missing_user_is_404(service: Service) {
    let result = service
        .dispatcher
        .send(GetUserById { id: Uuid::new_v4() }, &CancellationToken::new())
        .await;
    let response = mapper(&service).respond_result(result);

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["statusCode"], json!(404));
}

#[rstest]
#[actix_web::test]
async fn deleting_answers_204(service: Service) {
    let token = CancellationToken::new();
    let created = service
        .dispatcher
        .send(
            CreateUser {
                email: "ada@example.com".into(),
                name: "Ada".into(),
            },
            &token,
        )
        .await
        .expect("no fault")
        .expect("user created");

    let outcome = service
        .dispatcher
        .send(DeleteUser { id: created.id }, &token)
        .await
        .expect("no fault");
    let response = mapper(&service).respond_empty(outcome);
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[rstest]
#[actix_web::test]
async fn faults_become_redacted_500s(service: Service) {
    let token = CancellationToken::new();
    token.cancel();
    let result = service
        .dispatcher
        .send(GetUserById { id: Uuid::new_v4() }, &token)
        .await;
    let response = mapper(&service).respond_result(result);

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], json!("Internal.ServerError"));
    assert_eq!(body["data"], Value::Null);
}


#[rstest]
#[actix_web::test]
async fn envelope_and_logs_share_the_request_trace_id(service: Service) {
    let (logs, _guard) = LogCapture::install();
    let trace_id = TraceId::generate();

    let response = TraceId::scope(trace_id, async {
        let result = service
            .dispatcher
            .send(GetUserById { id: Uuid::new_v4() }, &CancellationToken::new())
            .await;
        mapper(&service).respond_result(result)
    })
    .await;

    let expected = trace_id.to_string();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    assert_eq!(header.as_deref(), Some(expected.as_str()));
    let body = json_body(response).await;
    assert_eq!(body["traceId"], json!(expected));
    assert_eq!(
        logs.single("handling request").field("trace_id"),
        Some(expected.as_str())
    );
}
