// src/handlers.rs
use crate::{
    AppState, eras,
    errors::TimeMachineError,
    models::{DownloadPayload, EraStyle},
    services::{
        TransformOutcome,
        image_codec::{MAX_IMAGE_BYTES, too_large},
    },
};
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{Error, HttpResponse, web};
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

const LONG_POLL_TIMEOUT: Duration = Duration::from_secs(30);

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/eras", web::get().to(list_eras))
            .route("/session", web::get().to(get_session))
            .route("/session/changes", web::get().to(session_changes))
            .route("/session/file", web::post().to(upload_file))
            .route("/session/era", web::put().to(select_era))
            .route("/session/transform", web::post().to(transform))
            .route("/session/reset", web::post().to(reset))
            .route("/session/download", web::get().to(download_result))
            .route("/history/{entry_id}/download", web::get().to(download_history)),
    )
    .route("/health", web::get().to(health_check));
}

#[derive(Serialize)]
struct EraView {
    #[serde(flatten)]
    style: EraStyle,
    short_label: &'static str,
}

#[derive(Deserialize)]
pub struct SelectEraRequest {
    era: String,
}

#[derive(Deserialize)]
pub struct ChangesQuery {
    since: Option<u64>,
}

pub async fn list_eras() -> HttpResponse {
    let catalog: Vec<EraView> = eras::all()
        .iter()
        .map(|style| EraView {
            style: *style,
            short_label: style.id.short_label(),
        })
        .collect();
    HttpResponse::Ok().json(catalog)
}

pub async fn get_session(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(data.session.snapshot())
}

/// Long-poll: answers once the session moves past `since`, or after the
/// poll timeout with whatever is current.
pub async fn session_changes(
    query: web::Query<ChangesQuery>,
    data: web::Data<AppState>,
) -> HttpResponse {
    let since = query.since.unwrap_or(0);
    let mut updates = data.session.subscribe();
    let _ = tokio::time::timeout(
        LONG_POLL_TIMEOUT,
        updates.wait_for(|snapshot| snapshot.version > since),
    )
    .await;
    HttpResponse::Ok().json(data.session.snapshot())
}

pub async fn upload_file(
    mut payload: Multipart,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let Some(mut field) = payload.try_next().await? else {
        return Err(TimeMachineError::UnreadableFile("no file in upload".to_string()).into());
    };

    let content_type = field.content_type().map(|ct| ct.to_string());

    let mut file_data = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if file_data.len() + chunk.len() > MAX_IMAGE_BYTES {
            return Err(data.session.reject_file(too_large()).into());
        }
        file_data.extend_from_slice(&chunk);
    }

    data.session.select_file(&file_data, content_type.as_deref())?;

    Ok(HttpResponse::Ok().json(data.session.snapshot()))
}

pub async fn select_era(
    body: web::Json<SelectEraRequest>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let style = eras::find_era(&body.era)
        .ok_or_else(|| TimeMachineError::UnknownEra(body.era.clone()))?;
    data.session.select_era(style.id);
    Ok(HttpResponse::Ok().json(data.session.snapshot()))
}

pub async fn transform(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    match data.session.start_transform().await {
        TransformOutcome::AlreadyBusy => Err(TimeMachineError::SessionBusy.into()),
        TransformOutcome::NoSource
        | TransformOutcome::Completed(_)
        | TransformOutcome::Failed(_) => Ok(HttpResponse::Ok().json(data.session.snapshot())),
    }
}

pub async fn reset(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    data.session.reset()?;
    Ok(HttpResponse::Ok().json(data.session.snapshot()))
}

pub async fn download_result(data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(attachment(data.session.download_result()?))
}

pub async fn download_history(
    path: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let entry_id = path.into_inner();
    Ok(attachment(data.session.download_history(&entry_id)?))
}

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "time-machine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn attachment(payload: DownloadPayload) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(payload.media_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(payload.file_name)],
        })
        .body(payload.bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmbeddedImage, EraId};
    use crate::services::Session;
    use crate::test_support::{MockTransformer, png_bytes};
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::sync::Arc;

    const BOUNDARY: &str = "time-machine-boundary";

    fn state(mock: &Arc<MockTransformer>) -> AppState {
        AppState {
            session: Arc::new(Session::new(mock.clone())),
        }
    }

    fn multipart_body(content_type: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"file\"; filename=\"portrait\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(content_type: &str, bytes: &[u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/v1/session/file")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(content_type, bytes))
    }

    #[actix_web::test]
    async fn lists_catalog_in_order() {
        let mock = MockTransformer::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(&mock)))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/eras").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let eras = body.as_array().unwrap();
        assert_eq!(eras.len(), 5);
        assert_eq!(eras[0]["id"], "Modern (2020s)");
        assert_eq!(eras[3]["year"], 1994);
        assert_eq!(eras[3]["short_label"], "Retro");
    }

    #[actix_web::test]
    async fn upload_transform_download_flow() {
        let mock = MockTransformer::new();
        mock.push_ok(EmbeddedImage::new("image/png", "aGVsbG8="));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(&mock)))
                .configure(routes),
        )
        .await;

        let req = upload_request("image/png", &png_bytes()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let snap: Value = test::read_body_json(resp).await;
        assert!(
            snap["source_image"]
                .as_str()
                .unwrap()
                .starts_with("data:image/png;base64,")
        );

        let req = test::TestRequest::put()
            .uri("/api/v1/session/era")
            .set_json(json!({ "era": "Retro Grunge (1990s)" }))
            .to_request();
        let snap: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snap["selected_era"]["year"], 1994);

        let req = test::TestRequest::post()
            .uri("/api/v1/session/transform")
            .to_request();
        let snap: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snap["busy"], false);
        assert_eq!(snap["history"][0]["era"], "Retro Grunge (1990s)");
        assert_eq!(
            snap["transformed_image"]["image"],
            "data:image/png;base64,aGVsbG8="
        );
        assert_eq!(mock.calls(), 1);

        let req = test::TestRequest::get()
            .uri("/api/v1/session/download")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment"));
        assert!(disposition.contains("time-machine-Retro Grunge (1990s).png"));
        let bytes = test::read_body(resp).await;
        assert_eq!(&bytes[..], b"hello");

        let entry_id = snap["history"][0]["id"].as_str().unwrap();
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/history/{entry_id}/download"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn unreadable_upload_sets_error_slot() {
        let mock = MockTransformer::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(&mock)))
                .configure(routes),
        )
        .await;

        let resp = test::call_service(
            &app,
            upload_request("text/plain", b"definitely not a photo").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let err: Value = test::read_body_json(resp).await;
        assert_eq!(err["error"], "Unreadable file");

        let req = test::TestRequest::get().uri("/api/v1/session").to_request();
        let snap: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snap["error"], "Failed to load image. Please try another one.");
        assert!(snap["source_image"].is_null());
    }

    #[actix_web::test]
    async fn oversized_upload_is_rejected() {
        let mock = MockTransformer::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(&mock)))
                .configure(routes),
        )
        .await;

        let mut bytes = png_bytes();
        bytes.resize(MAX_IMAGE_BYTES + 1, 0);
        let resp = test::call_service(&app, upload_request("image/png", &bytes).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/v1/session").to_request();
        let snap: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snap["error"], "Failed to load image. Please try another one.");
        assert!(snap["source_image"].is_null());
    }

    #[actix_web::test]
    async fn unknown_era_is_rejected() {
        let mock = MockTransformer::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(&mock)))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/v1/session/era")
            .set_json(json!({ "era": "Art Deco (1920s)" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn transform_without_source_returns_unchanged_snapshot() {
        let mock = MockTransformer::new();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(&mock)))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/session/transform")
            .to_request();
        let snap: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snap["version"], 0);
        assert!(snap["history"].as_array().unwrap().is_empty());
        assert_eq!(mock.calls(), 0);

        let req = test::TestRequest::get()
            .uri("/api/v1/session/download")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn reset_clears_source_and_keeps_history() {
        let mock = MockTransformer::new();
        mock.push_ok(EmbeddedImage::new("image/png", "aGVsbG8="));
        let app_state = state(&mock);
        let session = app_state.session.clone();
        session.select_file(&png_bytes(), None).unwrap();
        session.start_transform().await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::post().uri("/api/v1/session/reset").to_request();
        let snap: Value = test::call_and_read_body_json(&app, req).await;
        assert!(snap["source_image"].is_null());
        assert!(snap["transformed_image"].is_null());
        assert_eq!(snap["history"].as_array().unwrap().len(), 1);
        assert_eq!(snap["can_reset"], false);
    }

    #[actix_web::test]
    async fn changes_answers_immediately_when_behind() {
        let mock = MockTransformer::new();
        let app_state = state(&mock);
        app_state.session.select_era(EraId::Y2k);
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(app_state))
                .configure(routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/session/changes?since=0")
            .to_request();
        let snap: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snap["version"], 1);
        assert_eq!(snap["selected_era"]["id"], "Y2K Digital (2000s)");
    }

    #[actix_web::test]
    async fn health_reports_service_name() {
        let app = test::init_service(App::new().configure(routes)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["service"], "time-machine");
    }
}
