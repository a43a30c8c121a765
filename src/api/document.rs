use actix_web::{
    HttpRequest, HttpResponse,
    http::header::{self, ContentDisposition, DispositionParam, DispositionType},
    web,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::{
    auth::{auth::AdminSession, session::Session},
    backend::HrApi,
    error::{PortalError, PortalResult},
    model::document::{Document, NewDocument},
    models::{Screen, Toast},
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct UploadParams {
    /// Name the file is stored under
    pub file_name: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DeleteParams {
    /// Employee whose list to refresh; admins only, defaults to their own
    pub employee_id: Option<u64>,
}

/// Strips any directory part a browser may send along with the name.
fn clean_file_name(raw: &str) -> PortalResult<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(PortalError::validation("A file name is required"));
    }
    Ok(name.to_string())
}

fn new_document(
    employee_id: u64,
    req: &HttpRequest,
    params: &UploadParams,
    body: web::Bytes,
) -> PortalResult<NewDocument> {
    if body.is_empty() {
        return Err(PortalError::validation("The selected file is empty"));
    }
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();

    Ok(NewDocument {
        employee_id,
        file_name: clean_file_name(&params.file_name)?,
        content_type,
        bytes: body.to_vec(),
    })
}

async fn list_for(
    api: &dyn HrApi,
    session: &Session,
    employee_id: u64,
) -> PortalResult<Vec<Document>> {
    let mut rows = api.documents(session, employee_id).await?;
    rows.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
    Ok(rows)
}

/// Employees only reach documents in their own list; admins reach any.
async fn ensure_visible(api: &dyn HrApi, session: &Session, document_id: u64) -> PortalResult<()> {
    if session.user.role.is_admin() {
        return Ok(());
    }
    let own = api.documents(session, session.employee_id()?).await?;
    if own.iter().any(|d| d.id == document_id) {
        Ok(())
    } else {
        Err(PortalError::not_found("Document not found"))
    }
}

#[utoipa::path(
    get,
    path = "/portal/documents",
    responses(
        (status = 200, description = "Own documents", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Documents"
)]
pub async fn my_documents(
    session: Session,
    api: web::Data<dyn HrApi>,
) -> PortalResult<HttpResponse> {
    let rows = list_for(api.get_ref(), &session, session.employee_id()?).await?;
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

#[utoipa::path(
    post,
    path = "/portal/documents",
    params(UploadParams),
    request_body(content = Vec<u8>, description = "Raw file body", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Uploaded; refreshed list", body = Object),
        (status = 400, description = "Empty file or missing name"),
        (status = 413, description = "File too large")
    ),
    tag = "Documents"
)]
pub async fn upload_document(
    req: HttpRequest,
    session: Session,
    api: web::Data<dyn HrApi>,
    params: web::Query<UploadParams>,
    body: web::Bytes,
) -> PortalResult<HttpResponse> {
    let employee_id = session.employee_id()?;
    let document = new_document(employee_id, &req, &params, body)?;
    let file_name = document.file_name.clone();

    info!(employee_id, %file_name, size = document.bytes.len(), "uploading document");
    api.upload_document(&session, document).await?;

    let rows = list_for(api.get_ref(), &session, employee_id).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        rows,
        Toast::success(format!("{file_name} uploaded")),
    )))
}

#[utoipa::path(
    get,
    path = "/portal/documents/{document_id}/download",
    params(("document_id" = u64, Path, description = "Document to download")),
    responses(
        (status = 200, description = "File body", content_type = "application/octet-stream"),
        (status = 404, description = "Not found")
    ),
    tag = "Documents"
)]
pub async fn download_document(
    session: Session,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    let document_id = path.into_inner();
    ensure_visible(api.get_ref(), &session, document_id).await?;

    let content = api.download_document(&session, document_id).await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, content.content_type))
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(content.file_name)],
        })
        .body(content.bytes))
}

#[utoipa::path(
    delete,
    path = "/portal/documents/{document_id}",
    params(
        ("document_id" = u64, Path, description = "Document to delete"),
        DeleteParams
    ),
    responses(
        (status = 200, description = "Deleted; refreshed list", body = Object),
        (status = 404, description = "Not found")
    ),
    tag = "Documents"
)]
pub async fn delete_document(
    session: Session,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
    params: web::Query<DeleteParams>,
) -> PortalResult<HttpResponse> {
    let document_id = path.into_inner();
    ensure_visible(api.get_ref(), &session, document_id).await?;
    let owner_id = match params.employee_id {
        Some(employee_id) if session.user.role.is_admin() => employee_id,
        _ => session.employee_id()?,
    };

    api.delete_document(&session, document_id).await?;
    info!(document_id, user_id = session.user.id, "document deleted");

    let rows = list_for(api.get_ref(), &session, owner_id).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(rows, Toast::info("Document deleted"))))
}

/* =========================
Employee files (HR/Admin)
========================= */

#[utoipa::path(
    get,
    path = "/portal/admin/employees/{employee_id}/documents",
    params(("employee_id" = u64, Path, description = "Employee whose files to list")),
    responses(
        (status = 200, description = "Employee documents", body = Object),
        (status = 403, description = "Forbidden")
    ),
    tag = "Documents"
)]
pub async fn employee_documents(
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    let rows = list_for(api.get_ref(), &admin, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

#[utoipa::path(
    post,
    path = "/portal/admin/employees/{employee_id}/documents",
    params(
        ("employee_id" = u64, Path, description = "Employee the file belongs to"),
        UploadParams
    ),
    request_body(content = Vec<u8>, description = "Raw file body", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Uploaded; refreshed list", body = Object),
        (status = 403, description = "Forbidden")
    ),
    tag = "Documents"
)]
pub async fn upload_employee_document(
    req: HttpRequest,
    admin: AdminSession,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
    params: web::Query<UploadParams>,
    body: web::Bytes,
) -> PortalResult<HttpResponse> {
    let employee_id = path.into_inner();
    let document = new_document(employee_id, &req, &params, body)?;
    let file_name = document.file_name.clone();

    api.upload_document(&admin, document).await?;
    info!(employee_id, %file_name, uploaded_by = admin.user.id, "document uploaded for employee");

    let rows = list_for(api.get_ref(), &admin, employee_id).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(
        rows,
        Toast::success(format!("{file_name} uploaded")),
    )))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/documents")
            .route(web::get().to(my_documents))
            .route(web::post().to(upload_document)),
    )
    .service(
        web::resource("/documents/{document_id}/download").route(web::get().to(download_document)),
    )
    .service(web::resource("/documents/{document_id}").route(web::delete().to(delete_document)));
}

pub fn configure_admin(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/employees/{employee_id}/documents")
            .route(web::get().to(employee_documents))
            .route(web::post().to(upload_employee_document)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::session::SessionStore,
        backend::api::MockHrApi,
        config::Config,
        model::document::DocumentContent,
        test_support::{admin_user, employee_user, signed_in},
    };
    use actix_web::{http::StatusCode, test as actix_test};

    fn document(id: u64) -> Document {
        Document {
            id,
            employee_id: 1000,
            file_name: "contract.pdf".into(),
            content_type: Some("application/pdf".into()),
            size_bytes: Some(4),
            uploaded_at: None,
        }
    }

    #[test]
    fn directory_parts_are_dropped() {
        assert_eq!(clean_file_name("C:\\Users\\ana\\cv.pdf").unwrap(), "cv.pdf");
        assert_eq!(clean_file_name("../../etc/passwd").unwrap(), "passwd");
        assert!(clean_file_name("uploads/").is_err());
    }

    #[actix_web::test]
    async fn upload_forwards_name_type_and_bytes() {
        let mut api = MockHrApi::new();
        api.expect_upload_document()
            .withf(|_, d| {
                d.employee_id == 1000
                    && d.file_name == "contract.pdf"
                    && d.content_type == "application/pdf"
                    && d.bytes == b"%PDF"
            })
            .times(1)
            .returning(|_, _| Ok(()));
        api.expect_documents()
            .times(1)
            .returning(|_, _| Ok(vec![document(9)]));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::post()
            .uri("/portal/documents?file_name=contract.pdf")
            .cookie(cookie)
            .insert_header((header::CONTENT_TYPE, "application/pdf"))
            .set_payload("%PDF")
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["toast"]["message"], "contract.pdf uploaded");
    }

    #[actix_web::test]
    async fn empty_upload_is_rejected() {
        let api = MockHrApi::new();
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::post()
            .uri("/portal/documents?file_name=empty.txt")
            .cookie(cookie)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn download_sets_attachment_headers() {
        let mut api = MockHrApi::new();
        api.expect_documents()
            .times(1)
            .returning(|_, _| Ok(vec![document(9)]));
        api.expect_download_document().times(1).returning(|_, _| {
            Ok(DocumentContent {
                file_name: "contract.pdf".into(),
                content_type: "application/pdf".into(),
                bytes: b"%PDF".to_vec(),
            })
        });
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::get()
            .uri("/portal/documents/9/download")
            .cookie(cookie)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.contains("attachment"));
        assert!(disposition.contains("contract.pdf"));
        assert_eq!(actix_test::read_body(resp).await.as_ref(), b"%PDF");
    }

    #[actix_web::test]
    async fn foreign_document_is_not_deleted() {
        let mut api = MockHrApi::new();
        api.expect_documents()
            .times(1)
            .returning(|_, _| Ok(vec![document(9)]));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::delete()
            .uri("/portal/documents/10")
            .cookie(cookie)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn delete_returns_the_refreshed_list() {
        let mut api = MockHrApi::new();
        let mut listed = 0;
        api.expect_documents()
            .withf(|_, employee_id| *employee_id == 1000)
            .times(2)
            .returning(move |_, _| {
                listed += 1;
                if listed == 1 {
                    Ok(vec![document(9), document(10)])
                } else {
                    Ok(vec![document(10)])
                }
            });
        api.expect_delete_document()
            .withf(|_, document_id| *document_id == 9)
            .times(1)
            .returning(|_, _| Ok(()));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::delete()
            .uri("/portal/documents/9")
            .cookie(cookie)
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["toast"]["message"], "Document deleted");
        let ids: Vec<u64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![10]);
    }

    #[actix_web::test]
    async fn admin_delete_refreshes_the_named_employee() {
        let mut api = MockHrApi::new();
        api.expect_delete_document().times(1).returning(|_, _| Ok(()));
        api.expect_documents()
            .withf(|_, employee_id| *employee_id == 1000)
            .times(1)
            .returning(|_, _| Ok(vec![document(10)]));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, admin_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::delete()
            .uri("/portal/documents/9?employee_id=1000")
            .cookie(cookie)
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"][0]["id"], 10);
    }
}
