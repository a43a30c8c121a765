use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    auth::session::Session,
    backend::HrApi,
    error::{PortalError, PortalResult},
    model::todo::{NewTodo, Todo, TodoChanges, TodoPriority, TodoStatus},
    models::{Screen, Toast},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTodo {
    #[schema(example = "Submit expense report")]
    pub title: String,
    #[schema(example = "2024-03-01")]
    pub due_date: Option<NaiveDate>,
    #[serde(default = "default_priority")]
    pub priority: TodoPriority,
}

fn default_priority() -> TodoPriority {
    TodoPriority::Medium
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<TodoPriority>,
    pub status: Option<TodoStatus>,
}

fn clean_title(title: &str) -> PortalResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PortalError::validation("Title is required"));
    }
    Ok(title.to_string())
}

impl UpdateTodo {
    fn into_changes(self) -> PortalResult<TodoChanges> {
        Ok(TodoChanges {
            title: self.title.as_deref().map(clean_title).transpose()?,
            due_date: self.due_date,
            priority: self.priority,
            status: self.status,
        })
    }
}

/// Open items first, then by due date; items without one go last.
async fn load(api: &dyn HrApi, session: &Session) -> PortalResult<Vec<Todo>> {
    let mut rows = api.todos(session, session.employee_id()?).await?;
    rows.sort_by_key(|t| (t.status == TodoStatus::Done, t.due_date.is_none(), t.due_date));
    Ok(rows)
}

async fn find_own(api: &dyn HrApi, session: &Session, todo_id: u64) -> PortalResult<Todo> {
    api.todos(session, session.employee_id()?)
        .await?
        .into_iter()
        .find(|t| t.id == todo_id)
        .ok_or_else(|| PortalError::not_found("To-do item not found"))
}

#[utoipa::path(
    get,
    path = "/portal/todos",
    responses((status = 200, description = "Own to-do list", body = Object)),
    tag = "ToDo"
)]
pub async fn list_todos(session: Session, api: web::Data<dyn HrApi>) -> PortalResult<HttpResponse> {
    let rows = load(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::show(rows)))
}

#[utoipa::path(
    post,
    path = "/portal/todos",
    request_body = CreateTodo,
    responses(
        (status = 200, description = "Added; refreshed list", body = Object),
        (status = 400, description = "Title missing")
    ),
    tag = "ToDo"
)]
pub async fn create_todo(
    session: Session,
    api: web::Data<dyn HrApi>,
    payload: web::Json<CreateTodo>,
) -> PortalResult<HttpResponse> {
    let form = payload.into_inner();
    let todo = NewTodo {
        employee_id: session.employee_id()?,
        title: clean_title(&form.title)?,
        due_date: form.due_date,
        priority: form.priority,
    };
    api.create_todo(&session, &todo).await?;

    let rows = load(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(rows, Toast::success("To-do added"))))
}

#[utoipa::path(
    put,
    path = "/portal/todos/{todo_id}",
    params(("todo_id" = u64, Path, description = "To-do item to change")),
    request_body = UpdateTodo,
    responses(
        (status = 200, description = "Updated; refreshed list", body = Object),
        (status = 404, description = "Not found")
    ),
    tag = "ToDo"
)]
pub async fn update_todo(
    session: Session,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
    payload: web::Json<UpdateTodo>,
) -> PortalResult<HttpResponse> {
    let changes = payload.into_inner().into_changes()?;
    let current = find_own(api.get_ref(), &session, path.into_inner()).await?;

    api.update_todo(&session, &current.merged(&changes)).await?;

    let rows = load(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(rows, Toast::success("To-do updated"))))
}

#[utoipa::path(
    delete,
    path = "/portal/todos/{todo_id}",
    params(("todo_id" = u64, Path, description = "To-do item to delete")),
    responses(
        (status = 200, description = "Deleted; refreshed list", body = Object),
        (status = 404, description = "Not found")
    ),
    tag = "ToDo"
)]
pub async fn delete_todo(
    session: Session,
    api: web::Data<dyn HrApi>,
    path: web::Path<u64>,
) -> PortalResult<HttpResponse> {
    let current = find_own(api.get_ref(), &session, path.into_inner()).await?;
    api.delete_todo(&session, current.id).await?;

    let rows = load(api.get_ref(), &session).await?;
    Ok(HttpResponse::Ok().json(Screen::with_toast(rows, Toast::info("To-do deleted"))))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/todos")
            .route(web::get().to(list_todos))
            .route(web::post().to(create_todo)),
    )
    .service(
        web::resource("/todos/{todo_id}")
            .route(web::put().to(update_todo))
            .route(web::delete().to(delete_todo)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::session::SessionStore,
        backend::api::MockHrApi,
        config::Config,
        test_support::{employee_user, signed_in},
    };
    use actix_web::{http::StatusCode, test as actix_test};
    use serde_json::{Value, json};

    fn item(id: u64, status: TodoStatus, due: Option<NaiveDate>) -> Todo {
        Todo {
            id,
            employee_id: 1000,
            title: format!("item {id}"),
            due_date: due,
            priority: TodoPriority::Medium,
            status,
        }
    }

    #[actix_web::test]
    async fn list_puts_open_items_with_dates_first() {
        let mut api = MockHrApi::new();
        api.expect_todos().times(1).returning(|_, _| {
            Ok(vec![
                item(1, TodoStatus::Done, NaiveDate::from_ymd_opt(2024, 1, 1)),
                item(2, TodoStatus::Pending, None),
                item(3, TodoStatus::Pending, NaiveDate::from_ymd_opt(2024, 2, 1)),
            ])
        });
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::get()
            .uri("/portal/todos")
            .cookie(cookie)
            .to_request();
        let body: Value = actix_test::call_and_read_body_json(&app, req).await;
        let ids: Vec<u64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[actix_web::test]
    async fn blank_title_is_rejected() {
        let api = MockHrApi::new();
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::post()
            .uri("/portal/todos")
            .cookie(cookie)
            .set_json(json!({ "title": "   " }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn marking_done_sends_the_full_row() {
        let mut api = MockHrApi::new();
        api.expect_todos()
            .times(2)
            .returning(|_, _| Ok(vec![item(5, TodoStatus::Pending, None)]));
        api.expect_update_todo()
            .withf(|_, t| t.id == 5 && t.status == TodoStatus::Done && t.title == "item 5")
            .times(1)
            .returning(|_, _| Ok(()));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::put()
            .uri("/portal/todos/5")
            .cookie(cookie)
            .set_json(json!({ "status": "done" }))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn unknown_item_is_not_found() {
        let mut api = MockHrApi::new();
        api.expect_todos().times(1).returning(|_, _| Ok(vec![]));
        let store = SessionStore::new(&Config::default());
        let (_, cookie) = signed_in(&store, employee_user()).await;
        let app = portal_service!(api, store, configure);

        let req = actix_test::TestRequest::delete()
            .uri("/portal/todos/42")
            .cookie(cookie)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
