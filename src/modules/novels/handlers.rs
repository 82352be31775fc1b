use axum::{
    extract::{Path, State},
    response::Response,
    Form, Json,
};
use shelf_db::{Novel, NovelId};
use shelf_http::{error::AppError, found, identity::CurrentUser};

use super::models::NovelForm;
use crate::state::AppState;

type HandlerResult<T> = Result<T, AppError>;

pub async fn list(State(state): State<AppState>) -> HandlerResult<Json<Vec<Novel>>> {
    Ok(Json(state.store.list().await?))
}

pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> HandlerResult<Json<Vec<Novel>>> {
    Ok(Json(state.store.list_created_by(&user.id).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Json<Novel>> {
    Ok(Json(state.store.get(&NovelId::from(id)).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Form(form): Form<NovelForm>,
) -> HandlerResult<Response> {
    let mut novel = form.into_novel(user.as_ref());
    let id = state.store.add(&mut novel).await?;

    tracing::info!(%id, title = %novel.title, created_by_id = %novel.created_by_id, "novel added");
    Ok(found(&format!("/novels/{id}")))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: Option<CurrentUser>,
    Form(form): Form<NovelForm>,
) -> HandlerResult<Response> {
    let mut novel = form.into_novel(user.as_ref());
    novel.id = NovelId::from(id);
    state.store.update(&novel).await?;

    tracing::info!(id = %novel.id, "novel updated");
    Ok(found(&format!("/novels/{}", novel.id)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> HandlerResult<Response> {
    let id = NovelId::from(id);
    state.store.delete(&id).await?;

    tracing::info!(%id, "novel deleted");
    Ok(found("/novels"))
}
