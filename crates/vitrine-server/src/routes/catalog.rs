//! Catalog pages and form submissions.

use axum::extract::{Multipart, Path, Query, State};
use axum::response::{Html, Redirect};
use serde::Deserialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::form::read_image_form;
use crate::views::{render, AddTemplate, EditTemplate, IndexTemplate};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub brand: Option<String>,
}

/// GET /
pub async fn index(
    State(ctx): State<AppContext>,
    Query(params): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let filter = params.brand.as_deref();
    let images = ctx.catalog.list(filter).await?;
    let brands = ctx.catalog.brands().await?;
    Ok(render(&IndexTemplate::new(images, brands, filter))?)
}

/// GET /add
pub async fn add_form() -> Result<Html<String>, AppError> {
    Ok(render(&AddTemplate)?)
}

/// POST /add
pub async fn create(
    State(ctx): State<AppContext>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let input = read_image_form(
        multipart,
        ctx.config.uploads.upload_mode,
        ctx.catalog.processor(),
    )
    .await?;
    ctx.catalog.create(input).await?;
    Ok(Redirect::to("/"))
}

/// GET /edit/{id}
pub async fn edit_form(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Html<String>, AppError> {
    let image = ctx.catalog.get(id).await?;
    Ok(render(&EditTemplate { image })?)
}

/// POST /edit/{id}
pub async fn update(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Redirect, AppError> {
    let input = read_image_form(
        multipart,
        ctx.config.uploads.upload_mode,
        ctx.catalog.processor(),
    )
    .await?;
    ctx.catalog.update(id, input).await?;
    Ok(Redirect::to("/"))
}

/// POST /delete/{id}
pub async fn delete(
    State(ctx): State<AppContext>,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    ctx.catalog.delete(id).await?;
    Ok(Redirect::to("/"))
}
