use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Response},
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use gallery_shared::api::{PageQuery, UploadImageRequest};
use uuid::Uuid;

use super::{parse_id, redirect, FormData};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::flash::{self, Level};
use crate::pages::{
    render, CategoryOption, Chrome, ConfirmDeletePage, ImageDetailPage, ImageListPage, UploadPage,
};
use crate::routes::AppState;
use crate::services::{categories, gallery, gallery::Deletion};

const DELETE_REFUSED: &str = "You are not allowed to delete this image.";

async fn render_list(
    state: &AppState,
    user: &AuthUser,
    jar: CookieJar,
    heading: String,
    category_id: Option<Uuid>,
    page: Option<&str>,
) -> Result<Response, AppError> {
    let page = gallery::list(state.store.as_ref(), user, category_id, page).await?;
    let categories = state.store.list_categories().await?;
    let (jar, messages) = flash::take(jar);

    let view = ImageListPage {
        chrome: Chrome::new(Some(&user.username), messages),
        heading,
        page,
        categories,
    };

    Ok((jar, render(&view)?).into_response())
}

/// GET /
pub async fn list_images(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    render_list(
        &state,
        &user,
        jar,
        "My images".to_string(),
        None,
        query.page.as_deref(),
    )
    .await
}

/// GET /category/:id/
pub async fn category_images(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Path(category_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response, AppError> {
    let category = categories::find(state.store.as_ref(), parse_id(&category_id)?).await?;

    render_list(
        &state,
        &user,
        jar,
        category.name,
        Some(category.id),
        query.page.as_deref(),
    )
    .await
}

/// GET /image/:id/
pub async fn image_detail(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Path(image_id): Path<String>,
) -> Result<Response, AppError> {
    let image = gallery::detail(state.store.as_ref(), &user, parse_id(&image_id)?).await?;

    let category = match image.category_id {
        Some(id) => state.store.find_category(id).await?,
        None => None,
    };
    let dimensions = image
        .dimensions()
        .map(|(width, height)| format!("{} × {}", width, height));

    let (jar, messages) = flash::take(jar);

    let page = ImageDetailPage {
        chrome: Chrome::new(Some(&user.username), messages),
        image,
        category,
        dimensions,
    };

    Ok((jar, render(&page)?).into_response())
}

/// GET /upload/
pub async fn upload_form(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let categories = state.store.list_categories().await?;
    let (jar, messages) = flash::take(jar);

    let page = UploadPage {
        chrome: Chrome::new(Some(&user.username), messages),
        errors: Vec::new(),
        title: String::new(),
        description: String::new(),
        categories: CategoryOption::list(categories, None),
    };

    Ok((jar, render(&page)?).into_response())
}

/// POST /upload/
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FormData::read(multipart).await?;
    let image = form.take_file("image");

    let category = form.optional_text("category");
    let category_id = match category.as_deref().map(Uuid::parse_str) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => {
            return rerender_upload(&state, &user, &form, None, "Select a valid category.").await;
        }
        None => None,
    };

    let req = UploadImageRequest {
        title: form.text("title"),
        description: form.optional_text("description"),
        category_id,
    };

    match gallery::upload(state.store.as_ref(), &state.media, &user, &req, image).await {
        Ok(_) => {
            let jar = flash::push(jar, Level::Success, "Your image has been uploaded!");
            Ok((jar, redirect("/")).into_response())
        }
        Err(AppError::Validation(msg)) => {
            rerender_upload(&state, &user, &form, req.category_id, &msg).await
        }
        Err(e) => Err(e),
    }
}

async fn rerender_upload(
    state: &AppState,
    user: &AuthUser,
    form: &FormData,
    selected: Option<Uuid>,
    error: &str,
) -> Result<Response, AppError> {
    let categories = state.store.list_categories().await?;

    let page = UploadPage {
        chrome: Chrome::new(Some(&user.username), Vec::new()),
        errors: vec![error.to_string()],
        title: form.text("title"),
        description: form.text("description"),
        categories: CategoryOption::list(categories, selected),
    };

    Ok(render(&page)?.into_response())
}

/// GET /image/:id/delete/
pub async fn confirm_delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Path(image_id): Path<String>,
) -> Result<Response, AppError> {
    match gallery::authorize_delete(state.store.as_ref(), &user, parse_id(&image_id)?).await? {
        Deletion::Allowed(image) => {
            let (jar, messages) = flash::take(jar);
            let page = ConfirmDeletePage {
                chrome: Chrome::new(Some(&user.username), messages),
                image,
            };
            Ok((jar, render(&page)?).into_response())
        }
        Deletion::Refused => {
            let jar = flash::push(jar, Level::Error, DELETE_REFUSED);
            Ok((jar, redirect("/")).into_response())
        }
    }
}

/// POST /image/:id/delete/
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Path(image_id): Path<String>,
) -> Result<Response, AppError> {
    let deletion = gallery::delete(
        state.store.as_ref(),
        &state.media,
        &user,
        parse_id(&image_id)?,
    )
    .await?;

    let jar = match deletion {
        Deletion::Allowed(_) => flash::push(jar, Level::Success, "Image deleted."),
        Deletion::Refused => flash::push(jar, Level::Error, DELETE_REFUSED),
    };

    Ok((jar, redirect("/")).into_response())
}
