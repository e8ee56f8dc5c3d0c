use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::CookieJar;
use gallery_shared::api::CreateCategoryRequest;

use super::{parse_id, redirect};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::flash::{self, Level};
use crate::pages::{render, CategoriesPage, Chrome};
use crate::routes::AppState;
use crate::services::categories;

/// GET /categories/
pub async fn list_categories(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let categories = state.store.list_categories().await?;
    let (jar, messages) = flash::take(jar);

    let page = CategoriesPage {
        chrome: Chrome::new(Some(&user.username), messages),
        errors: Vec::new(),
        name: String::new(),
        categories,
    };

    Ok((jar, render(&page)?).into_response())
}

/// POST /categories/
pub async fn create_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Form(req): Form<CreateCategoryRequest>,
) -> Result<Response, AppError> {
    match categories::create(state.store.as_ref(), &req).await {
        Ok(category) => {
            let jar = flash::push(
                jar,
                Level::Success,
                format!("Category \"{}\" created.", category.name),
            );
            Ok((jar, redirect("/categories/")).into_response())
        }
        Err(AppError::Validation(msg)) => {
            let page = CategoriesPage {
                chrome: Chrome::new(Some(&user.username), Vec::new()),
                errors: vec![msg],
                name: req.name,
                categories: state.store.list_categories().await?,
            };
            Ok(render(&page)?.into_response())
        }
        Err(e) => Err(e),
    }
}

/// POST /category/:id/delete/
pub async fn delete_category(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Path(category_id): Path<String>,
) -> Result<Response, AppError> {
    let category = categories::delete(state.store.as_ref(), parse_id(&category_id)?).await?;
    tracing::debug!(user_id = %user.id, category_id = %category.id, "Category removed by user");

    let jar = flash::push(
        jar,
        Level::Success,
        format!("Category \"{}\" deleted.", category.name),
    );

    Ok((jar, redirect("/categories/")).into_response())
}
