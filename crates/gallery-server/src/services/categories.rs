use gallery_shared::{api::CreateCategoryRequest, Category};
use uuid::Uuid;

use crate::db::Store;
use crate::error::AppError;

const MAX_NAME_LEN: usize = 100;

pub async fn create(store: &dyn Store, req: &CreateCategoryRequest) -> Result<Category, AppError> {
    let name = req.name.trim();

    if name.is_empty() {
        return Err(AppError::Validation("Category name is required.".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::Validation(format!(
            "Category name must be at most {} characters.",
            MAX_NAME_LEN
        )));
    }

    let category = store.insert_category(name).await?;
    tracing::info!(category_id = %category.id, name = %category.name, "Category created");

    Ok(category)
}

pub async fn find(store: &dyn Store, id: Uuid) -> Result<Category, AppError> {
    store.find_category(id).await?.ok_or(AppError::NotFound)
}

/// Images in the category are kept and become uncategorised.
pub async fn delete(store: &dyn Store, id: Uuid) -> Result<Category, AppError> {
    let category = find(store, id).await?;

    if !store.delete_category(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(category_id = %id, "Category deleted");
    Ok(category)
}
