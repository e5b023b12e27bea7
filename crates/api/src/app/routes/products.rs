use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use catalog_core::ProductId;
use catalog_products::{Page, Slice, Sort};

use crate::app::dto::{ListParams, ProductRequest, ProductResponse, ScrollParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

type ApiResult<T> = Result<T, ApiError>;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/scroll", get(scroll_products))
        .route("/categories", get(list_categories))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

fn parse_id(path: Result<Path<String>, PathRejection>) -> ApiResult<ProductId> {
    let Path(raw) = path?;
    Ok(raw.parse::<ProductId>()?)
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body?;
    let product = services.products.create(&body.category, &body.name).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ProductResponse>> {
    let id = parse_id(path)?;
    let product = services.products.get_by_id(id).await?;
    Ok(Json(product.into()))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<Json<ProductResponse>> {
    let id = parse_id(path)?;
    let Json(body) = body?;
    let product = services
        .products
        .update(id, &body.category, &body.name)
        .await?;
    Ok(Json(product.into()))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = parse_id(path)?;
    services.products.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Page<ProductResponse>>> {
    let Query(params) = params?;

    let page = match params.sort.as_deref() {
        Some(raw) => {
            let sort: Sort = raw.parse()?;
            services
                .products
                .list_by_category_sorted(&params.category, params.page, params.size, sort)
                .await?
        }
        None => {
            services
                .products
                .list_by_category(&params.category, params.page, params.size)
                .await?
        }
    };

    Ok(Json(page.map(ProductResponse::from)))
}

pub async fn scroll_products(
    Extension(services): Extension<Arc<AppServices>>,
    params: Result<Query<ScrollParams>, QueryRejection>,
) -> ApiResult<Json<Slice<ProductResponse>>> {
    let Query(params) = params?;
    let slice = services
        .products
        .scroll_by_category(
            &params.category,
            params.after.map(ProductId::new),
            params.limit,
        )
        .await?;
    Ok(Json(slice.map(ProductResponse::from)))
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(services.products.list_categories().await?))
}
