use actix_web::{HttpResponse, Result as ActixResult};

use crate::models::ApiResponse;
use crate::models::lectures::responses::{AttributeListResponse, AttributeOption};
use crate::models::summaries::ALL_GROUP;
use crate::models::surveys::RespondentAttribute;

pub(crate) fn attribute_options() -> Vec<AttributeOption> {
    std::iter::once(AttributeOption {
        key: ALL_GROUP.to_string(),
        label: "全体".to_string(),
    })
    .chain(RespondentAttribute::ALL.iter().map(|attr| AttributeOption {
        key: attr.as_str().to_string(),
        label: attr.label().to_string(),
    }))
    .collect()
}

pub async fn list_attributes() -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AttributeListResponse {
            attributes: attribute_options(),
        },
        "获取成功",
    )))
}
