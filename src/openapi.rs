//! OpenAPI document for the order endpoints.
//!
//! - Swagger UI: `/swagger-ui/`
//! - OpenAPI JSON: `/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::orders::{
    CreateOrderRequest, ListOrdersParams, OrderItemResponse, OrderPageResponse, OrderResponse,
    ProductSummaryResponse,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Checkout Service API",
        version = "0.1.0",
        description = "Order checkout: stock validation, payment and order history. \
                       Responses use the JSend envelope (status + data/message)."
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
    ),
    components(schemas(
        CreateOrderRequest,
        ListOrdersParams,
        OrderResponse,
        OrderItemResponse,
        OrderPageResponse,
        ProductSummaryResponse,
    )),
    modifiers(&SecurityAddon),
    tags((name = "orders", description = "Checkout and order history"))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_order_routes_with_bearer_scheme() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/orders"));
        assert!(doc.paths.paths.contains_key("/orders/{id}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
