/*!
 * 请求身份中间件
 *
 * 认证由上游可信反向代理完成，代理把调用者身份写入请求头
 * （默认 `x-amzn-oidc-identity`）。此中间件读取该请求头，构造 `RequestContext`
 * 放入请求扩展，处理程序再显式取出传给服务层。
 *
 * 开发环境下缺少身份头时使用配置中的本地用户；其他环境返回 401。
 *
 * ```rust,ignore
 * web::scope("/api/v1/uploads")
 *     .wrap(RequireIdentity)
 *     .route("", web::post().to(create_upload))
 * ```
 */

use crate::config::{AppConfig, AuthConfig};
use crate::models::{ApiResponse, ErrorCode, RequestContext};
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    http::header::{CONTENT_TYPE, HeaderMap},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct RequireIdentity;

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 从请求头解析调用者身份
pub fn resolve_context(
    headers: &HeaderMap,
    auth: &AuthConfig,
    is_development: bool,
) -> Option<RequestContext> {
    match header_value(headers, &auth.identity_header) {
        Some(user_id) => Some(RequestContext::new(
            user_id,
            header_value(headers, &auth.email_header),
        )),
        None if is_development && !auth.development_user.is_empty() => {
            Some(RequestContext::development(auth.development_user.clone()))
        }
        None => None,
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireIdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireIdentityMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireIdentityMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireIdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            // 预检请求直接放行给 CORS 处理
            if req.method() == actix_web::http::Method::OPTIONS {
                let res = srv.call(req).await?.map_into_left_body();
                return Ok(res);
            }

            let config = AppConfig::get();
            match resolve_context(req.headers(), &config.auth, config.is_development()) {
                Some(context) => {
                    debug!(
                        "Request identity resolved: {} (development: {})",
                        context.user_id, context.is_development_user
                    );
                    req.extensions_mut().insert(context);
                    let res = srv.call(req).await?.map_into_left_body();
                    Ok(res)
                }
                None => {
                    info!("Missing identity header for request to {}", req.path());
                    let response = HttpResponse::build(StatusCode::UNAUTHORIZED)
                        .insert_header((CONTENT_TYPE, "application/json; charset=utf-8"))
                        .json(ApiResponse::<()>::error_empty(
                            ErrorCode::Unauthorized,
                            "Unauthorized: missing identity header",
                        ));
                    Ok(req.into_response(response.map_into_right_body()))
                }
            }
        })
    }
}

impl RequireIdentity {
    /// 从请求扩展中取出调用者身份
    /// 只能在应用了 RequireIdentity 的路由中使用
    pub fn extract_context(req: &actix_web::HttpRequest) -> Option<RequestContext> {
        req.extensions().get::<RequestContext>().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn auth() -> AuthConfig {
        AuthConfig {
            identity_header: "x-amzn-oidc-identity".to_string(),
            email_header: "x-amzn-oidc-email".to_string(),
            development_user: "local-dev-user".to_string(),
        }
    }

    #[test]
    fn test_identity_header_wins() {
        let req = TestRequest::default()
            .insert_header(("x-amzn-oidc-identity", "user-42"))
            .insert_header(("x-amzn-oidc-email", "user42@example.ac.jp"))
            .to_http_request();
        let context = resolve_context(req.headers(), &auth(), true).unwrap();
        assert_eq!(context.user_id, "user-42");
        assert_eq!(context.email.as_deref(), Some("user42@example.ac.jp"));
        assert!(!context.is_development_user);
    }

    #[test]
    fn test_development_fallback() {
        let req = TestRequest::default().to_http_request();
        let context = resolve_context(req.headers(), &auth(), true).unwrap();
        assert_eq!(context.user_id, "local-dev-user");
        assert!(context.is_development_user);

        assert!(resolve_context(req.headers(), &auth(), false).is_none());
    }
}
