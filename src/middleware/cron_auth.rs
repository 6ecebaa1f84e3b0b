//! 定时任务认证中间件
//!
//! 通过 Header 中的 Authorization: Bearer <CRON_SECRET> 进行认证：
//! - 生产环境：未配置密钥返回 500，Token 不匹配返回 401
//! - 其他环境：校验失败只记录警告，请求继续执行

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpResponse,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use std::rc::Rc;

use crate::models::ApiResponse;

/// 认证结果
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Allow,
    Unauthorized,
    NotConfigured,
}

struct CronSecret {
    secret: Option<String>,
    enforce: bool,
}

/// 常量时间比较，避免通过响应耗时推测密钥
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

impl CronSecret {
    fn check(&self, authorization: Option<&str>) -> Verdict {
        let provided = authorization.and_then(|v| v.strip_prefix("Bearer "));

        let verdict = match (&self.secret, provided) {
            (None, _) => Verdict::NotConfigured,
            (Some(secret), Some(token)) if constant_time_eq(token.as_bytes(), secret.as_bytes()) => {
                Verdict::Allow
            }
            _ => Verdict::Unauthorized,
        };

        if self.enforce || verdict == Verdict::Allow {
            return verdict;
        }
        match verdict {
            Verdict::NotConfigured => log::warn!("[Cron] 未设置 CRON_SECRET，非生产环境放行"),
            _ => log::warn!("[Cron] Token 校验失败，非生产环境放行"),
        }
        Verdict::Allow
    }
}

/// 定时任务认证中间件
pub struct CronAuth {
    inner: Rc<CronSecret>,
}

impl CronAuth {
    /// enforce 为 true 时严格校验（生产环境）
    pub fn new(secret: Option<String>, enforce: bool) -> Self {
        Self {
            inner: Rc::new(CronSecret { secret, enforce }),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for CronAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CronAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(CronAuthService {
            service: Rc::new(service),
            inner: self.inner.clone(),
        })
    }
}

pub struct CronAuthService<S> {
    service: Rc<S>,
    inner: Rc<CronSecret>,
}

impl<S, B> Service<ServiceRequest> for CronAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let verdict = self.inner.check(
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok()),
        );

        Box::pin(async move {
            let response = match verdict {
                Verdict::Allow => {
                    let res = service.call(req).await?;
                    return Ok(res.map_into_left_body());
                }
                Verdict::Unauthorized => {
                    log::warn!("[Cron] 拒绝未授权请求: {}", req.path());
                    HttpResponse::Unauthorized().json(ApiResponse::<()>::error("Unauthorized".to_string()))
                }
                Verdict::NotConfigured => {
                    log::error!("[Cron] 生产环境未设置 CRON_SECRET");
                    HttpResponse::InternalServerError()
                        .json(ApiResponse::<()>::error("CRON_SECRET not configured".to_string()))
                }
            };
            Ok(req.into_response(response).map_into_right_body())
        })
    }
}
