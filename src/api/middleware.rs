//! HTTP middleware that logs each outgoing request with its outcome and
//! elapsed time.

use async_trait::async_trait;
use http::Extensions;
use reqwest::{Request, Response};
use reqwest_middleware::{Middleware, Next};
use std::time::Instant;
use tracing::debug;

use crate::utils::fmt_duration;

pub struct RequestLogger;

#[async_trait]
impl Middleware for RequestLogger {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        let method = req.method().clone();
        let url = req.url().clone();
        let started = Instant::now();

        let result = next.run(req, extensions).await;

        match &result {
            Ok(response) => debug!(
                %method,
                %url,
                status = response.status().as_u16(),
                elapsed = fmt_duration(started.elapsed()),
                "request completed"
            ),
            Err(error) => debug!(
                %method,
                %url,
                error = %error,
                elapsed = fmt_duration(started.elapsed()),
                "request failed"
            ),
        }

        result
    }
}
