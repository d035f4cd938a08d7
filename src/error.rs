use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Failure of a request, answered with `status` and a `{"error": ...}` body.
///
/// Anything convertible into `anyhow::Error` becomes a 500 carrying the error text, so model
/// failures can be returned with `?`. Client errors use `bail_server!` with an explicit status.
#[derive(Debug)]
pub struct ServerError {
    pub status: StatusCode,
    pub message: HttpErrorResponse,
}

/// Body of every failed request: `{"error": "..."}`
#[derive(Debug, Serialize)]
pub struct HttpErrorResponse {
    error: String,
}

impl<S: Into<String>> From<S> for HttpErrorResponse {
    fn from(message: S) -> Self {
        HttpErrorResponse {
            error: message.into(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status, Json(self.message)).into_response()
    }
}

impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        ServerError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: HttpErrorResponse::from(err.into().to_string()),
        }
    }
}

pub type ServerResult<T, E = ServerError> = Result<T, E>;

#[macro_export]
macro_rules! bail_server {
    ($error_message:expr) => {
        return Err($crate::error::ServerError {
            status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            message: $crate::error::HttpErrorResponse::from($error_message),
        })
    };
    ($status_code:expr, $error_message:expr) => {
        return Err($crate::error::ServerError {
            status: $status_code,
            message: $crate::error::HttpErrorResponse::from($error_message),
        })
    };
    ($status:expr, $fmt:expr $(, $arg:expr)*) => {
        return Err($crate::error::ServerError {
            status: $status,
            message: $crate::error::HttpErrorResponse::from(format!($fmt $(, $arg)*)),
        })
    };
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;
    use axum::body::to_bytes;

    use super::*;

    fn fail_with(status: StatusCode) -> ServerResult<()> {
        bail_server!(status, "Input rejected: {}", "bad shape")
    }

    #[tokio::test]
    async fn anyhow_errors_become_internal_server_errors() {
        let err = ServerError::from(anyhow!("model exploded"));
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"model exploded"}"#);
    }

    #[test]
    fn bail_keeps_the_given_status_and_formats_the_message() {
        let err = fail_with(StatusCode::BAD_REQUEST).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message.error, "Input rejected: bad shape");
    }
}
