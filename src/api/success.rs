use actix_web::HttpResponse;
use std::borrow::Cow;

#[derive(serde::Serialize)]
pub struct SuccessData<T: serde::Serialize> {
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Cow<'static, str>>,
}

/// Either the `{data, message}` envelope or the value itself.
#[derive(serde::Serialize)]
#[serde(untagged)]
pub enum SuccessBody<T: serde::Serialize> {
    Envelope(SuccessData<T>),
    Plain(T),
}

pub struct Success<T: serde::Serialize> {
    pub status: actix_web::http::StatusCode,
    pub body: Option<SuccessBody<T>>,
}

impl<T: serde::Serialize> Success<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            status: actix_web::http::StatusCode::OK,
            body: Some(SuccessBody::Envelope(SuccessData { data, message: None })),
        }
    }

    pub fn ok_plain(data: T) -> Self {
        Self { status: actix_web::http::StatusCode::OK, body: Some(SuccessBody::Plain(data)) }
    }

    pub fn created_plain(data: T) -> Self {
        Self { status: actix_web::http::StatusCode::CREATED, body: Some(SuccessBody::Plain(data)) }
    }

    pub fn no_content() -> Self {
        Self { status: actix_web::http::StatusCode::NO_CONTENT, body: None }
    }
}

impl<T: serde::Serialize> actix_web::Responder for Success<T> {
    type Body = actix_web::body::BoxBody;

    fn respond_to(self, _req: &actix_web::HttpRequest) -> HttpResponse<Self::Body> {
        let mut response = HttpResponse::build(self.status);

        match self.body {
            Some(body) => response.json(body),
            None => response.finish(),
        }
    }
}
