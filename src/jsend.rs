//! JSend response envelope: `success` and `fail` carry `data`, `error` carries `message`.

use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JSend<T> {
    Success { data: T },
    Fail { data: T },
    Error { message: String },
}

impl<T: Serialize> JSend<T> {
    pub fn success(data: T) -> Self {
        JSend::Success { data }
    }

    pub fn fail(data: T) -> Self {
        JSend::Fail { data }
    }
}

impl JSend<()> {
    pub fn error(message: impl Into<String>) -> Self {
        JSend::Error {
            message: message.into(),
        }
    }
}
