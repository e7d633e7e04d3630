//! Request body readers.
//!
//! The body is buffered before the handler chain runs, but every reader
//! consumes it: a second read returns `BodyError::Consumed`. Media-type
//! checks happen before consumption, so a rejected reader leaves the body
//! available.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::BodyError;

pub const APPLICATION_JSON: &str = "application/json";
pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Buffered, single-use request body.
#[derive(Debug, Default)]
pub struct RequestBody {
    content_type: Option<String>,
    data: Option<Result<Bytes, String>>,
}

impl RequestBody {
    /// Wrap a buffered body. `Err` carries the read failure for later readers.
    pub fn new(content_type: Option<String>, data: Result<Bytes, String>) -> Self {
        Self {
            content_type,
            data: Some(data),
        }
    }

    pub fn empty() -> Self {
        Self::new(None, Ok(Bytes::new()))
    }

    pub fn is_consumed(&self) -> bool {
        self.data.is_none()
    }

    /// Decode a JSON body. Requires `application/json`.
    pub fn json<T: DeserializeOwned>(&mut self) -> Result<T, BodyError> {
        self.expect_media_type(APPLICATION_JSON)?;
        let bytes = self.take()?;
        serde_json::from_slice(&bytes)
            .map_err(|e| BodyError::BadRequest(format!("error decoding JSON payload: {}", e)))
    }

    /// Read the body as UTF-8 text, whatever its media type.
    pub fn text(&mut self) -> Result<String, BodyError> {
        let bytes = self.take()?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| BodyError::BadRequest(format!("error reading text payload: {}", e)))
    }

    /// Decode an urlencoded form, keeping every value submitted for a name.
    pub fn form_data(&mut self) -> Result<HashMap<String, Vec<String>>, BodyError> {
        self.expect_media_type(FORM_URLENCODED)?;
        let bytes = self.take()?;

        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(&bytes) {
            fields
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        Ok(fields)
    }

    fn expect_media_type(&self, expected: &str) -> Result<(), BodyError> {
        let received = self.content_type.as_deref().unwrap_or("");
        if essence(received) == expected {
            Ok(())
        } else {
            Err(BodyError::UnsupportedMediaType {
                received: received.to_string(),
                expected: expected.to_string(),
            })
        }
    }

    fn take(&mut self) -> Result<Bytes, BodyError> {
        match self.data.take() {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(reason)) => Err(BodyError::BadRequest(reason)),
            None => Err(BodyError::Consumed),
        }
    }
}

/// Media type without parameters, lowercased.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn body(content_type: &str, data: &'static str) -> RequestBody {
        RequestBody::new(Some(content_type.to_string()), Ok(Bytes::from_static(data.as_bytes())))
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: u32,
    }

    #[test]
    fn test_json_decodes() {
        let mut b = body("application/json; charset=utf-8", r#"{"name":"ada","age":36}"#);
        let user: User = b.json().unwrap();
        assert_eq!(user, User { name: "ada".into(), age: 36 });
        assert!(b.is_consumed());
    }

    #[test]
    fn test_json_wrong_media_type_keeps_body() {
        let mut b = body("text/plain", r#"{"name":"ada","age":36}"#);
        let err = b.json::<User>().unwrap_err();
        assert!(matches!(err, BodyError::UnsupportedMediaType { .. }));
        assert!(!b.is_consumed());
        assert_eq!(b.text().unwrap(), r#"{"name":"ada","age":36}"#);
    }

    #[test]
    fn test_json_malformed_is_bad_request() {
        let mut b = body("application/json", "{not json");
        assert!(matches!(b.json::<User>(), Err(BodyError::BadRequest(_))));
    }

    #[test]
    fn test_second_read_is_consumed() {
        let mut b = body("text/plain", "hello");
        assert_eq!(b.text().unwrap(), "hello");
        assert_eq!(b.text(), Err(BodyError::Consumed));
    }

    #[test]
    fn test_read_failure_surfaces_as_bad_request() {
        let mut b = RequestBody::new(None, Err("length limit exceeded".into()));
        assert_eq!(
            b.text(),
            Err(BodyError::BadRequest("length limit exceeded".into()))
        );
    }

    #[test]
    fn test_form_data_single_values() {
        let mut b = body(FORM_URLENCODED, "key1=value1&key2=value2");
        let form = b.form_data().unwrap();
        assert_eq!(form.len(), 2);
        assert_eq!(form["key1"], vec!["value1"]);
        assert_eq!(form["key2"], vec!["value2"]);
    }

    #[test]
    fn test_form_data_keeps_multiplicity() {
        let mut b = body(FORM_URLENCODED, "tag=a&tag=b+c&tag=%2Fd");
        let form = b.form_data().unwrap();
        assert_eq!(form["tag"], vec!["a", "b c", "/d"]);
    }

    #[test]
    fn test_form_data_rejects_text_plain() {
        let mut b = body("text/plain", "key1=value1");
        let err = b.form_data().unwrap_err();
        assert!(err.to_string().contains("text/plain"));
    }

    #[test]
    fn test_essence() {
        assert_eq!(essence("Application/JSON ; charset=utf-8"), "application/json");
        assert_eq!(essence(""), "");
    }
}
