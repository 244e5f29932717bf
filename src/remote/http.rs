//! JSON-over-HTTP record service using reqwest.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Response};

use crate::config::RemoteConfig;
use crate::model::{NewRecord, Record, RecordId};
use crate::remote::{RecordService, ServiceError};

pub struct HttpRecordService {
    client: Client,
    base_url: String,
}

impl HttpRecordService {
    /// Create a new HTTP service from configuration
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("orgdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, id: RecordId) -> String {
        format!("{}/{}", self.base_url, id)
    }

    fn transport(url: &str) -> impl FnOnce(reqwest::Error) -> ServiceError + '_ {
        move |source| ServiceError::Transport {
            url: url.to_string(),
            source,
        }
    }

    fn check_status(method: &'static str, url: &str, response: Response) -> Result<Response, ServiceError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(ServiceError::Status {
                method,
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

impl RecordService for HttpRecordService {
    async fn list(&self) -> Result<Vec<Record>, ServiceError> {
        let url = self.base_url.as_str();
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(Self::transport(url))?;
        let response = Self::check_status("GET", url, response)?;

        let records: Vec<Record> = response.json().await.map_err(|source| ServiceError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok(records.into_iter().map(Record::with_display_name).collect())
    }

    async fn create(&self, payload: &NewRecord) -> Result<Record, ServiceError> {
        let url = self.base_url.as_str();
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(Self::transport(url))?;
        let response = Self::check_status("POST", url, response)?;

        let created: Record = response.json().await.map_err(|source| ServiceError::Decode {
            url: url.to_string(),
            source,
        })?;
        Ok(created.with_display_name())
    }

    async fn update(&self, record: &Record) -> Result<(), ServiceError> {
        let url = self.record_url(record.id);
        let response = self
            .client
            .put(&url)
            .json(record)
            .send()
            .await
            .map_err(Self::transport(&url))?;
        Self::check_status("PUT", &url, response)?;
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> Result<(), ServiceError> {
        let url = self.record_url(id);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(Self::transport(&url))?;
        Self::check_status("DELETE", &url, response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LIST_BODY: &str = r#"[
      {
        "id": 1,
        "name": "Leanne Graham",
        "username": "Bret",
        "email": "Sincere@april.biz",
        "address": {
          "street": "Kulas Light",
          "suite": "Apt. 556",
          "city": "Gwenborough",
          "zipcode": "92998-3874",
          "geo": { "lat": "-37.3159", "lng": "81.1496" }
        },
        "phone": "1-770-736-8031 x56442",
        "website": "hildegard.org",
        "company": {
          "name": "Romaguera-Crona",
          "catchPhrase": "Multi-layered client-server neural-net",
          "bs": "harness real-time e-markets"
        }
      }
    ]"#;

    #[test]
    fn wire_records_ignore_unknown_fields() {
        let records: Vec<Record> = serde_json::from_str(LIST_BODY).unwrap();
        let record = records.into_iter().next().unwrap().with_display_name();

        assert_eq!(record.id, 1);
        assert_eq!(record.username, "Bret");
        assert_eq!(record.address.suite, "Apt. 556");
        assert_eq!(record.company.name, "Romaguera-Crona");
        assert_eq!(record.director_full_name, "Leanne Graham");
    }

    #[test]
    fn create_payload_has_no_id_and_camel_case_keys() {
        let payload = NewRecord {
            name: "Ivan Petrov".into(),
            director_full_name: "Ivan Petrov".into(),
            ..NewRecord::default()
        };
        let json = serde_json::to_value(&payload).unwrap();

        assert!(json.get("id").is_none());
        assert_eq!(json["directorFullName"], "Ivan Petrov");
        assert_eq!(json["address"]["city"], "");
    }

    #[test]
    fn created_record_without_optional_fields_decodes() {
        let record: Record = serde_json::from_str(r#"{"id": 11, "name": "New Co"}"#).unwrap();
        let record = record.with_display_name();
        assert_eq!(record.id, 11);
        assert_eq!(record.director_full_name, "New Co");
        assert!(record.phone.is_empty());
    }

    #[test]
    fn record_urls_drop_trailing_slash() {
        let config = RemoteConfig {
            url: "https://example.test/users/".into(),
            timeout_secs: 1,
        };
        let service = HttpRecordService::new(&config).unwrap();
        assert_eq!(service.base_url(), "https://example.test/users");
        assert_eq!(service.record_url(4), "https://example.test/users/4");
    }

    fn service_for(server: &MockServer) -> HttpRecordService {
        let config = RemoteConfig {
            url: format!("{}/users", server.uri()),
            timeout_secs: 5,
        };
        HttpRecordService::new(&config).unwrap()
    }

    fn json_body(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body, "application/json")
    }

    #[tokio::test]
    async fn list_fills_display_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(json_body(LIST_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let records = service_for(&server).list().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].director_full_name, "Leanne Graham");
        assert_eq!(records[0].company.name, "Romaguera-Crona");
    }

    #[tokio::test]
    async fn list_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = service_for(&server).list().await.unwrap_err();

        assert!(matches!(err, ServiceError::Status { method: "GET", status: 500, .. }), "{err}");
    }

    #[tokio::test]
    async fn list_with_malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users"))
            .respond_with(json_body(r#"{"not": "a list"}"#))
            .mount(&server)
            .await;

        let err = service_for(&server).list().await.unwrap_err();

        assert!(matches!(err, ServiceError::Decode { .. }), "{err}");
    }

    #[tokio::test]
    async fn create_posts_the_payload_and_returns_the_assigned_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(body_partial_json(serde_json::json!({
                "name": "Ivan Petrov",
                "directorFullName": "Ivan Petrov",
                "company": { "name": "Vector" }
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_raw(r#"{"id": 11, "name": "Ivan Petrov", "company": {"name": "Vector"}}"#, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let payload = NewRecord {
            name: "Ivan Petrov".into(),
            director_full_name: "Ivan Petrov".into(),
            company: crate::model::Company { name: "Vector".into() },
            ..NewRecord::default()
        };
        let created = service_for(&server).create(&payload).await.unwrap();

        assert_eq!(created.id, 11);
        assert_eq!(created.director_full_name, "Ivan Petrov");
        assert_eq!(created.company.name, "Vector");
    }

    #[tokio::test]
    async fn create_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let err = service_for(&server).create(&NewRecord::default()).await.unwrap_err();

        assert!(matches!(err, ServiceError::Status { method: "POST", status: 400, .. }), "{err}");
    }

    #[tokio::test]
    async fn update_puts_to_the_record_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/users/4"))
            .and(body_partial_json(serde_json::json!({ "id": 4, "phone": "555-0104" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let record = Record {
            id: 4,
            phone: "555-0104".into(),
            ..Record::default()
        };
        service_for(&server).update(&record).await.unwrap();
    }

    #[tokio::test]
    async fn update_error_status_names_the_record_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/users/4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = service_for(&server).update(&Record::blank(4)).await.unwrap_err();

        match err {
            ServiceError::Status { method, url, status } => {
                assert_eq!(method, "PUT");
                assert_eq!(status, 404);
                assert!(url.ends_with("/users/4"), "{url}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn delete_targets_the_record_url() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/users/7"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        service_for(&server).delete(7).await.unwrap();
    }

    #[tokio::test]
    async fn delete_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/users/7"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = service_for(&server).delete(7).await.unwrap_err();

        assert!(matches!(err, ServiceError::Status { method: "DELETE", status: 503, .. }), "{err}");
    }
}
