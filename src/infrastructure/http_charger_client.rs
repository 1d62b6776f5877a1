// Charger REST client over reqwest
use crate::application::charger_api::{ChargerApi, ChargerError};
use crate::domain::channel::ChannelReading;
use crate::domain::preset::Preset;
use crate::domain::status::DeviceStatus;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct HttpChargerClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpChargerClient {
    /// `host` is a bare `name[:port]`, or a full URL when it carries a scheme
    pub fn new(host: &str) -> Self {
        Self::with_client(reqwest::Client::new(), host)
    }

    pub fn with_client(http: reqwest::Client, host: &str) -> Self {
        let host = host.trim().trim_end_matches('/');
        let base_url = if host.contains("://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send, insist on a 2xx, and hand back the body text
    async fn execute(&self, request: RequestBuilder) -> Result<String, ChargerError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ChargerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ChargerError> {
        tracing::trace!(path, "GET");
        let body = self.execute(self.request(Method::GET, path)).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ChargerApi for HttpChargerClient {
    async fn get_status(&self) -> Result<DeviceStatus, ChargerError> {
        self.get_json("/status").await
    }

    async fn get_channel(&self, index: usize) -> Result<ChannelReading, ChargerError> {
        self.get_json(&format!("/channel/{index}")).await
    }

    async fn list_presets(&self) -> Result<Vec<Preset>, ChargerError> {
        self.get_json("/preset").await
    }

    async fn get_preset(&self, slot: i64) -> Result<Preset, ChargerError> {
        self.get_json(&format!("/preset/{slot}")).await
    }

    async fn add_preset(&self, preset: &Preset) -> Result<Preset, ChargerError> {
        let request = self.request(Method::PUT, "/addpreset").json(preset);
        let body = self.execute(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn update_preset(&self, preset: &Preset) -> Result<(), ChargerError> {
        let path = format!("/preset/{}", preset.index);
        self.execute(self.request(Method::PUT, &path).json(preset))
            .await?;
        Ok(())
    }

    async fn delete_preset(&self, slot: i64) -> Result<(), ChargerError> {
        let path = format!("/preset/{slot}");
        self.execute(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::preset::ChemistryType;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, HttpChargerClient) {
        let server = MockServer::start().await;
        let client = HttpChargerClient::new(&server.uri());
        (server, client)
    }

    #[test]
    fn test_base_url() {
        assert_eq!(HttpChargerClient::new("charger.local:5000").base_url(), "http://charger.local:5000");
        assert_eq!(HttpChargerClient::new("http://10.0.0.2/").base_url(), "http://10.0.0.2");
    }

    #[tokio::test]
    async fn test_get_status() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "charger_presence": "connected",
                "channel_count": 2,
                "device_id": 66
            })))
            .mount(&server)
            .await;

        let status = client.get_status().await.unwrap();

        assert!(status.reports_charger());
        assert_eq!(status.device_id(), Some(66));
    }

    #[tokio::test]
    async fn test_get_status_server_error() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(504).set_body_string("charger unplugged"))
            .mount(&server)
            .await;

        let result = client.get_status().await;

        assert!(
            matches!(result, Err(ChargerError::Status { status: 504, ref body }) if body == "charger unplugged"),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_get_status_malformed_body() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/status"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        assert!(matches!(client.get_status().await, Err(ChargerError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let (server, client) = setup().await;
        drop(server);

        assert!(matches!(client.get_status().await, Err(ChargerError::Transport(_))));
    }

    #[tokio::test]
    async fn test_get_channel() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/channel/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "curr_inp_volts": 12.3,
                "curr_out_amps": 1.0,
                "timestamp": 1000,
                "cells": [{"v": 4.15, "cell": 0, "balance": 0, "ir": 3.2}]
            })))
            .mount(&server)
            .await;

        let reading = client.get_channel(1).await.unwrap();

        assert_eq!(reading.curr_inp_volts, 12.3);
        assert_eq!(reading.cells.len(), 1);
        assert_eq!(reading.cells[0].ir, 3.2);
    }

    #[tokio::test]
    async fn test_list_presets() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/preset"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"index": 0, "name": "LiPo", "type": 0},
                {"index": 1, "name": "Pb", "type": 7}
            ])))
            .mount(&server)
            .await;

        let presets = client.list_presets().await.unwrap();

        assert_eq!(presets.len(), 2);
        assert_eq!(presets[1].chemistry, ChemistryType::Pb);
    }

    #[tokio::test]
    async fn test_add_preset_puts_json() {
        let (server, client) = setup().await;
        Mock::given(method("PUT"))
            .and(path("/addpreset"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({"index": -1, "name": "Fresh", "type": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "index": 3, "name": "Fresh", "type": 0
            })))
            .expect(1)
            .mount(&server)
            .await;

        let created = client
            .add_preset(&Preset::new("Fresh", ChemistryType::LiPo))
            .await
            .unwrap();

        assert_eq!(created.index, 3);
    }

    #[tokio::test]
    async fn test_update_preset_ignores_body() {
        let (server, client) = setup().await;
        Mock::given(method("PUT"))
            .and(path("/preset/4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let mut preset = Preset::new("Slot four", ChemistryType::LiPo);
        preset.index = 4;
        client.update_preset(&preset).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_preset_rejected() {
        let (server, client) = setup().await;
        Mock::given(method("PUT"))
            .and(path("/preset/4"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad preset"))
            .mount(&server)
            .await;

        let mut preset = Preset::new("Slot four", ChemistryType::LiPo);
        preset.index = 4;
        assert!(matches!(
            client.update_preset(&preset).await,
            Err(ChargerError::Status { status: 400, .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_preset() {
        let (server, client) = setup().await;
        Mock::given(method("DELETE"))
            .and(path("/preset/2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client.delete_preset(2).await.unwrap();
    }
}
