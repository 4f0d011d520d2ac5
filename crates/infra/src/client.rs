//! Blocking JSON-RPC transport for the Magento web services API.
//!
//! Every call is a JSON-RPC 2.0 request posted to `<url>/api/jsonrpc`.
//! `login` yields a session token; API methods go through
//! `call(session, method, args)`; `endSession` runs when the session drops.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use magesync_core::RemoteError;
use magesync_magento::{
    ApiConnector, AttributeSet, CategoryData, Credentials, IdentifierType, InventoryUpdate,
    MagentoApi, ProductData, StoreData, UpdateResult, WebsiteData,
};

const ENDPOINT_PATH: &str = "/api/jsonrpc";

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Value,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    message: String,
}

/// Decode a response body into its `result`, or the fault it carries.
fn decode_response(body: &str) -> Result<Value, RemoteError> {
    let response: RpcResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::Decode(e.to_string()))?;
    match response.error {
        Some(err) => {
            let code = match err.code {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            Err(RemoteError::fault(code, err.message))
        }
        None => Ok(response.result),
    }
}

fn endpoint(url: &str) -> String {
    format!("{}{}", url.trim_end_matches('/'), ENDPOINT_PATH)
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

/// Posts one envelope and returns the decoded result.
fn post(http: &reqwest::blocking::Client, url: &str, request: &RpcRequest<'_>) -> Result<Value, RemoteError> {
    let body = http
        .post(url)
        .json(request)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.text())
        .map_err(transport)?;
    decode_response(&body)
}

/// Opens [`HttpSession`]s.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: reqwest::blocking::Client,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(transport)?;
        Ok(Self { http })
    }
}

impl ApiConnector for HttpConnector {
    type Session = HttpSession;

    fn connect(&self, credentials: &Credentials) -> Result<HttpSession, RemoteError> {
        let url = endpoint(&credentials.url);
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "login",
            params: json!([credentials.api_user, credentials.expose_key()]),
            id: 0,
        };
        let token = match post(&self.http, &url, &request) {
            Ok(Value::String(token)) => token,
            Ok(other) => {
                return Err(RemoteError::Decode(format!("login returned {other}")));
            }
            Err(RemoteError::Fault { message, .. }) => return Err(RemoteError::Auth(message)),
            Err(err) => return Err(err),
        };
        tracing::debug!(url = %credentials.url, "opened magento session");

        Ok(HttpSession {
            http: self.http.clone(),
            url,
            token,
            next_id: AtomicU64::new(1),
        })
    }
}

/// An authenticated session. Ends itself on drop.
#[derive(Debug)]
pub struct HttpSession {
    http: reqwest::blocking::Client,
    url: String,
    token: String,
    next_id: AtomicU64,
}

impl HttpSession {
    fn rpc(&self, method: &str, params: Value) -> Result<Value, RemoteError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        post(&self.http, &self.url, &request)
    }

    fn call<T: DeserializeOwned>(&self, method: &str, args: Value) -> Result<T, RemoteError> {
        tracing::debug!(method, "magento call");
        let result = self.rpc("call", json!([self.token, method, args]))?;
        serde_json::from_value(result).map_err(|e| RemoteError::Decode(format!("{method}: {e}")))
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        if let Err(err) = self.rpc("endSession", json!([self.token])) {
            tracing::debug!(error = %err, "failed to end magento session");
        }
    }
}

impl MagentoApi for HttpSession {
    fn websites(&self) -> Result<Vec<WebsiteData>, RemoteError> {
        self.call("ol_websites.list", json!([]))
    }

    fn stores(&self, website_id: i64) -> Result<Vec<StoreData>, RemoteError> {
        self.call("ol_groups.list", json!([{"website_id": {"=": website_id}}]))
    }

    fn category_info(&self, category_id: i64) -> Result<CategoryData, RemoteError> {
        self.call("catalog_category.info", json!([category_id]))
    }

    fn product_info(
        &self,
        identifier: &str,
        identifier_type: IdentifierType,
    ) -> Result<ProductData, RemoteError> {
        self.call(
            "catalog_product.info",
            json!([identifier, null, null, identifier_type.as_str()]),
        )
    }

    fn attribute_sets(&self) -> Result<Vec<AttributeSet>, RemoteError> {
        self.call("catalog_product_attribute_set.list", json!([]))
    }

    fn update_inventory(&self, batch: &[InventoryUpdate]) -> Result<Vec<UpdateResult>, RemoteError> {
        self.call("cataloginventory_stock_item.multiUpdate", json!([batch]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magesync_magento::ProductType;

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("https://shop.example/"), "https://shop.example/api/jsonrpc");
        assert_eq!(endpoint("https://shop.example"), "https://shop.example/api/jsonrpc");
    }

    #[test]
    fn request_envelope_shape() {
        let batch = vec![InventoryUpdate::new("42", 0.0, Some(ProductType::Simple))];
        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params: json!(["token", "cataloginventory_stock_item.multiUpdate", [batch]]),
            id: 7,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": [
                    "token",
                    "cataloginventory_stock_item.multiUpdate",
                    [[["42", {"qty": 0.0, "is_in_stock": "0"}]]]
                ],
                "id": 7
            })
        );
    }

    #[test]
    fn error_member_becomes_fault() {
        let err = decode_response(
            r#"{"jsonrpc": "2.0", "id": 3, "error": {"code": 101, "message": "Product not exists."}}"#,
        )
        .unwrap_err();
        assert_eq!(err, RemoteError::fault("101", "Product not exists."));
    }

    #[test]
    fn result_is_returned_verbatim() {
        let value = decode_response(r#"{"jsonrpc": "2.0", "id": 1, "result": [true, {"isFault": true, "faultCode": "101", "faultMessage": "x"}]}"#)
            .unwrap();
        let results: Vec<UpdateResult> = serde_json::from_value(value).unwrap();
        assert_eq!(
            results,
            vec![UpdateResult::Success, UpdateResult::fault("101", "x")]
        );
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(
            decode_response("<html>502</html>"),
            Err(RemoteError::Decode(_))
        ));
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let connector = HttpConnector::new(Duration::from_millis(200)).unwrap();
        let creds = Credentials::new("http://127.0.0.1:9", "u", "k");
        assert!(matches!(
            connector.connect(&creds),
            Err(RemoteError::Transport(_))
        ));
    }
}
