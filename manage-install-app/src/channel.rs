//! `manage_install` method channel.
//!
//! Decodes method calls coming from the Dart side and answers with the
//! `{ "isSuccess", "message" }` map every method returns.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use manage_install_core::error::{CoreError, CoreResult};
use manage_install_core::types::{FlowOutcome, InstallRequest, StoreRequest};

use crate::AppState;

/// Channel name registered with the host messenger.
pub const CHANNEL_NAME: &str = "manage_install";

pub const METHOD_INSTALL_APK: &str = "installApk";
pub const METHOD_GO_TO_APP_STORE: &str = "goToAppStore";

/// Incoming method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }
}

/// Reply to a method call
#[derive(Debug, Clone, PartialEq)]
pub enum MethodResponse {
    Success(Value),
    NotImplemented,
}

impl From<FlowOutcome> for MethodResponse {
    fn from(outcome: FlowOutcome) -> Self {
        Self::Success(json!({
            "isSuccess": outcome.is_success,
            "message": outcome.message,
        }))
    }
}

/// Missing arguments decode like an empty map.
fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> CoreResult<T> {
    let arguments = if arguments.is_null() {
        Value::Object(Map::new())
    } else {
        arguments
    };
    Ok(serde_json::from_value(arguments)?)
}

impl AppState {
    /// Dispatches a method call from the channel.
    pub async fn handle_method_call(&self, call: MethodCall) -> MethodResponse {
        log::debug!("onMethodCall('{}')", call.method);
        match call.method.as_str() {
            METHOD_INSTALL_APK => {
                let outcome = match parse_arguments::<InstallRequest>(call.arguments) {
                    Ok(request) => self.install_apk(request).await,
                    Err(e) => reject(METHOD_INSTALL_APK, e),
                };
                outcome.into()
            }
            METHOD_GO_TO_APP_STORE => {
                let outcome = match parse_arguments::<StoreRequest>(call.arguments) {
                    Ok(request) => self.go_to_app_store(request).await,
                    Err(e) => reject(METHOD_GO_TO_APP_STORE, e),
                };
                outcome.into()
            }
            other => {
                log::debug!("{}", CoreError::NotImplemented(other.to_string()));
                MethodResponse::NotImplemented
            }
        }
    }
}

fn reject(method: &str, err: CoreError) -> FlowOutcome {
    err.log(method);
    err.into()
}
