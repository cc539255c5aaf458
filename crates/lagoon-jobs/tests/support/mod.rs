#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use lagoon_api::{
    ApiError, ApiResponse, CreateDataAssetRequest, PermissionsRequest, PlatformApi,
    RunCapsuleRequest, SearchQuery, UpdateDataAssetRequest,
};
use serde_json::{Value, json};

/// Operations in the order the code under test issued them.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    CreateDataAsset(CreateDataAssetRequest),
    GetDataAsset(String),
    UpdateDataAsset(String, UpdateDataAssetRequest),
    UpdatePermissions(String, PermissionsRequest),
    SearchDataAssets(SearchQuery),
    RunCapsule(RunCapsuleRequest),
    GetComputation(String),
}

impl Call {
    pub fn operation(&self) -> &'static str {
        match self {
            Call::CreateDataAsset(_) => "create_data_asset",
            Call::GetDataAsset(_) => "get_data_asset",
            Call::UpdateDataAsset(_, _) => "update_data_asset",
            Call::UpdatePermissions(_, _) => "update_permissions",
            Call::SearchDataAssets(_) => "search_data_assets",
            Call::RunCapsule(_) => "run_capsule",
            Call::GetComputation(_) => "get_computation",
        }
    }
}

/// Scripted platform double: per-operation response queues and a call
/// log. Once a queue is down to its last response, that response repeats,
/// which keeps polling loops fed without scripting every iteration.
#[derive(Default)]
pub struct MockApi {
    queues: Mutex<HashMap<&'static str, VecDeque<ApiResponse>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, operation: &'static str, responses: Vec<ApiResponse>) {
        self.queues
            .lock()
            .expect("queues lock")
            .entry(operation)
            .or_default()
            .extend(responses);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls lock").push(call);
    }

    fn next(&self, operation: &'static str) -> ApiResponse {
        let mut queues = self.queues.lock().expect("queues lock");
        match queues.get_mut(operation) {
            Some(queue) if !queue.is_empty() => {
                if queue.len() > 1 {
                    queue.pop_front().expect("non-empty queue")
                } else {
                    queue.front().expect("non-empty queue").clone()
                }
            }
            _ => panic!("no scripted response for {operation}"),
        }
    }
}

#[async_trait]
impl PlatformApi for &MockApi {
    async fn create_data_asset(
        &self,
        request: &CreateDataAssetRequest,
    ) -> Result<ApiResponse, ApiError> {
        self.record(Call::CreateDataAsset(request.clone()));
        Ok(self.next("create_data_asset"))
    }

    async fn get_data_asset(&self, id: &str) -> Result<ApiResponse, ApiError> {
        self.record(Call::GetDataAsset(id.to_string()));
        Ok(self.next("get_data_asset"))
    }

    async fn update_data_asset(
        &self,
        id: &str,
        request: &UpdateDataAssetRequest,
    ) -> Result<ApiResponse, ApiError> {
        self.record(Call::UpdateDataAsset(id.to_string(), request.clone()));
        Ok(self.next("update_data_asset"))
    }

    async fn update_permissions(
        &self,
        id: &str,
        request: &PermissionsRequest,
    ) -> Result<ApiResponse, ApiError> {
        self.record(Call::UpdatePermissions(id.to_string(), request.clone()));
        Ok(self.next("update_permissions"))
    }

    async fn search_data_assets(&self, query: &SearchQuery) -> Result<ApiResponse, ApiError> {
        self.record(Call::SearchDataAssets(query.clone()));
        Ok(self.next("search_data_assets"))
    }

    async fn run_capsule(&self, request: &RunCapsuleRequest) -> Result<ApiResponse, ApiError> {
        self.record(Call::RunCapsule(request.clone()));
        Ok(self.next("run_capsule"))
    }

    async fn get_computation(&self, id: &str) -> Result<ApiResponse, ApiError> {
        self.record(Call::GetComputation(id.to_string()));
        Ok(self.next("get_computation"))
    }
}

pub fn ok(body: Value) -> ApiResponse {
    ApiResponse::new(200, body)
}

pub fn asset_body(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "created": 1_666_322_134_i64,
        "state": "ready",
        "tags": ["ecephys", "raw"],
        "type": "dataset",
    })
}

pub fn computation_body(id: &str, state: &str) -> Value {
    json!({"id": id, "state": state, "run_time": 8})
}
