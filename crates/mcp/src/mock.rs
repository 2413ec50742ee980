// In-memory BexioApi for handler and dispatcher tests

use async_trait::async_trait;
use bexio_core::{
    Action, BexioApi, Endpoint, FileDownload, FileUpload, PageRequest, RemoteError, Resource,
    SearchCriterion,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// One recorded remote call.
#[derive(Debug, Clone, Default)]
pub struct Call {
    pub method: &'static str,
    pub endpoint: Option<Endpoint>,
    pub id: Option<u64>,
    pub page: Option<PageRequest>,
    pub body: Option<Value>,
    pub criteria: Vec<SearchCriterion>,
}

#[derive(Default)]
pub struct MockApi {
    records: HashMap<Resource, Vec<Value>>,
    failures: HashMap<Resource, RemoteError>,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, resource: Resource, records: Vec<Value>) -> Self {
        self.records.insert(resource, records);
        self
    }

    /// Every call on `resource` fails with `error`.
    pub fn failing(mut self, resource: Resource, error: RemoteError) -> Self {
        self.failures.insert(resource, error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> Option<Call> {
        self.calls.lock().unwrap().last().cloned()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.method == method).count()
    }

    fn record(&self, call: Call) -> Result<(), RemoteError> {
        let failure = call
            .endpoint
            .as_ref()
            .and_then(|e| self.failures.get(&e.resource))
            .cloned();
        self.calls.lock().unwrap().push(call);
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn find(&self, resource: Resource, id: u64) -> Option<Value> {
        self.records
            .get(&resource)?
            .iter()
            .find(|r| r["id"].as_u64() == Some(id))
            .cloned()
    }

    fn require(&self, resource: Resource, id: u64) -> Result<Value, RemoteError> {
        self.find(resource, id)
            .ok_or_else(|| RemoteError::new(Some(404), "Not found"))
    }
}

fn matches(record: &Value, criterion: &SearchCriterion) -> bool {
    let actual = &record[&criterion.field];
    match criterion.criteria.to_ascii_lowercase().as_str() {
        "like" => match (actual.as_str(), criterion.value.as_str()) {
            (Some(a), Some(v)) => a.to_lowercase().contains(&v.to_lowercase()),
            _ => false,
        },
        _ => actual == &criterion.value,
    }
}

#[async_trait]
impl BexioApi for MockApi {
    async fn list(&self, endpoint: &Endpoint, page: PageRequest) -> Result<Vec<Value>, RemoteError> {
        self.record(Call {
            method: "list",
            endpoint: Some(endpoint.clone()),
            page: Some(page),
            ..Default::default()
        })?;
        let records = self.records.get(&endpoint.resource).cloned().unwrap_or_default();
        Ok(records
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn get(&self, endpoint: &Endpoint, id: u64) -> Result<Option<Value>, RemoteError> {
        self.record(Call {
            method: "get",
            endpoint: Some(endpoint.clone()),
            id: Some(id),
            ..Default::default()
        })?;
        Ok(self.find(endpoint.resource, id))
    }

    async fn create(&self, endpoint: &Endpoint, body: Value) -> Result<Value, RemoteError> {
        self.record(Call {
            method: "create",
            endpoint: Some(endpoint.clone()),
            body: Some(body.clone()),
            ..Default::default()
        })?;
        let mut created = body;
        if let Value::Object(map) = &mut created {
            map.insert("id".to_string(), json!(1000));
        }
        Ok(created)
    }

    async fn update(&self, endpoint: &Endpoint, id: u64, body: Value) -> Result<Value, RemoteError> {
        self.record(Call {
            method: "update",
            endpoint: Some(endpoint.clone()),
            id: Some(id),
            body: Some(body.clone()),
            ..Default::default()
        })?;
        let mut record = self.require(endpoint.resource, id)?;
        if let (Value::Object(target), Value::Object(changes)) = (&mut record, body) {
            target.extend(changes);
        }
        Ok(record)
    }

    async fn delete(&self, endpoint: &Endpoint, id: u64) -> Result<Value, RemoteError> {
        self.record(Call {
            method: "delete",
            endpoint: Some(endpoint.clone()),
            id: Some(id),
            ..Default::default()
        })?;
        self.require(endpoint.resource, id)?;
        Ok(json!({"success": true}))
    }

    async fn search(
        &self,
        endpoint: &Endpoint,
        criteria: &[SearchCriterion],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Value>, RemoteError> {
        self.record(Call {
            method: "search",
            endpoint: Some(endpoint.clone()),
            page: limit.map(|l| PageRequest::new(l, offset.unwrap_or(0))),
            criteria: criteria.to_vec(),
            ..Default::default()
        })?;
        let records = self.records.get(&endpoint.resource).cloned().unwrap_or_default();
        Ok(records
            .into_iter()
            .filter(|r| criteria.iter().all(|c| matches(r, c)))
            .skip(offset.unwrap_or(0) as usize)
            .take(limit.map_or(usize::MAX, |l| l as usize))
            .collect())
    }

    async fn act(&self, endpoint: &Endpoint, id: u64, action: Action) -> Result<Value, RemoteError> {
        self.record(Call {
            method: action.path_segment(),
            endpoint: Some(endpoint.clone()),
            id: Some(id),
            ..Default::default()
        })?;
        self.require(endpoint.resource, id)?;
        Ok(json!({"success": true}))
    }

    async fn current_user(&self) -> Result<Value, RemoteError> {
        self.record(Call {
            method: "current_user",
            ..Default::default()
        })?;
        Ok(json!({"id": 1, "firstname": "Anna", "lastname": "Muster"}))
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<Value, RemoteError> {
        self.record(Call {
            method: "upload_file",
            endpoint: Some(Endpoint::of(Resource::Files)),
            body: Some(json!({
                "name": upload.name,
                "content_type": upload.content_type,
                "size": upload.content.len(),
            })),
            ..Default::default()
        })?;
        Ok(json!([{"id": 77, "name": upload.name, "size_in_bytes": upload.content.len()}]))
    }

    async fn download_file(&self, id: u64) -> Result<Option<FileDownload>, RemoteError> {
        self.record(Call {
            method: "download_file",
            endpoint: Some(Endpoint::of(Resource::Files)),
            id: Some(id),
            ..Default::default()
        })?;
        Ok(self.find(Resource::Files, id).map(|_| FileDownload {
            content_type: "text/plain".to_string(),
            content: b"hello".to_vec(),
        }))
    }
}
