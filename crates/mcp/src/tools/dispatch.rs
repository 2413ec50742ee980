// Dispatcher: validate, gate, run exactly one operation

use super::registry::{Body, Operation, Rules, ToolEntry, ToolRegistry};
use bexio_core::{
    collect_all, validate, validate_payment, BexioApi, Endpoint, Module, ModuleGates, PageRequest,
    RemoteError, Resource, Rule, SearchCriterion, ToolError, ToolResult, ValidatedParams,
    ValidationError, Violation,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct Dispatcher {
    registry: ToolRegistry,
    api: Arc<dyn BexioApi>,
    gates: ModuleGates,
}

impl Dispatcher {
    pub fn new(registry: ToolRegistry, api: Arc<dyn BexioApi>) -> Self {
        Self {
            registry,
            api,
            gates: ModuleGates::new(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Run one tool invocation end to end.
    pub async fn dispatch(&self, name: &str, args: Option<&Value>) -> ToolResult<Value> {
        let started = Instant::now();
        let result = self.dispatch_inner(name, args).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(tool = name, elapsed_ms, "Tool call completed"),
            Err(err) => warn!(
                tool = name,
                elapsed_ms,
                kind = ?err.kind(),
                error = %err,
                "Tool call failed"
            ),
        }
        result
    }

    async fn dispatch_inner(&self, name: &str, args: Option<&Value>) -> ToolResult<Value> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool {
                name: name.to_string(),
            })?;

        let params = match entry.rules {
            Rules::Generic => validate(&entry.definition.input_schema, args)?,
            Rules::Payment(variant) => validate_payment(variant, args)?,
        };

        if let Some(module) = entry.gated_module() {
            self.ensure_available(module).await?;
        }

        debug!(tool = entry.name(), operation = ?entry.operation, "Dispatching");
        self.run(entry, params).await
    }

    async fn ensure_available(&self, module: Module) -> ToolResult<()> {
        let api = self.api.as_ref();
        self.gates
            .gate(module)
            .ensure_available(|| async move {
                api.list(&probe_endpoint(module), PageRequest::new(1, 0))
                    .await
                    .map(|_| ())
            })
            .await
    }

    async fn run(&self, entry: &ToolEntry, params: ValidatedParams) -> ToolResult<Value> {
        let api = self.api.as_ref();

        match entry.operation {
            Operation::List { resource, filters } => {
                let mut endpoint = endpoint_for(resource, &params)?;
                for filter in filters {
                    if let Some(value) = params.get(filter) {
                        endpoint = endpoint.with_filter(*filter, query_value(value));
                    }
                }
                let page = PageRequest::new(params.require_u64("limit")?, params.require_u64("offset")?);
                Ok(Value::Array(api.list(&endpoint, page).await?))
            }
            Operation::ListAll(resource) => {
                let endpoint = endpoint_for(resource, &params)?;
                let chunk_size = params.require_u64("chunk_size")?;
                let items = collect_all(chunk_size, |page| api.list(&endpoint, page)).await?;
                Ok(Value::Array(items))
            }
            Operation::Get(resource) => {
                let endpoint = endpoint_for(resource, &params)?;
                let id = params.require_u64(resource.id_field())?;
                api.get(&endpoint, id)
                    .await?
                    .ok_or_else(|| ToolError::not_found(resource.entity(), id))
            }
            Operation::Create(resource, body) => {
                let endpoint = endpoint_for(resource, &params)?;
                let body = request_body(body, resource, &params)?;
                Ok(api.create(&endpoint, body).await?)
            }
            Operation::Update(resource, body) => {
                let endpoint = endpoint_for(resource, &params)?;
                let id = params.require_u64(resource.id_field())?;
                let body = request_body(body, resource, &params)?;
                by_id(api.update(&endpoint, id, body).await, resource, id)
            }
            Operation::Delete(resource) => {
                let endpoint = endpoint_for(resource, &params)?;
                let id = params.require_u64(resource.id_field())?;
                by_id(api.delete(&endpoint, id).await, resource, id)
            }
            Operation::Search(resource, field) => {
                let criteria = search_criteria(&params, field)?;
                let items = api
                    .search(
                        &Endpoint::of(resource),
                        &criteria,
                        params.u64("limit"),
                        params.u64("offset"),
                    )
                    .await?;
                Ok(Value::Array(items))
            }
            Operation::Act(resource, action) => {
                let endpoint = endpoint_for(resource, &params)?;
                let id = params.require_u64(resource.id_field())?;
                by_id(api.act(&endpoint, id, action).await, resource, id)
            }
            Operation::Custom(handler) => handler(api, params).await,
        }
    }
}

/// Cheapest call that fails when the module is not licensed.
fn probe_endpoint(module: Module) -> Endpoint {
    match module {
        Module::Payroll => Endpoint::of(Resource::Employees),
    }
}

pub(crate) fn endpoint_for(resource: Resource, params: &ValidatedParams) -> Result<Endpoint, ValidationError> {
    Ok(match resource.parent_field() {
        Some(field) => Endpoint::child(resource, params.require_u64(field)?),
        None => Endpoint::of(resource),
    })
}

/// A remote 404 on an identifier-addressed call means the record is gone.
pub(crate) fn by_id<T>(result: Result<T, RemoteError>, resource: Resource, id: u64) -> ToolResult<T> {
    result.map_err(|err| match err.status {
        Some(404) => ToolError::not_found(resource.entity(), id),
        _ => ToolError::Remote(err),
    })
}

fn request_body(body: Body, resource: Resource, params: &ValidatedParams) -> Result<Value, ValidationError> {
    match body {
        Body::Field(field) => params.require_value(field),
        Body::Params => {
            let skip = [Some(resource.id_field()), resource.parent_field()];
            let map: Map<String, Value> = params
                .as_map()
                .iter()
                .filter(|(key, _)| !skip.iter().any(|s| *s == Some(key.as_str())))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            Ok(Value::Object(map))
        }
    }
}

pub(crate) fn search_criteria(params: &ValidatedParams, field: &str) -> Result<Vec<SearchCriterion>, ValidationError> {
    serde_json::from_value(params.require_value(field)?).map_err(|e| {
        ValidationError::single(Violation::new(field, Rule::WrongType, e.to_string()))
    })
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
