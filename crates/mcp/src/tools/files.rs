// Files and contact additional addresses

use super::{delete_tool, get_tool, list_tool, update_tool, Body, Operation, ToolEntry};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bexio_core::schema::id;
use bexio_core::{
    BexioApi, FieldSchema, FileUpload, ObjectSchema, Resource, Rule, ToolDefinition, ToolError,
    ToolResult, ValidatedParams, ValidationError, Violation,
};
use futures::future::BoxFuture;
use serde_json::{json, Value};

fn upload_file(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let encoded = params.str("content_base64").unwrap_or_default();
        let content = STANDARD.decode(encoded.trim()).map_err(|e| {
            ValidationError::single(Violation::new(
                "content_base64",
                Rule::Format,
                format!("is not valid base64: {}", e),
            ))
        })?;

        let upload = FileUpload {
            name: params.str("name").unwrap_or_default().to_string(),
            content_type: params.str("content_type").unwrap_or_default().to_string(),
            content,
        };
        Ok(api.upload_file(upload).await?)
    })
}

fn download_file(api: &dyn BexioApi, params: ValidatedParams) -> BoxFuture<'_, ToolResult<Value>> {
    Box::pin(async move {
        let file_id = params.require_u64("file_id")?;
        let download = api
            .download_file(file_id)
            .await?
            .ok_or_else(|| ToolError::not_found(Resource::Files.entity(), file_id))?;

        Ok(json!({
            "file_id": file_id,
            "content_type": download.content_type,
            "size": download.content.len(),
            "content_base64": STANDARD.encode(&download.content),
        }))
    })
}

fn address_data() -> ObjectSchema {
    ObjectSchema::new(vec![
        FieldSchema::string("name", "Name").optional(),
        FieldSchema::string("address", "Street and number").optional(),
        FieldSchema::string("postcode", "Postal code").optional(),
        FieldSchema::string("city", "City").optional(),
        FieldSchema::integer("country_id", "Country ID").positive().optional(),
        FieldSchema::string("subject", "Subject").optional(),
        FieldSchema::string("description", "Description").optional(),
    ])
}

fn files() -> Vec<ToolEntry> {
    vec![
        list_tool("list_files", "List files with optional pagination", Resource::Files, 50),
        get_tool("get_file", "Get file metadata by ID", Resource::Files),
        ToolEntry::new(
            ToolDefinition::new(
                "upload_file",
                "Upload a file given as base64 content",
                ObjectSchema::new(vec![
                    FieldSchema::string("name", "File name including extension").min_len(1),
                    FieldSchema::string("content_base64", "File content, base64 encoded").min_len(1),
                    FieldSchema::string("content_type", "MIME type, e.g. application/pdf").min_len(1),
                ]),
            ),
            Operation::Custom(upload_file),
        ),
        ToolEntry::new(
            ToolDefinition::new(
                "download_file",
                "Download a file; the content is returned base64 encoded",
                ObjectSchema::new(vec![id("file_id", "The file ID")]),
            )
            .read_only(),
            Operation::Custom(download_file),
        ),
        update_tool("update_file", "Update file metadata", Resource::Files, "file_data"),
        delete_tool("delete_file", "Delete a file", Resource::Files),
    ]
}

fn additional_addresses() -> Vec<ToolEntry> {
    vec![
        list_tool(
            "list_additional_addresses",
            "List the additional addresses of a contact",
            Resource::AdditionalAddresses,
            50,
        ),
        get_tool(
            "get_additional_address",
            "Get one additional address of a contact",
            Resource::AdditionalAddresses,
        ),
        ToolEntry::new(
            ToolDefinition::new(
                "create_additional_address",
                "Add an additional address to a contact",
                ObjectSchema::new(vec![
                    id("contact_id", "The contact the record belongs to"),
                    FieldSchema::object("address_data", "Address fields", address_data()),
                ]),
            ),
            Operation::Create(Resource::AdditionalAddresses, Body::Field("address_data")),
        ),
        delete_tool(
            "delete_additional_address",
            "Remove an additional address from a contact",
            Resource::AdditionalAddresses,
        ),
    ]
}

pub(crate) fn tools() -> Vec<ToolEntry> {
    let mut tools = files();
    tools.extend(additional_addresses());
    tools
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockApi;
    use crate::tools::{registry, Dispatcher};
    use bexio_core::ErrorKind;
    use std::sync::Arc;

    fn dispatcher(api: MockApi) -> (Dispatcher, Arc<MockApi>) {
        let api = Arc::new(api);
        (Dispatcher::new(registry().unwrap(), api.clone()), api)
    }

    #[tokio::test]
    async fn test_upload_decodes_content() {
        let (dispatcher, api) = dispatcher(MockApi::new());

        let result = dispatcher
            .dispatch(
                "upload_file",
                Some(&json!({
                    "name": "note.txt",
                    "content_base64": "aGVsbG8gd29ybGQ=",
                    "content_type": "text/plain",
                })),
            )
            .await
            .unwrap();

        assert_eq!(result[0]["size_in_bytes"], 11);
        assert_eq!(api.last_call().unwrap().body.unwrap()["size"], 11);
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_base64() {
        let (dispatcher, api) = dispatcher(MockApi::new());

        let err = dispatcher
            .dispatch(
                "upload_file",
                Some(&json!({
                    "name": "note.txt",
                    "content_base64": "not base64!",
                    "content_type": "text/plain",
                })),
            )
            .await
            .unwrap_err();

        match err {
            ToolError::Validation(err) => assert!(err.has("content_base64", Rule::Format)),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_download_encodes_content() {
        let api = MockApi::new().with_records(Resource::Files, vec![json!({"id": 5})]);
        let (dispatcher, _) = dispatcher(api);

        let result = dispatcher
            .dispatch("download_file", Some(&json!({"file_id": 5})))
            .await
            .unwrap();

        assert_eq!(result["content_base64"], "aGVsbG8=");
        assert_eq!(result["content_type"], "text/plain");

        let err = dispatcher
            .dispatch("download_file", Some(&json!({"file_id": 6})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "File with ID 6 not found");
    }

    #[tokio::test]
    async fn test_additional_address_nested_fields() {
        let (dispatcher, api) = dispatcher(MockApi::new());

        let err = dispatcher
            .dispatch(
                "create_additional_address",
                Some(&json!({"contact_id": 4, "address_data": {"country_id": "CH"}})),
            )
            .await
            .unwrap_err();
        match err {
            ToolError::Validation(err) => {
                assert!(err.has("address_data.country_id", Rule::WrongType))
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        dispatcher
            .dispatch(
                "create_additional_address",
                Some(&json!({"contact_id": 4, "address_data": {"name": "Lager", "city": "Basel"}})),
            )
            .await
            .unwrap();
        let call = api.last_call().unwrap();
        assert_eq!(call.endpoint.unwrap().path(), "2.0/contact/4/additional_address");
        assert_eq!(call.body.unwrap(), json!({"name": "Lager", "city": "Basel"}));
    }
}
