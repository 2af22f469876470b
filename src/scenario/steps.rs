//! Step catalog
//!
//! Every test step the scenario groups can run: its endpoint, a plan
//! function that builds the request from the run configuration and the
//! captured state (or decides to skip), and the ordered list of response
//! shapes the gateway has been observed to return for it.
//!
//! Shape lists are ordered newest deployment first; the order is harness
//! tolerance, not a server contract. Reordering may change the reported
//! shape name but must never turn a pass into a fail.

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::common::RunConfig;
use crate::shapes::{field_is_array, field_is_string, lookup, lookup_str, ShapePredicate};

use super::state::{CapturedState, StateKey};
use crate::endpoints::Endpoint;

/// What a step decided to do after looking at config and state
#[derive(Debug, Clone)]
pub enum Plan {
    /// Call the endpoint with an optional JSON body
    Invoke { body: Option<Value> },
    /// Multipart upload of a file plus JSON metadata
    Upload { file: PathBuf, metadata: Value },
    /// Precondition unmet: skip without calling anything
    Skip { reason: String },
}

/// A single orchestrated test step
pub struct StepSpec {
    pub name: &'static str,
    pub endpoint: Endpoint,
    /// Delete operations only run with the destructive flag set
    pub destructive: bool,
    pub plan: fn(&RunConfig, &CapturedState) -> Plan,
    pub shapes: &'static [ShapePredicate],
}

impl std::fmt::Debug for StepSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepSpec")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("destructive", &self.destructive)
            .finish()
    }
}

/// Tag applied (and later removed) by the tag steps
const HARNESS_TAG: &str = "conformance";

// === Shape helpers ===================================================

fn first_id_of_array(items: &Value) -> Option<String> {
    items
        .as_array()?
        .first()?
        .get("id")?
        .as_str()
        .map(str::to_string)
}

// --- available_models -------------------------------------------------

fn models_nested(body: &Value) -> bool {
    lookup(body, "data.models")
        .and_then(Value::as_array)
        .map(|models| !models.is_empty())
        .unwrap_or(false)
}

fn models_nested_extract(body: &Value) -> Vec<(StateKey, String)> {
    lookup(body, "data.models")
        .and_then(first_id_of_array)
        .map(|id| vec![(StateKey::ModelId, id)])
        .unwrap_or_default()
}

fn models_data_array(body: &Value) -> bool {
    body.get("data")
        .and_then(Value::as_array)
        .map(|models| !models.is_empty())
        .unwrap_or(false)
}

fn models_data_array_extract(body: &Value) -> Vec<(StateKey, String)> {
    body.get("data")
        .and_then(first_id_of_array)
        .map(|id| vec![(StateKey::ModelId, id)])
        .unwrap_or_default()
}

fn models_flat(body: &Value) -> bool {
    body.get("models")
        .and_then(Value::as_array)
        .map(|models| !models.is_empty())
        .unwrap_or(false)
}

fn models_flat_extract(body: &Value) -> Vec<(StateKey, String)> {
    body.get("models")
        .and_then(first_id_of_array)
        .map(|id| vec![(StateKey::ModelId, id)])
        .unwrap_or_default()
}

static MODEL_SHAPES: [ShapePredicate; 3] = [
    ShapePredicate {
        name: "data.models[].id",
        matches: models_nested,
        extract: Some(models_nested_extract),
    },
    ShapePredicate {
        name: "data[].id",
        matches: models_data_array,
        extract: Some(models_data_array_extract),
    },
    ShapePredicate {
        name: "models[].id",
        matches: models_flat,
        extract: Some(models_flat_extract),
    },
];

// --- chat --------------------------------------------------------------

fn chat_answer(body: &Value) -> bool {
    lookup_str(body, "data.answer").is_some()
}

fn data_is_string(body: &Value) -> bool {
    field_is_string(body, "data")
}

fn answer_flat(body: &Value) -> bool {
    field_is_string(body, "answer")
}

fn text_flat(body: &Value) -> bool {
    field_is_string(body, "text")
}

static CHAT_SHAPES: [ShapePredicate; 4] = [
    ShapePredicate {
        name: "data.answer",
        matches: chat_answer,
        extract: None,
    },
    ShapePredicate {
        name: "data(string)",
        matches: data_is_string,
        extract: None,
    },
    ShapePredicate {
        name: "answer",
        matches: answer_flat,
        extract: None,
    },
    ShapePredicate {
        name: "text",
        matches: text_flat,
        extract: None,
    },
];

// --- embedding retrieval ------------------------------------------------

fn retrieval_data_array(body: &Value) -> bool {
    field_is_array(body, "data")
}

fn retrieval_results_nested(body: &Value) -> bool {
    lookup(body, "data.results").map(Value::is_array).unwrap_or(false)
}

fn retrieval_results_flat(body: &Value) -> bool {
    field_is_array(body, "results")
}

static RETRIEVAL_SHAPES: [ShapePredicate; 3] = [
    ShapePredicate {
        name: "data[]",
        matches: retrieval_data_array,
        extract: None,
    },
    ShapePredicate {
        name: "data.results[]",
        matches: retrieval_results_nested,
        extract: None,
    },
    ShapePredicate {
        name: "results[]",
        matches: retrieval_results_flat,
        extract: None,
    },
];

// --- assistants ---------------------------------------------------------

fn assistant_id_nested(body: &Value) -> bool {
    lookup_str(body, "data.id").is_some()
}

fn assistant_id_nested_extract(body: &Value) -> Vec<(StateKey, String)> {
    lookup_str(body, "data.id")
        .map(|id| vec![(StateKey::AssistantId, id.to_string())])
        .unwrap_or_default()
}

fn assistant_id_flat(body: &Value) -> bool {
    field_is_string(body, "id")
}

fn assistant_id_flat_extract(body: &Value) -> Vec<(StateKey, String)> {
    body.get("id")
        .and_then(Value::as_str)
        .map(|id| vec![(StateKey::AssistantId, id.to_string())])
        .unwrap_or_default()
}

fn assistant_id_named(body: &Value) -> bool {
    lookup_str(body, "data.assistantId").is_some()
}

fn assistant_id_named_extract(body: &Value) -> Vec<(StateKey, String)> {
    lookup_str(body, "data.assistantId")
        .map(|id| vec![(StateKey::AssistantId, id.to_string())])
        .unwrap_or_default()
}

static ASSISTANT_CREATE_SHAPES: [ShapePredicate; 3] = [
    ShapePredicate {
        name: "data.id",
        matches: assistant_id_nested,
        extract: Some(assistant_id_nested_extract),
    },
    ShapePredicate {
        name: "data.assistantId",
        matches: assistant_id_named,
        extract: Some(assistant_id_named_extract),
    },
    ShapePredicate {
        name: "id",
        matches: assistant_id_flat,
        extract: Some(assistant_id_flat_extract),
    },
];

fn assistants_data_array(body: &Value) -> bool {
    field_is_array(body, "data")
}

fn assistants_nested(body: &Value) -> bool {
    lookup(body, "data.assistants").map(Value::is_array).unwrap_or(false)
}

fn assistants_flat(body: &Value) -> bool {
    field_is_array(body, "assistants")
}

static ASSISTANT_LIST_SHAPES: [ShapePredicate; 3] = [
    ShapePredicate {
        name: "data[]",
        matches: assistants_data_array,
        extract: None,
    },
    ShapePredicate {
        name: "data.assistants[]",
        matches: assistants_nested,
        extract: None,
    },
    ShapePredicate {
        name: "assistants[]",
        matches: assistants_flat,
        extract: None,
    },
];

fn assistant_chat_answer(body: &Value) -> bool {
    lookup_str(body, "data.answer").is_some()
}

fn assistant_chat_extract(body: &Value) -> Vec<(StateKey, String)> {
    let mut extracted = Vec::new();
    if let Some(thread_id) = lookup_str(body, "data.threadId") {
        extracted.push((StateKey::ThreadId, thread_id.to_string()));
    }
    if let Some(run_id) = lookup_str(body, "data.runId") {
        extracted.push((StateKey::RunId, run_id.to_string()));
    }
    extracted
}

static ASSISTANT_CHAT_SHAPES: [ShapePredicate; 3] = [
    ShapePredicate {
        name: "data.answer",
        matches: assistant_chat_answer,
        extract: Some(assistant_chat_extract),
    },
    ShapePredicate {
        name: "data(string)",
        matches: data_is_string,
        extract: None,
    },
    ShapePredicate {
        name: "answer",
        matches: answer_flat,
        extract: None,
    },
];

fn success_true(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(false)
}

static ACK_SHAPES: [ShapePredicate; 2] = [
    ShapePredicate {
        name: "data(string)",
        matches: data_is_string,
        extract: None,
    },
    ShapePredicate {
        name: "success",
        matches: success_true,
        extract: None,
    },
];

fn data_is_object(body: &Value) -> bool {
    body.get("data").map(Value::is_object).unwrap_or(false)
}

static DOWNLOAD_SHAPES: [ShapePredicate; 2] = [
    ShapePredicate {
        name: "data(object)",
        matches: data_is_object,
        extract: None,
    },
    ShapePredicate {
        name: "data(string)",
        matches: data_is_string,
        extract: None,
    },
];

// --- files & tags -------------------------------------------------------

fn file_key_nested(body: &Value) -> bool {
    lookup_str(body, "data.fileKey").is_some()
}

fn file_key_nested_extract(body: &Value) -> Vec<(StateKey, String)> {
    lookup_str(body, "data.fileKey")
        .map(|key| vec![(StateKey::FileKey, key.to_string())])
        .unwrap_or_default()
}

fn file_key_flat(body: &Value) -> bool {
    field_is_string(body, "fileKey")
}

fn file_key_flat_extract(body: &Value) -> Vec<(StateKey, String)> {
    body.get("fileKey")
        .and_then(Value::as_str)
        .map(|key| vec![(StateKey::FileKey, key.to_string())])
        .unwrap_or_default()
}

fn file_key_legacy(body: &Value) -> bool {
    lookup_str(body, "data.key").is_some()
}

fn file_key_legacy_extract(body: &Value) -> Vec<(StateKey, String)> {
    lookup_str(body, "data.key")
        .map(|key| vec![(StateKey::FileKey, key.to_string())])
        .unwrap_or_default()
}

static UPLOAD_SHAPES: [ShapePredicate; 3] = [
    ShapePredicate {
        name: "data.fileKey",
        matches: file_key_nested,
        extract: Some(file_key_nested_extract),
    },
    ShapePredicate {
        name: "fileKey",
        matches: file_key_flat,
        extract: Some(file_key_flat_extract),
    },
    ShapePredicate {
        name: "data.key",
        matches: file_key_legacy,
        extract: Some(file_key_legacy_extract),
    },
];

fn files_nested(body: &Value) -> bool {
    lookup(body, "data.files").map(Value::is_array).unwrap_or(false)
}

fn files_data_array(body: &Value) -> bool {
    field_is_array(body, "data")
}

fn files_flat(body: &Value) -> bool {
    field_is_array(body, "files")
}

static FILES_QUERY_SHAPES: [ShapePredicate; 3] = [
    ShapePredicate {
        name: "data.files[]",
        matches: files_nested,
        extract: None,
    },
    ShapePredicate {
        name: "data[]",
        matches: files_data_array,
        extract: None,
    },
    ShapePredicate {
        name: "files[]",
        matches: files_flat,
        extract: None,
    },
];

fn tags_data_array(body: &Value) -> bool {
    field_is_array(body, "data")
}

fn tags_flat(body: &Value) -> bool {
    field_is_array(body, "tags")
}

static TAGS_LIST_SHAPES: [ShapePredicate; 2] = [
    ShapePredicate {
        name: "data[]",
        matches: tags_data_array,
        extract: None,
    },
    ShapePredicate {
        name: "tags[]",
        matches: tags_flat,
        extract: None,
    },
];

static TAGS_WRITE_SHAPES: [ShapePredicate; 2] = [
    ShapePredicate {
        name: "data[]",
        matches: tags_data_array,
        extract: None,
    },
    ShapePredicate {
        name: "success",
        matches: success_true,
        extract: None,
    },
];

fn set_tags_nested(body: &Value) -> bool {
    lookup(body, "data.tags").map(Value::is_array).unwrap_or(false)
}

fn set_tags_flat(body: &Value) -> bool {
    field_is_array(body, "tags")
}

static SET_TAGS_SHAPES: [ShapePredicate; 2] = [
    ShapePredicate {
        name: "data.tags[]",
        matches: set_tags_nested,
        extract: None,
    },
    ShapePredicate {
        name: "tags[]",
        matches: set_tags_flat,
        extract: None,
    },
];

// --- shared state -------------------------------------------------------

fn state_key_string(body: &Value) -> bool {
    field_is_string(body, "data")
}

fn state_key_nested(body: &Value) -> bool {
    lookup_str(body, "data.key").is_some()
}

fn state_key_flat(body: &Value) -> bool {
    field_is_string(body, "key")
}

static STATE_SHARE_SHAPES: [ShapePredicate; 3] = [
    ShapePredicate {
        name: "data(string)",
        matches: state_key_string,
        extract: None,
    },
    ShapePredicate {
        name: "data.key",
        matches: state_key_nested,
        extract: None,
    },
    ShapePredicate {
        name: "key",
        matches: state_key_flat,
        extract: None,
    },
];

static STATE_LOAD_SHAPES: [ShapePredicate; 2] = [
    ShapePredicate {
        name: "data(object)",
        matches: data_is_object,
        extract: None,
    },
    ShapePredicate {
        name: "success",
        matches: success_true,
        extract: None,
    },
];

// === Plan builders ====================================================

fn plan_list_models(_config: &RunConfig, _state: &CapturedState) -> Plan {
    Plan::Invoke { body: None }
}

/// The configured model wins over the captured one
fn selected_model(config: &RunConfig, state: &CapturedState) -> Option<String> {
    config
        .model
        .clone()
        .or_else(|| state.get(StateKey::ModelId).map(str::to_string))
}

fn plan_chat(config: &RunConfig, state: &CapturedState) -> Plan {
    let Some(model) = selected_model(config, state) else {
        return Plan::Skip {
            reason: "no model id captured or configured".to_string(),
        };
    };
    Plan::Invoke {
        body: Some(json!({
            "question": config.question,
            "options": {"model": {"id": model}},
            "dataSources": config.data_sources,
        })),
    }
}

fn plan_retrieval(config: &RunConfig, _state: &CapturedState) -> Plan {
    Plan::Invoke {
        body: Some(json!({
            "query": config.question,
            "dataSources": config.data_sources,
            "numResults": 5,
        })),
    }
}

fn plan_upload(config: &RunConfig, _state: &CapturedState) -> Plan {
    let Some(file) = config.file.clone() else {
        return Plan::Skip {
            reason: "no sample file configured".to_string(),
        };
    };
    Plan::Upload {
        file,
        metadata: json!({"tags": [], "description": "conformance upload"}),
    }
}

fn plan_query_files(_config: &RunConfig, _state: &CapturedState) -> Plan {
    Plan::Invoke {
        body: Some(json!({"tags": []})),
    }
}

fn plan_list_tags(_config: &RunConfig, _state: &CapturedState) -> Plan {
    Plan::Invoke { body: None }
}

fn plan_create_tag(_config: &RunConfig, _state: &CapturedState) -> Plan {
    Plan::Invoke {
        body: Some(json!({"tags": [HARNESS_TAG]})),
    }
}

fn plan_set_tags(config: &RunConfig, state: &CapturedState) -> Plan {
    let Some(file_key) = state.get(StateKey::FileKey) else {
        return Plan::Skip {
            reason: "no file key captured".to_string(),
        };
    };
    let tags: Vec<String> = if config.tags.is_empty() {
        vec![HARNESS_TAG.to_string()]
    } else {
        config.tags.clone()
    };
    Plan::Invoke {
        body: Some(json!({"fileKey": file_key, "tags": tags})),
    }
}

fn plan_delete_tag(_config: &RunConfig, _state: &CapturedState) -> Plan {
    Plan::Invoke {
        body: Some(json!({"tags": [HARNESS_TAG]})),
    }
}

fn plan_share_state(_config: &RunConfig, _state: &CapturedState) -> Plan {
    Plan::Invoke { body: None }
}

fn plan_load_state(config: &RunConfig, _state: &CapturedState) -> Plan {
    let Some(state_key) = config.state_key.clone() else {
        return Plan::Skip {
            reason: "no state key configured".to_string(),
        };
    };
    Plan::Invoke {
        body: Some(json!({"stateKey": state_key})),
    }
}

fn assistant_create_body(config: &RunConfig, state: &CapturedState, name: &str) -> Value {
    let mut body = json!({
        "name": name,
        "description": "created by the conformance harness",
    });
    if let Some(model) = selected_model(config, state) {
        body["model"] = json!({"id": model});
    }
    body
}

fn plan_create_assistant(config: &RunConfig, state: &CapturedState) -> Plan {
    Plan::Invoke {
        body: Some(assistant_create_body(config, state, "conformance probe")),
    }
}

fn plan_create_code_assistant(config: &RunConfig, state: &CapturedState) -> Plan {
    Plan::Invoke {
        body: Some(assistant_create_body(
            config,
            state,
            "conformance probe (code)",
        )),
    }
}

fn plan_list_assistants(_config: &RunConfig, _state: &CapturedState) -> Plan {
    Plan::Invoke { body: None }
}

fn plan_assistant_chat(config: &RunConfig, state: &CapturedState) -> Plan {
    let Some(assistant_id) = state.get(StateKey::AssistantId) else {
        return Plan::Skip {
            reason: "no assistant id captured".to_string(),
        };
    };
    let mut body = json!({
        "assistantId": assistant_id,
        "question": config.question,
    });
    if let Some(thread_id) = state.get(StateKey::ThreadId) {
        body["threadId"] = json!(thread_id);
    }
    Plan::Invoke { body: Some(body) }
}

fn plan_download_run_file(_config: &RunConfig, state: &CapturedState) -> Plan {
    let (Some(thread_id), Some(run_id)) =
        (state.get(StateKey::ThreadId), state.get(StateKey::RunId))
    else {
        return Plan::Skip {
            reason: "no code-interpreter run captured".to_string(),
        };
    };
    Plan::Invoke {
        body: Some(json!({
            "threadId": thread_id,
            "runId": run_id,
            "fileName": "output.csv",
        })),
    }
}

fn plan_share_assistant(config: &RunConfig, state: &CapturedState) -> Plan {
    let Some(share_with) = config.share_with.clone() else {
        return Plan::Skip {
            reason: "no share target configured".to_string(),
        };
    };
    let Some(assistant_id) = state.get(StateKey::AssistantId) else {
        return Plan::Skip {
            reason: "no assistant id captured".to_string(),
        };
    };
    Plan::Invoke {
        body: Some(json!({"assistantId": assistant_id, "email": share_with})),
    }
}

fn plan_delete_assistant(_config: &RunConfig, state: &CapturedState) -> Plan {
    let Some(assistant_id) = state.get(StateKey::AssistantId) else {
        return Plan::Skip {
            reason: "no assistant id captured".to_string(),
        };
    };
    Plan::Invoke {
        body: Some(json!({"assistantId": assistant_id})),
    }
}

fn plan_delete_openai_assistant(_config: &RunConfig, state: &CapturedState) -> Plan {
    let Some(assistant_id) = state.get(StateKey::AssistantId) else {
        return Plan::Skip {
            reason: "no assistant id captured".to_string(),
        };
    };
    Plan::Invoke {
        body: Some(json!({"assistantId": assistant_id})),
    }
}

fn plan_delete_openai_thread(_config: &RunConfig, state: &CapturedState) -> Plan {
    let Some(thread_id) = state.get(StateKey::ThreadId) else {
        return Plan::Skip {
            reason: "no thread id captured".to_string(),
        };
    };
    Plan::Invoke {
        body: Some(json!({"threadId": thread_id})),
    }
}

// === Step tables ======================================================

pub static SMOKE: &[StepSpec] = &[
    StepSpec {
        name: "list-models",
        endpoint: Endpoint::AvailableModels,
        destructive: false,
        plan: plan_list_models,
        shapes: &MODEL_SHAPES,
    },
    StepSpec {
        name: "chat",
        endpoint: Endpoint::Chat,
        destructive: false,
        plan: plan_chat,
        shapes: &CHAT_SHAPES,
    },
];

pub static EMBED: &[StepSpec] = &[StepSpec {
    name: "embedding-retrieval",
    endpoint: Endpoint::EmbeddingDualRetrieval,
    destructive: false,
    plan: plan_retrieval,
    shapes: &RETRIEVAL_SHAPES,
}];

pub static FILES: &[StepSpec] = &[
    StepSpec {
        name: "upload-file",
        endpoint: Endpoint::FilesUpload,
        destructive: false,
        plan: plan_upload,
        shapes: &UPLOAD_SHAPES,
    },
    StepSpec {
        name: "query-files",
        endpoint: Endpoint::FilesQuery,
        destructive: false,
        plan: plan_query_files,
        shapes: &FILES_QUERY_SHAPES,
    },
    StepSpec {
        name: "list-tags",
        endpoint: Endpoint::TagsList,
        destructive: false,
        plan: plan_list_tags,
        shapes: &TAGS_LIST_SHAPES,
    },
    StepSpec {
        name: "create-tag",
        endpoint: Endpoint::TagsCreate,
        destructive: false,
        plan: plan_create_tag,
        shapes: &TAGS_WRITE_SHAPES,
    },
    StepSpec {
        name: "set-tags",
        endpoint: Endpoint::SetTags,
        destructive: false,
        plan: plan_set_tags,
        shapes: &SET_TAGS_SHAPES,
    },
    StepSpec {
        name: "delete-tag",
        endpoint: Endpoint::TagsDelete,
        destructive: false,
        plan: plan_delete_tag,
        shapes: &TAGS_WRITE_SHAPES,
    },
];

pub static STATE: &[StepSpec] = &[
    StepSpec {
        name: "share-state",
        endpoint: Endpoint::StateShare,
        destructive: false,
        plan: plan_share_state,
        shapes: &STATE_SHARE_SHAPES,
    },
    StepSpec {
        name: "load-shared-state",
        endpoint: Endpoint::StateShareLoad,
        destructive: false,
        plan: plan_load_state,
        shapes: &STATE_LOAD_SHAPES,
    },
];

pub static ASSISTANTS: &[StepSpec] = &[
    StepSpec {
        name: "create-assistant",
        endpoint: Endpoint::AssistantCreate,
        destructive: false,
        plan: plan_create_assistant,
        shapes: &ASSISTANT_CREATE_SHAPES,
    },
    StepSpec {
        name: "create-code-assistant",
        endpoint: Endpoint::AssistantCreateCodeInterpreter,
        destructive: false,
        plan: plan_create_code_assistant,
        shapes: &ASSISTANT_CREATE_SHAPES,
    },
    StepSpec {
        name: "list-assistants",
        endpoint: Endpoint::AssistantList,
        destructive: false,
        plan: plan_list_assistants,
        shapes: &ASSISTANT_LIST_SHAPES,
    },
    StepSpec {
        name: "assistant-chat",
        endpoint: Endpoint::AssistantChatCodeInterpreter,
        destructive: false,
        plan: plan_assistant_chat,
        shapes: &ASSISTANT_CHAT_SHAPES,
    },
    StepSpec {
        name: "download-run-file",
        endpoint: Endpoint::AssistantFilesDownload,
        destructive: false,
        plan: plan_download_run_file,
        shapes: &DOWNLOAD_SHAPES,
    },
    StepSpec {
        name: "share-assistant",
        endpoint: Endpoint::AssistantShare,
        destructive: false,
        plan: plan_share_assistant,
        shapes: &ACK_SHAPES,
    },
    StepSpec {
        name: "delete-assistant",
        endpoint: Endpoint::AssistantDelete,
        destructive: true,
        plan: plan_delete_assistant,
        shapes: &ACK_SHAPES,
    },
    StepSpec {
        name: "delete-openai-assistant",
        endpoint: Endpoint::OpenAiAssistantDelete,
        destructive: true,
        plan: plan_delete_openai_assistant,
        shapes: &ACK_SHAPES,
    },
    StepSpec {
        name: "delete-openai-thread",
        endpoint: Endpoint::OpenAiThreadDelete,
        destructive: true,
        plan: plan_delete_openai_thread,
        shapes: &ACK_SHAPES,
    },
];

/// Step shapes registered for an endpoint, across all groups
///
/// Used to hold the invariant that every mock body validates.
pub fn shapes_for(endpoint: Endpoint) -> Option<&'static [ShapePredicate]> {
    [SMOKE, EMBED, FILES, STATE, ASSISTANTS]
        .iter()
        .flat_map(|group| group.iter())
        .find(|step| step.endpoint == endpoint)
        .map(|step| step.shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockResponder;
    use crate::scenario::ScenarioGroup;
    use crate::shapes::{validate, Validation};
    use std::time::Duration;

    fn test_config() -> RunConfig {
        RunConfig {
            token: "tok".to_string(),
            base_url: "https://gateway.example.com/api/v1".to_string(),
            timeout: Duration::from_secs(5),
            scenario: ScenarioGroup::All,
            destructive: false,
            dry_run: true,
            output_dir: std::env::temp_dir().join("conform-steps-test"),
            model: None,
            data_sources: Vec::new(),
            file: Some(std::path::PathBuf::from("sample.csv")),
            question: "What is the capital of France?".to_string(),
            share_with: None,
            state_key: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_every_mock_body_matches_a_shape() {
        // Every endpoint a step exercises must have a mock body that its
        // own shape list accepts, otherwise dry-run could never pass.
        let request = serde_json::json!({"tags": ["a", "b"]});
        for endpoint in crate::endpoints::Endpoint::ALL {
            let Some(shapes) = shapes_for(endpoint) else {
                panic!("no step registered for {:?}", endpoint);
            };
            let body = MockResponder::synthesize(endpoint, &request);
            match validate(&body, shapes) {
                Validation::Matched { .. } => {}
                other => panic!("mock for {:?} failed validation: {:?}", endpoint, other),
            }
        }
    }

    #[test]
    fn test_chat_skips_without_model() {
        let config = test_config();
        let state = CapturedState::default();
        assert!(matches!(
            plan_chat(&config, &state),
            Plan::Skip { .. }
        ));
    }

    #[test]
    fn test_chat_threads_captured_model_id() {
        let config = test_config();
        let mut state = CapturedState::default();
        state.set(StateKey::ModelId, "gpt-4o-mini".to_string());

        match plan_chat(&config, &state) {
            Plan::Invoke { body: Some(body) } => {
                assert_eq!(body["options"]["model"]["id"], "gpt-4o-mini");
            }
            other => panic!("expected Invoke, got {:?}", other),
        }
    }

    #[test]
    fn test_chat_prefers_configured_model() {
        let mut config = test_config();
        config.model = Some("gpt-4o".to_string());
        let mut state = CapturedState::default();
        state.set(StateKey::ModelId, "gpt-4o-mini".to_string());

        match plan_chat(&config, &state) {
            Plan::Invoke { body: Some(body) } => {
                assert_eq!(body["options"]["model"]["id"], "gpt-4o");
            }
            other => panic!("expected Invoke, got {:?}", other),
        }
    }

    #[test]
    fn test_model_capture_from_nested_shape() {
        let body = serde_json::json!({"data": {"models": [{"id": "gpt-4o-mini"}]}});
        match validate(&body, &MODEL_SHAPES) {
            Validation::Matched { shape, extracted } => {
                assert_eq!(shape, "data.models[].id");
                assert_eq!(
                    extracted,
                    vec![(StateKey::ModelId, "gpt-4o-mini".to_string())]
                );
            }
            other => panic!("expected Matched, got {:?}", other),
        }
    }

    #[test]
    fn test_upload_skips_without_file() {
        let mut config = test_config();
        config.file = None;
        assert!(matches!(
            plan_upload(&config, &CapturedState::default()),
            Plan::Skip { .. }
        ));
    }

    #[test]
    fn test_set_tags_requires_file_key() {
        let config = test_config();
        assert!(matches!(
            plan_set_tags(&config, &CapturedState::default()),
            Plan::Skip { .. }
        ));

        let mut state = CapturedState::default();
        state.set(StateKey::FileKey, "files/mock/file.csv".to_string());
        match plan_set_tags(&config, &state) {
            Plan::Invoke { body: Some(body) } => {
                assert_eq!(body["fileKey"], "files/mock/file.csv");
                assert_eq!(body["tags"], serde_json::json!([HARNESS_TAG]));
            }
            other => panic!("expected Invoke, got {:?}", other),
        }
    }

    #[test]
    fn test_assistant_chat_threads_assistant_id() {
        let config = test_config();
        let mut state = CapturedState::default();
        state.set(StateKey::AssistantId, "asst_123".to_string());

        match plan_assistant_chat(&config, &state) {
            Plan::Invoke { body: Some(body) } => {
                assert_eq!(body["assistantId"], "asst_123");
                assert!(body.get("threadId").is_none());
            }
            other => panic!("expected Invoke, got {:?}", other),
        }
    }

    #[test]
    fn test_assistant_chat_extracts_thread_and_run() {
        let body = serde_json::json!({
            "data": {"answer": "ok", "threadId": "t1", "runId": "r1"}
        });
        match validate(&body, &ASSISTANT_CHAT_SHAPES) {
            Validation::Matched { extracted, .. } => {
                assert!(extracted.contains(&(StateKey::ThreadId, "t1".to_string())));
                assert!(extracted.contains(&(StateKey::RunId, "r1".to_string())));
            }
            other => panic!("expected Matched, got {:?}", other),
        }
    }

    #[test]
    fn test_share_assistant_needs_target_before_id() {
        let config = test_config();
        let mut state = CapturedState::default();
        state.set(StateKey::AssistantId, "asst_123".to_string());
        match plan_share_assistant(&config, &state) {
            Plan::Skip { reason } => assert!(reason.contains("share target")),
            other => panic!("expected Skip, got {:?}", other),
        }
    }

    #[test]
    fn test_legacy_model_shapes_still_accepted() {
        let flat = serde_json::json!({"models": [{"id": "legacy-model"}]});
        match validate(&flat, &MODEL_SHAPES) {
            Validation::Matched { shape, extracted } => {
                assert_eq!(shape, "models[].id");
                assert_eq!(
                    extracted,
                    vec![(StateKey::ModelId, "legacy-model".to_string())]
                );
            }
            other => panic!("expected Matched, got {:?}", other),
        }
    }
}
