//! Gateway endpoint catalog
//!
//! Every remote path the harness exercises, as an enum so mock dispatch
//! and step definitions key off a closed set instead of path strings.

use reqwest::Method;

/// A gateway endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    // === Models & Chat ===
    AvailableModels,
    Chat,
    EmbeddingDualRetrieval,

    // === Assistants ===
    AssistantCreate,
    AssistantCreateCodeInterpreter,
    AssistantChatCodeInterpreter,
    AssistantList,
    AssistantShare,
    AssistantDelete,
    OpenAiAssistantDelete,
    OpenAiThreadDelete,
    AssistantFilesDownload,

    // === Files & Tags ===
    FilesUpload,
    FilesQuery,
    TagsList,
    TagsCreate,
    TagsDelete,
    SetTags,

    // === Shared State ===
    StateShare,
    StateShareLoad,
}

impl Endpoint {
    /// Every variant, in catalog order
    pub const ALL: [Endpoint; 20] = [
        Endpoint::AvailableModels,
        Endpoint::Chat,
        Endpoint::EmbeddingDualRetrieval,
        Endpoint::AssistantCreate,
        Endpoint::AssistantCreateCodeInterpreter,
        Endpoint::AssistantChatCodeInterpreter,
        Endpoint::AssistantList,
        Endpoint::AssistantShare,
        Endpoint::AssistantDelete,
        Endpoint::OpenAiAssistantDelete,
        Endpoint::OpenAiThreadDelete,
        Endpoint::AssistantFilesDownload,
        Endpoint::FilesUpload,
        Endpoint::FilesQuery,
        Endpoint::TagsList,
        Endpoint::TagsCreate,
        Endpoint::TagsDelete,
        Endpoint::SetTags,
        Endpoint::StateShare,
        Endpoint::StateShareLoad,
    ];

    /// URL path relative to the base URL
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::AvailableModels => "/available_models",
            Endpoint::Chat => "/chat",
            Endpoint::EmbeddingDualRetrieval => "/embedding-dual-retrieval",
            Endpoint::AssistantCreate => "/assistant/create",
            Endpoint::AssistantCreateCodeInterpreter => "/assistant/create/codeinterpreter",
            Endpoint::AssistantChatCodeInterpreter => "/assistant/chat/codeinterpreter",
            Endpoint::AssistantList => "/assistant/list",
            Endpoint::AssistantShare => "/assistant/share",
            Endpoint::AssistantDelete => "/assistant/delete",
            Endpoint::OpenAiAssistantDelete => "/assistant/openai/delete",
            Endpoint::OpenAiThreadDelete => "/assistant/openai/thread/delete",
            Endpoint::AssistantFilesDownload => "/assistant/files/download/codeinterpreter",
            Endpoint::FilesUpload => "/files/upload",
            Endpoint::FilesQuery => "/files/query",
            Endpoint::TagsList => "/files/tags/list",
            Endpoint::TagsCreate => "/files/tags/create",
            Endpoint::TagsDelete => "/files/tags/delete",
            Endpoint::SetTags => "/files/set_tags",
            Endpoint::StateShare => "/state/share",
            Endpoint::StateShareLoad => "/state/share/load",
        }
    }

    /// HTTP method for this endpoint
    pub fn method(&self) -> Method {
        match self {
            Endpoint::AvailableModels
            | Endpoint::AssistantList
            | Endpoint::TagsList
            | Endpoint::StateShare => Method::GET,
            Endpoint::OpenAiAssistantDelete | Endpoint::OpenAiThreadDelete => Method::DELETE,
            _ => Method::POST,
        }
    }

    /// Status code the gateway returns on success
    pub fn success_status(&self) -> u16 {
        200
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_rooted_and_unique() {
        let mut seen = std::collections::HashSet::new();
        for endpoint in Endpoint::ALL {
            assert!(endpoint.path().starts_with('/'), "{:?}", endpoint);
            assert!(seen.insert(endpoint.path()), "duplicate path {:?}", endpoint);
        }
    }

    #[test]
    fn test_list_endpoints_are_get() {
        assert_eq!(Endpoint::AvailableModels.method(), Method::GET);
        assert_eq!(Endpoint::AssistantList.method(), Method::GET);
        assert_eq!(Endpoint::TagsList.method(), Method::GET);
        assert_eq!(Endpoint::StateShare.method(), Method::GET);
    }

    #[test]
    fn test_openai_deletes_use_delete_method() {
        assert_eq!(Endpoint::OpenAiAssistantDelete.method(), Method::DELETE);
        assert_eq!(Endpoint::OpenAiThreadDelete.method(), Method::DELETE);
    }
}
