//! The conversational chat loop (4.L): condense, retrieve+rerank, compose,
//! generate, then persist the turn to chat memory. `query` is the
//! request/response variant; `query_stream` is the SSE variant used by
//! `POST /query/stream`.

use std::collections::HashMap;
use std::sync::Arc;

use docurag_llm::{CompletionOptions, LlmGateway};
use docurag_meta_data::{Document, MetaDataRepository};
use docurag_retrieval::hybrid::HybridRetriever;
use docurag_state::{ChatMemoryStore, ChatMessage, MessageRole};
use docurag_vector_store::ScoredChunk;
use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::error::{QueryError, QueryResult};
use crate::prompt;
use crate::sources::{Source, build_sources};

pub struct QueryRequest {
    pub query: String,
    pub session_id: Option<String>,
    pub is_temporary: bool,
}

#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Source>,
    pub session_id: String,
}

/// SSE event emitted by the streaming chat loop.
#[derive(Debug, Clone)]
pub enum QueryEvent {
    Token(String),
    Sources(Vec<Source>),
    Done,
    Error(String),
}

pub struct QueryEngine {
    repository: Arc<dyn MetaDataRepository>,
    retriever: Arc<HybridRetriever>,
    llm: Arc<LlmGateway>,
    memory: Arc<ChatMemoryStore>,
    storage_root: String,
}

impl QueryEngine {
    pub fn new(
        repository: Arc<dyn MetaDataRepository>,
        retriever: Arc<HybridRetriever>,
        llm: Arc<LlmGateway>,
        memory: Arc<ChatMemoryStore>,
        storage_root: String,
    ) -> Self {
        Self {
            repository,
            retriever,
            llm,
            memory,
            storage_root,
        }
    }

    pub async fn query(&self, request: QueryRequest) -> QueryResult<QueryResponse> {
        let session_id = request.session_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let history = self.load_history(&session_id, request.is_temporary);
        let history_text = render_history(&history);

        let condensed = self.llm.condense(&history_text, &request.query).await?;
        let chunks = self.retriever.retrieve(&condensed).await?;
        let documents = self.fetch_documents(&chunks).await?;
        let sources = build_sources(&chunks, &documents, &self.storage_root);

        let prompt = prompt::compose(&chunks, &history, &condensed);
        let options = CompletionOptions {
            system: Some(docurag_llm::prompts::SYSTEM_PROMPT.to_string()),
            temperature: None,
        };
        let answer = self.llm.complete(&prompt, &options).await?;

        if !request.is_temporary {
            self.persist_turn(&session_id, &request.query, &answer);
        }

        Ok(QueryResponse {
            answer,
            sources,
            session_id,
        })
    }

    /// Streaming variant: tokens flow as they're generated, then `Sources`
    /// and `Done`. The turn is only persisted once generation has run to
    /// completion — if the caller drops this stream early (client
    /// disconnect), nothing past this point ever executes, so no partial
    /// turn is written to chat memory.
    pub fn query_stream(self: Arc<Self>, request: QueryRequest) -> impl Stream<Item = QueryEvent> + Send {
        async_stream::stream! {
            let session_id = request.session_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            let history = self.load_history(&session_id, request.is_temporary);
            let history_text = render_history(&history);

            let condensed = match self.llm.condense(&history_text, &request.query).await {
                Ok(q) => q,
                Err(e) => { yield QueryEvent::Error(e.to_string()); return; }
            };
            let chunks = match self.retriever.retrieve(&condensed).await {
                Ok(c) => c,
                Err(e) => { yield QueryEvent::Error(e.to_string()); return; }
            };
            let documents = match self.fetch_documents(&chunks).await {
                Ok(d) => d,
                Err(e) => { yield QueryEvent::Error(e.to_string()); return; }
            };
            let sources = build_sources(&chunks, &documents, &self.storage_root);

            let prompt = prompt::compose(&chunks, &history, &condensed);
            let options = CompletionOptions {
                system: Some(docurag_llm::prompts::SYSTEM_PROMPT.to_string()),
                temperature: None,
            };

            let mut token_stream = self.llm.stream_complete(&prompt, &options);
            let mut answer = String::new();
            while let Some(next) = token_stream.next().await {
                match next {
                    Ok(token) => {
                        answer.push_str(&token);
                        yield QueryEvent::Token(token);
                    }
                    Err(e) => {
                        yield QueryEvent::Error(e.to_string());
                        return;
                    }
                }
            }

            yield QueryEvent::Sources(sources);
            if !request.is_temporary {
                self.persist_turn(&session_id, &request.query, &answer);
            }
            yield QueryEvent::Done;
        }
    }

    fn load_history(&self, session_id: &str, is_temporary: bool) -> Vec<ChatMessage> {
        if is_temporary {
            return Vec::new();
        }
        self.memory.get_messages(session_id)
    }

    fn persist_turn(&self, session_id: &str, query: &str, answer: &str) {
        self.memory.append(
            session_id,
            ChatMessage {
                role: MessageRole::User,
                content: query.to_string(),
            },
        );
        self.memory.append(
            session_id,
            ChatMessage {
                role: MessageRole::Assistant,
                content: answer.to_string(),
            },
        );
    }

    /// Resolve every distinct `document_id` referenced by `chunks` to its
    /// durable `Document` row, skipping any that no longer exist (a
    /// document deleted between retrieval and response assembly).
    async fn fetch_documents(&self, chunks: &[ScoredChunk]) -> QueryResult<HashMap<Uuid, Document>> {
        let mut documents = HashMap::new();
        for chunk in chunks {
            let document_id = chunk.chunk.document_id;
            if documents.contains_key(&document_id) {
                continue;
            }
            if let Some(document) = self.repository.get_document(document_id).await? {
                documents.insert(document_id, document);
            }
        }
        Ok(documents)
    }
}

fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .filter(|m| m.role != MessageRole::System)
        .map(|m| {
            let role = match m.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
            };
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use docurag_embeddings::{DefaultEmbeddingService, EmbeddingProvider};
    use docurag_llm::LlmGateway;
    use docurag_meta_data::MockMetaDataRepository;
    use docurag_retrieval::hybrid::HybridConfig;
    use docurag_retrieval::sparse::SparseIndex;
    use docurag_vector_store::MockVectorStore;
    use std::sync::Arc;

    struct FixedProvider;

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedProvider {
        async fn embed_batch(&self, texts: &[&str]) -> docurag_embeddings::EmbeddingResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
        }

        fn embedding_dimension(&self) -> usize {
            3
        }

        fn model_name(&self) -> &str {
            "fixed-test-model"
        }

        async fn ensure_ready(&self) -> docurag_embeddings::EmbeddingResult<()> {
            Ok(())
        }
    }

    fn test_engine() -> Arc<QueryEngine> {
        let repository: Arc<dyn MetaDataRepository> = Arc::new(MockMetaDataRepository::new());
        let vector_store = Arc::new(MockVectorStore::new());
        let embedder = Arc::new(DefaultEmbeddingService::with_provider(Arc::new(FixedProvider), 8));
        let sparse = Arc::new(SparseIndex::empty());
        let retriever = Arc::new(HybridRetriever::new(
            vector_store,
            embedder,
            sparse,
            None,
            HybridConfig::default(),
        ));
        let llm = Arc::new(
            LlmGateway::new(&docurag_config::LlmConfig {
                provider: "local".to_string(),
                model: "test-model".to_string(),
                base_url: Some("http://127.0.0.1:1".to_string()),
                timeout_seconds: 1,
                api_key: None,
            })
            .unwrap(),
        );
        let memory = Arc::new(ChatMemoryStore::new().unwrap());

        Arc::new(QueryEngine::new(repository, retriever, llm, memory, "/data".to_string()))
    }

    #[test]
    fn render_history_skips_system_messages() {
        let history = vec![
            ChatMessage {
                role: MessageRole::System,
                content: "be concise".to_string(),
            },
            ChatMessage {
                role: MessageRole::User,
                content: "hi".to_string(),
            },
        ];
        let rendered = render_history(&history);
        assert!(!rendered.contains("be concise"));
        assert!(rendered.contains("user: hi"));
    }

    #[tokio::test]
    async fn temporary_session_never_touches_chat_memory() {
        let engine = test_engine();
        // an unreachable LLM endpoint makes `query` fail fast; what matters
        // here is only that memory stays empty either way.
        let _ = engine
            .query(QueryRequest {
                query: "what's in the report?".to_string(),
                session_id: Some("temp-session".to_string()),
                is_temporary: true,
            })
            .await;

        assert!(engine.memory.get_messages("temp-session").is_empty());
    }

    #[tokio::test]
    async fn fetch_documents_skips_chunks_with_no_matching_document() {
        let engine = test_engine();
        let chunks = vec![ScoredChunk {
            chunk: docurag_vector_store::Chunk {
                chunk_id: "c1".to_string(),
                document_id: Uuid::new_v4(),
                chunk_index: 0,
                text: "orphan".to_string(),
                embedding: None,
                metadata: HashMap::new(),
            },
            similarity: 0.5,
        }];

        let documents = engine.fetch_documents(&chunks).await.unwrap();
        assert!(documents.is_empty());
    }
}
