//! Fixed system prompts for condensation and answer generation.
//!
//! Wording follows the retrieval pack's original Python prompts: direct,
//! grounded, no conversational filler.

pub const SYSTEM_PROMPT: &str = "You are a professional assistant providing accurate answers \
based on document context. Be direct and concise. Avoid conversational fillers like 'Let me \
explain', 'Okay', 'Well', or 'Sure'. Start responses immediately with the answer. Use bullet \
points for lists when appropriate.";

pub const CONDENSE_SYSTEM_PROMPT: &str = "Given a conversation and a follow-up message, rewrite \
the message as a standalone question that captures all relevant context from the conversation. \
Return only the rewritten question, nothing else.";

pub fn condense_prompt(history: &str, query: &str) -> String {
    format!("Conversation so far:\n{history}\n\nFollow-up message: {query}\n\nStandalone question:")
}

/// First 400 characters of a chunk is enough context for the contextual
/// retrieval prefix call, matching the retrieval pack's Python prompt.
pub const CONTEXTUAL_PREFIX_PREVIEW_CHARS: usize = 400;

pub fn contextual_prefix_prompt(document_name: &str, document_type: &str, chunk_preview: &str) -> String {
    format!(
        "Document: {document_name} ({document_type})\n\nChunk content:\n{chunk_preview}\n\n\
Provide a concise 1-2 sentence context for this chunk, explaining what document it's from and \
what topic it discusses.\nFormat: \"This section from [document/topic] discusses [specific \
topic/concept].\"\n\nContext (1-2 sentences only):"
    )
}

pub fn rerank_prompt(query: &str, documents: &[String]) -> String {
    let mut prompt = format!(
        "Score each of the following {} passages for relevance to the query below, on a scale \
of 0.0 (irrelevant) to 1.0 (highly relevant).\n\nQuery: {query}\n\n",
        documents.len()
    );
    for (i, doc) in documents.iter().enumerate() {
        prompt.push_str(&format!("Passage {i}:\n{doc}\n\n"));
    }
    prompt.push_str(
        "Respond with only a JSON array of floats, one score per passage in order, e.g. \
[0.9, 0.2, 0.5]. No other text.",
    );
    prompt
}
