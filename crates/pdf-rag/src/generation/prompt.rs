//! Prompt templates for grounded answers

use crate::types::{AggregatedRecord, RetrievalResult, ScoredChunk};

/// Answer given when the context does not contain what was asked
pub const NOT_FOUND_ANSWER: &str = "This information is not available in the provided documents.";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block: each chunk verbatim under its source reference
    pub fn build_context(result: &RetrievalResult) -> String {
        let mut context = String::new();

        for (i, hit) in result.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n\nContent:\n{}\n\n---\n\n",
                i + 1,
                Self::format_source_ref(hit),
                hit.chunk.content
            ));
        }

        context
    }

    fn format_source_ref(hit: &ScoredChunk) -> String {
        format!("{}, {}", hit.chunk.filename, hit.chunk.page_label())
    }

    /// Render aggregated figures as `label: value` lines
    pub fn format_aggregated(record: &AggregatedRecord) -> String {
        let mut out = match &record.field {
            Some(field) => format!("Figures for \"{}\":\n", field),
            None => "Figures:\n".to_string(),
        };
        for (label, value) in &record.values {
            out.push_str(&format!("- {}: {}\n", label, value));
        }
        out
    }

    /// Build the full prompt with strict grounding
    pub fn build_rag_prompt(
        question: &str,
        result: &RetrievalResult,
        aggregated: Option<&AggregatedRecord>,
    ) -> String {
        let figures = match aggregated {
            Some(record) if !record.is_empty() => format!(
                "\nEXTRACTED FIGURES (taken from the context above):\n{}\nUse these figures when comparing categories.\n",
                Self::format_aggregated(record)
            ),
            _ => String::new(),
        };

        format!(
            r#"You are a document-grounded assistant that ONLY uses information from provided documents.

GROUNDING RULES:
1. ONLY use information that is EXPLICITLY stated in the CONTEXT below
2. If the answer is not in the context, respond with "{not_found}"
3. NEVER use external knowledge or make guesses beyond what is stated
4. Cite the source of each fact as [Source: filename, Page X]

CONTEXT FROM DOCUMENTS:
{context}{figures}
QUESTION: {question}

Answer using ONLY the document content above:"#,
            not_found = NOT_FOUND_ANSWER,
            context = Self::build_context(result),
            figures = figures,
            question = question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;
    use uuid::Uuid;

    fn hit(content: &str, page_start: u32, page_end: u32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                id: Uuid::new_v4(),
                document_id: Uuid::new_v4(),
                filename: "labor.pdf".into(),
                content: content.into(),
                page_start,
                page_end,
                char_start: 0,
                char_end: content.len(),
                chunk_index: 0,
                embedding: Vec::new(),
            },
            score: 0.9,
        }
    }

    #[test]
    fn test_context_contains_text_and_sources() {
        let result = RetrievalResult {
            hits: vec![hit("PhD: 1.2%", 3, 3), hit("Spans two pages", 1, 2)],
        };
        let context = PromptBuilder::build_context(&result);
        assert!(context.contains("[1] labor.pdf, Page 3"));
        assert!(context.contains("[2] labor.pdf, Pages 1-2"));
        assert!(context.contains("PhD: 1.2%"));
    }

    #[test]
    fn test_prompt_includes_question_and_figures() {
        let result = RetrievalResult {
            hits: vec![hit("Master's: 2.8%", 2, 2)],
        };
        let mut record = AggregatedRecord::default();
        record.values.insert("Master's".into(), 2.8);

        let prompt = PromptBuilder::build_rag_prompt("Compare rates", &result, Some(&record));
        assert!(prompt.contains("QUESTION: Compare rates"));
        assert!(prompt.contains("EXTRACTED FIGURES"));
        assert!(prompt.contains("- Master's: 2.8"));
        assert!(prompt.contains(NOT_FOUND_ANSWER));

        let prompt = PromptBuilder::build_rag_prompt(
            "Compare rates",
            &result,
            Some(&AggregatedRecord::default()),
        );
        assert!(!prompt.contains("EXTRACTED FIGURES"));
    }
}
