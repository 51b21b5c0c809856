//! Prompt templates.

/// System role used for streamed answers.
pub const ANSWER_SYSTEM_ROLE: &str =
    "You are a search engine. Your job is to provide users with a concise and useful response.";

/// Build the snippet corpus: every snippet followed by a newline, in ranking order.
pub fn build_corpus<'a>(snippets: impl IntoIterator<Item = &'a str>) -> String {
    let mut corpus = String::new();
    for snippet in snippets {
        corpus.push_str(snippet);
        corpus.push('\n');
    }
    corpus
}

/// User prompt for an answer grounded in the snippet corpus.
pub fn answer_prompt(corpus: &str, query: &str, language: &str) -> String {
    format!(
        "Search Results:\n{corpus}\nQuestion: {query}\n\n Guidelines for response:\n\
         - Be concise and useful\n\
         - Provide an extractive summary\n\
         - Use easy-to-understand language\n\
         - Language for response: {language}"
    )
}

/// User prompt for follow-up questions about an answer.
pub fn related_prompt(query: &str, summary: &str, task: &str) -> String {
    format!("Search query: {query}\n\n Extractive Summary: {summary}\n\nTask: \n{task}")
}
