//! Test fixtures and factory functions for creating test data.

use serde_json::json;

/// Generate one card element of the upload XML.
pub fn card_xml(body: &str, translations: &str, example: &str) -> String {
    format!(
        "<card><word>{}</word><translations><word>{}</word></translations><example>{}</example></card>",
        body, translations, example
    )
}

/// Generate dictionary upload XML with a specified number of numbered cards.
///
/// # Arguments
/// * `title` - Optional title attribute of the root element
/// * `num_cards` - Number of cards to generate
pub fn dictionary_xml(title: Option<&str>, num_cards: usize) -> String {
    let cards: String = (1..=num_cards)
        .map(|i| card_xml(&format!("word{}", i), &format!("перевод{}", i), ""))
        .collect();
    dictionary_xml_with_cards(title, &cards)
}

/// Wrap prebuilt card elements in a dictionary root element.
pub fn dictionary_xml_with_cards(title: Option<&str>, cards: &str) -> String {
    match title {
        Some(t) => format!("<dictionary title=\"{}\">{}</dictionary>", t, cards),
        None => format!("<dictionary>{}</dictionary>", cards),
    }
}

/// Create a user register request body.
pub fn register_request(username: &str) -> serde_json::Value {
    json!({ "username": username })
}

/// Create a dictionary upload request body.
pub fn upload_request(filename: &str, content: &str) -> serde_json::Value {
    json!({
        "filename": filename,
        "content": content
    })
}

/// Create a lesson start request body.
pub fn start_lesson_request(dictionary_id: i64) -> serde_json::Value {
    json!({ "dictionary_id": dictionary_id })
}

/// Create an answer submission request body.
pub fn answer_request(answer: &str, direction: &str) -> serde_json::Value {
    json!({
        "answer": answer,
        "direction": direction
    })
}

/// Create a card status change request body.
pub fn set_status_request(status: &str) -> serde_json::Value {
    json!({ "status": status })
}

/// Create a required answers change request body.
pub fn required_answers_request(required_answers: i32) -> serde_json::Value {
    json!({ "required_answers": required_answers })
}
