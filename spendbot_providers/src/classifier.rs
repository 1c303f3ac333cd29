use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::json;
use spendbot_core::{Intent, IntentClassifier};
use tracing::{debug, info, warn};

use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Intent classifier backed by an OpenAI-compatible chat-completions
/// endpoint with a JSON-object response format.
pub struct GroqClassifier {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClassifier {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        info!("Creating GroqClassifier");
        Self {
            client: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    fn build_request(&self, text: &str, context: Option<&serde_json::Value>) -> serde_json::Value {
        json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "temperature": 0,
            "messages": [
                { "role": "system", "content": build_system_prompt(context) },
                { "role": "user", "content": text },
            ],
        })
    }

    /// One request; returns the raw assistant content string.
    async fn try_send(&self, request: &serde_json::Value) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json::<serde_json::Value>()
            .await?;

        let content = response["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("invalid response format: missing content"))?
            .to_string();

        Ok(content)
    }
}

#[async_trait]
impl IntentClassifier for GroqClassifier {
    async fn classify(&self, text: &str, context: Option<&serde_json::Value>) -> Intent {
        let request = self.build_request(text, context);
        debug!(model = %self.model, with_context = context.is_some(), "classifying message");

        let content = match retry_with_backoff(|| self.try_send(&request), &[1, 2]).await {
            Ok(content) => content,
            Err(e) => {
                warn!("classifier request failed, treating as unknown: {e}");
                return Intent::Unknown;
            }
        };

        let cleaned = clean_json_output(&content);
        match serde_json::from_str::<Intent>(cleaned) {
            Ok(intent) => {
                debug!(action = intent.action_name(), "classified");
                intent
            }
            Err(e) => {
                warn!("classifier returned unparseable intent, treating as unknown: {e}");
                Intent::Unknown
            }
        }
    }
}

/// Strip markdown fences and anything outside the outermost JSON braces.
/// Models wrap their output in ```json fences often enough to matter.
fn clean_json_output(content: &str) -> &str {
    let trimmed = content.trim();
    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(first), Some(last)) if first < last => &trimmed[first..=last],
        _ => trimmed,
    }
}

fn build_system_prompt(context: Option<&serde_json::Value>) -> String {
    let now = Utc::now().to_rfc3339();

    let context_block = context.map_or_else(String::new, |ctx| {
        format!(
            "\nPREVIOUS CONTEXT (active session): {ctx}\n\
             INSTRUCTION: Decide whether the user input is a reply to the pending \
             question. YES -> merge it with the context. NO -> ignore the context.\n"
        )
    });

    format!(
        "You are an expense-tracking assistant. Current date (ISO): {now}.\n\
         Output a single JSON object only. NO markdown.\n\
         {context_block}\n\
         RULES:\n\
         1. add_expense needs at least an item name; amounts are numbers.\n\
         2. Updates can change amount, item name, date and location.\n\
            \"bought at Zara\" / \"change the store to Gong\" -> new_location.\n\
         3. DATE CALCULATION: resolve \"today\", \"yesterday\", \"the day before \
            yesterday\" and similar into concrete ISO timestamps relative to the \
            current date. The system rejects future dates.\n\
         4. Disambiguate bare numbers by context: a number after a date phrase is \
            a time, a number after an item is an amount.\n\
         5. When required information is missing, use action ask_for_info with a \
            short question and put what you did understand into partial_data.\n\
         \n\
         Actions: \"add_expense\", \"list_expenses\", \"delete_last_expense\", \
         \"delete_specific_expense\", \"update_expense\", \"update_last_expense\", \
         \"reset_data\", \"ask_for_info\".\n\
         \n\
         Structures:\n\
         {{ \"action\": \"add_expense\", \"expenses\": [{{ \"item\": string, \
         \"amount\": number, \"category\": string, \"location\": string, \
         \"date\": \"ISO string\" }}] }}\n\
         {{ \"action\": \"update_expense\" | \"update_last_expense\", \
         \"search_term\": \"item name\", \"new_amount\": number, \"new_item\": \
         string, \"new_date\": \"ISO string\", \"new_location\": string }}\n\
         {{ \"action\": \"delete_specific_expense\", \"search_term\": string, \
         \"delete_all\": boolean }}\n\
         {{ \"action\": \"ask_for_info\", \"question\": string, \
         \"partial_data\": object }}\n\
         \n\
         Example (location update): \"the jeans were actually from Gong\" -> \
         {{ \"action\": \"update_expense\", \"search_term\": \"jeans\", \
         \"new_location\": \"Gong\" }}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_strips_fences_and_prose() {
        let fenced = "```json\n{\"action\": \"list_expenses\"}\n```";
        assert_eq!(clean_json_output(fenced), "{\"action\": \"list_expenses\"}");

        let chatty = "Sure! Here you go: {\"action\": \"reset_data\"} Hope that helps.";
        assert_eq!(clean_json_output(chatty), "{\"action\": \"reset_data\"}");

        assert_eq!(clean_json_output("no json here"), "no json here");
    }

    #[test]
    fn cleaned_output_parses_into_intent() {
        let content = "```json\n{\"action\": \"delete_specific_expense\", \
                       \"search_term\": \"pizza\", \"delete_all\": true}\n```";
        let intent: Intent = serde_json::from_str(clean_json_output(content)).unwrap();
        assert!(matches!(
            intent,
            Intent::DeleteSpecificExpense { delete_all: true, .. }
        ));
    }

    #[test]
    fn system_prompt_embeds_context_payload() {
        let ctx = serde_json::json!({"item": "jeans"});
        let prompt = build_system_prompt(Some(&ctx));
        assert!(prompt.contains("PREVIOUS CONTEXT"));
        assert!(prompt.contains("jeans"));
        assert!(!build_system_prompt(None).contains("PREVIOUS CONTEXT"));
    }
}
