//! Groq chat completion client for the wellness assistant.

use anyhow::{anyhow, Context};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::models::entry::WellnessEntry;

const GROQ_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

pub const FALLBACK_RESPONSES: [&str; 5] = [
    "I'm here to support your wellness journey! How are you feeling today?",
    "Let's work together to improve your mental and physical health. What's on your mind?",
    "I'm ready to help with tips, motivation, or just listen. What would you like to talk about?",
    "Your wellness matters to me. How can I support you today?",
    "Let's make today a great day for your health and wellbeing. What do you need help with?",
];

/// Picked when the upstream call fails; the chat endpoint never errors out.
pub fn fallback_response() -> &'static str {
    FALLBACK_RESPONSES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_RESPONSES[0])
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

pub async fn chat(
    client: &reqwest::Client,
    config: &Config,
    message: &str,
    recent_entries: &[WellnessEntry],
) -> anyhow::Result<String> {
    let response = client
        .post(GROQ_URL)
        .bearer_auth(&config.groq_api_key)
        .json(&json!({
            "messages": [
                { "role": "system", "content": system_prompt(recent_entries) },
                { "role": "user", "content": message },
            ],
            "model": config.groq_model,
            "max_tokens": 200,
            "temperature": 0.7,
        }))
        .send()
        .await
        .context("groq request failed")?
        .error_for_status()
        .context("groq returned an error status")?;

    let completion: ChatCompletion = response.json().await.context("malformed groq response")?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| anyhow!("groq response had no content"))
}

fn system_prompt(recent_entries: &[WellnessEntry]) -> String {
    let context: Vec<serde_json::Value> = recent_entries
        .iter()
        .map(|e| {
            json!({
                "date": e.entry_date,
                "steps": e.steps,
                "sleepHours": e.sleep_hours,
                "studyHours": e.study_hours,
                "stressLevel": e.stress_level,
                "mood": e.mood.as_str(),
                "exercise": e.activity.exercise,
                "waterIntake": e.diet.water_intake,
            })
        })
        .collect();

    format!(
        "You are ManasFit AI, a friendly and supportive wellness assistant for students. Your role is to:\n\n\
         1. Provide personalized wellness advice based on the user's data\n\
         2. Offer motivation and encouragement\n\
         3. Suggest activities, study tips, and wellness practices\n\
         4. Help with stress management and mental health\n\
         5. Give practical tips for better sleep, nutrition, and exercise\n\
         6. Be empathetic, non-judgmental, and supportive\n\n\
         User's recent wellness data: {}\n\n\
         Guidelines:\n\
         - Keep responses concise but helpful (2-3 sentences max)\n\
         - Use a warm, encouraging tone\n\
         - Provide actionable advice\n\
         - If user seems stressed or down, offer emotional support\n\
         - Suggest specific activities or techniques\n\
         - Reference their data when relevant\n\
         - Always end with a positive note or encouragement",
        serde_json::to_string(&context).unwrap_or_else(|_| "[]".into())
    )
}
