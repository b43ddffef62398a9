//! Canned replies for when the upstream is unreachable
//!
//! Keyword matching against the last user message, in the spirit of a
//! phrasebook rather than a model. Always returns non-empty text so the
//! browser has something to speak.

use chrono::Local;
use rand::seq::SliceRandom;

use crate::transcript::{last_user_content, ChatMessage};

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "howdy"];
const GREETING_PHRASES: &[&str] = &["good morning", "good afternoon", "good evening"];

const JOKES: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything! But seriously, atoms are fascinating - they're the building blocks of everything around us.",
    "I told my computer I needed a break, and it said 'No problem - I'll go to sleep.' Technology can be quite helpful when it comes to taking breaks, don't you think?",
    "Why was the math book sad? Because it had too many problems. But unlike math books, I'm here to help solve problems, not create them!",
    "Why did the programmer quit his job? He didn't get arrays! Programming humor aside, I'd love to help you with any questions you might have.",
    "How do you comfort a JavaScript bug? You console it! Speaking of coding, are you interested in programming or technology topics?",
];

/// Produce a canned reply for the given transcript
///
/// Never fails and never returns empty text, including for an empty
/// transcript.
#[must_use]
pub fn reply(transcript: &[ChatMessage]) -> String {
    let Some(text) = last_user_content(transcript) else {
        return "Please say or type something.".to_string();
    };

    let lowered = text.to_lowercase();

    if is_greeting(&lowered) {
        return "Hello there! I'm your voice assistant, and I'm excited to help you today. \
                Feel free to ask me questions, have a conversation, or just chat about \
                anything that interests you. What would you like to talk about?"
            .to_string();
    }

    if contains_word(&lowered, &["time", "clock"]) {
        let now = Local::now();
        return format!(
            "The current time is {} on {}. Is there anything specific you'd like to do or discuss?",
            now.format("%I:%M %p"),
            now.format("%A, %B %d, %Y"),
        );
    }

    if contains_word(&lowered, &["date", "today", "day"]) {
        return format!(
            "Today is {}. It's a great day to learn something new or have an interesting \
             conversation. What would you like to explore?",
            Local::now().format("%A, %B %d, %Y"),
        );
    }

    if lowered.contains("joke") || lowered.contains("funny") {
        return (*JOKES
            .choose(&mut rand::thread_rng())
            .unwrap_or(&JOKES[0]))
        .to_string();
    }

    if contains_word(&lowered, &["weather", "temperature"]) {
        return "I don't have access to weather information, but you can check your local \
                weather app!"
            .to_string();
    }

    if lowered.contains("help") || lowered.contains("what can you do") {
        return "I can chat with you about various topics, tell you the current time and \
                date, and share some jokes to brighten your day. While I'm currently \
                running in offline mode, I'm still here to be your friendly companion. \
                What would you like to talk about?"
            .to_string();
    }

    "That's an interesting topic! While I'm currently running in offline mode, I can \
     still chat with you. Feel free to ask me about the time, the date, or request a \
     joke to lighten the mood. What else would you like to discuss?"
        .to_string()
}

/// Word-boundary match so that e.g. "this" does not register as "hi"
fn contains_word(lowered: &str, words: &[&str]) -> bool {
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

fn is_greeting(lowered: &str) -> bool {
    contains_word(lowered, GREETING_WORDS)
        || GREETING_PHRASES.iter().any(|p| lowered.contains(p))
}
