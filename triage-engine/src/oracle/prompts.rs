//! Oracle prompt templates.
//!
//! The naming prompt spells out the label format the rest of the engine
//! relies on: a bare name of at most three words, or `Uncategorized`.
//! Ticket text is cut to `LLM_TICKET_PREVIEW_BYTES_MAX` per ticket.

use crate::constants::{CATEGORY_UNCATEGORIZED_LABEL, LLM_TICKET_PREVIEW_BYTES_MAX};

/// Build the category naming prompt.
#[must_use]
pub fn suggest_name_prompt(tickets: &[&str]) -> String {
    let tickets = ticket_list(tickets.iter().copied());
    format!(
        "You are an AI that helps categorize IT incident tickets concisely.\n\
         Given the following ticket(s):\n\
         {tickets}\n\
         Respond as follows:\n\
         - If you can confidently assign a category, reply with a short, specific category name \
           (maximum 3 words, no quotes, no extra text).\n\
         - If you CANNOT confidently assign a category, reply with exactly this word: \
           {CATEGORY_UNCATEGORIZED_LABEL}\n\
         - Do NOT explain, apologize, repeat the prompt, or add any other information.\n\
         - Reply with only the category name or '{CATEGORY_UNCATEGORIZED_LABEL}', nothing else.\n\
         Examples:\n\
         Correct: Network Issue\n\
         Correct: Performance\n\
         Correct: {CATEGORY_UNCATEGORIZED_LABEL}\n\
         Incorrect: Sorry, I cannot categorize this.\n\
         Incorrect: This ticket seems to be about...\n\
         Incorrect: 'Network Issue'\n\
         Incorrect: Category: Network Issue\n\
         Now, what is the best category for these tickets?"
    )
}

/// Build the merge decision prompt.
#[must_use]
pub fn merge_decision_prompt(
    name_a: &str,
    examples_a: &[String],
    name_b: &str,
    examples_b: &[String],
) -> String {
    let examples_a = ticket_list(examples_a.iter().map(String::as_str));
    let examples_b = ticket_list(examples_b.iter().map(String::as_str));
    format!(
        "Category A: {name_a}, Tickets: {examples_a} | Category B: {name_b}, Tickets: {examples_b}. \
         Should these be merged? Respond YES or NO."
    )
}

/// Build the threshold decision prompt.
#[must_use]
pub fn adjust_threshold_prompt(threshold: f64, num_categories: usize, avg_examples: f64) -> String {
    format!(
        "Current similarity threshold: {threshold:.2}. Categories: {num_categories}, \
         Avg tickets/category: {avg_examples:.2}. Respond with INCREASE / DECREASE / KEEP."
    )
}

/// Render texts as a JSON string array, each cut to the preview limit.
fn ticket_list<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    let previews: Vec<&str> = texts.map(preview).collect();
    serde_json::to_string(&previews).unwrap_or_else(|_| "[]".to_string())
}

fn preview(text: &str) -> &str {
    if text.len() <= LLM_TICKET_PREVIEW_BYTES_MAX {
        return text;
    }
    let mut end = LLM_TICKET_PREVIEW_BYTES_MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
