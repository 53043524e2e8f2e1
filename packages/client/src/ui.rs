//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(prompt: &str) {
    print!("{}", prompt);
    std::io::stdout().flush().ok();
}

/// Prompt shown while typing
pub fn prompt_for(user_id: &str) -> String {
    format!("user {}> ", user_id)
}
