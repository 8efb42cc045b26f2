//
//  pampu
//  interactive/prompt.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Interactive Prompts Module
//!
//! Wraps the `dialoguer` crate for the few questions `pampu init` asks.
//!
//! # Example
//!
//! ```no_run
//! use pampu::interactive::prompt::{prompt_confirm_with_default, prompt_password};
//!
//! if prompt_confirm_with_default("Overwrite saved credentials?", false).unwrap() {
//!     let token = prompt_password("Personal Access Token").unwrap();
//!     println!("Got {} characters", token.len());
//! }
//! ```

use anyhow::Result;
use dialoguer::{Confirm, Input, Password};

/// Prompts for a line of text that must pass `validate`.
///
/// # Parameters
///
/// * `message` - The prompt text
/// * `default` - Pre-filled value, if any
/// * `validate` - Returns an error message for rejected input
pub fn prompt_input_validated<F>(message: &str, default: Option<&str>, validate: F) -> Result<String>
where
    F: Fn(&str) -> std::result::Result<(), String>,
{
    let mut input = Input::<String>::new().with_prompt(message);
    if let Some(default) = default {
        input = input.default(default.to_string());
    }
    let value = input
        .validate_with(|value: &String| validate(value.trim()))
        .interact_text()?;
    Ok(value.trim().to_string())
}

/// Prompts for a secret; input is not echoed.
pub fn prompt_password(message: &str) -> Result<String> {
    let password = Password::new().with_prompt(message).interact()?;
    Ok(password.trim().to_string())
}

/// Prompts for a yes/no answer.
pub fn prompt_confirm_with_default(message: &str, default: bool) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(default)
        .interact()?;
    Ok(confirmed)
}
