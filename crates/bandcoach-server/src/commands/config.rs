//! The `bandcoach config` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = bandcoach_providers::load_config_from(config_path.as_deref())?;
    let openai = &config.openai;

    println!("model:                  {}", config.model);
    println!("transcription_model:    {}", config.transcription_model);
    println!("transcription_language: {}", config.transcription_language);
    match config.max_tokens {
        Some(n) => println!("max_tokens:             {n}"),
        None => println!("max_tokens:             (service default)"),
    }
    println!("bind:                   {}", config.bind);
    println!();
    println!("[openai]");
    println!(
        "api_key:                {}",
        if config.has_credential() { "***" } else { "(not set)" }
    );
    println!(
        "base_url:               {}",
        openai.base_url.as_deref().unwrap_or("(default)")
    );
    if let Some(org) = &openai.org_id {
        println!("org_id:                 {org}");
    }
    println!("timeout_secs:           {}", openai.timeout_secs);
    println!();

    if config.has_credential() {
        println!("Credential configured.");
    } else {
        println!("No credential configured. Set OPENAI_API_KEY or [openai].api_key.");
    }

    Ok(())
}
