//! `deskpilot config` — Configuration management commands.

use deskpilot_agent::vocabulary;
use deskpilot_config::AppConfig;

pub async fn validate() -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match AppConfig::load() {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let warnings = warnings(&config);
            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Vocabulary:      {}", config.vocabulary.name);
            println!("   Aliases:         {}", config.vocabulary.aliases.len());
            println!("   Max iterations:  {}", config.agent.max_iterations);
            println!(
                "   Dry-run display: {}x{}",
                config.display.width, config.display.height
            );
            match config.display.max_dimension {
                Some(max) => println!("   Max dimension:   {max}"),
                None => println!("   Max dimension:   native"),
            }
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

/// Problems that do not stop the config from loading but will bite at run time.
fn warnings(config: &AppConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    match vocabulary::by_name(&config.vocabulary.name) {
        None => warnings.push(format!(
            "Unknown vocabulary '{}' (expected gemini, openai or anthropic)",
            config.vocabulary.name
        )),
        Some(vocab) => {
            for (alias, target) in &config.vocabulary.aliases {
                if vocab.entry(target).is_none() {
                    warnings.push(format!(
                        "Alias '{alias}' points at '{target}', which {} does not define",
                        vocab.name
                    ));
                }
            }
        }
    }

    warnings
}

pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub async fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
