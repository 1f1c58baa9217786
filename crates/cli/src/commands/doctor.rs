//! `admuse doctor` — Diagnose configuration health.

use admuse_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 AdMuse Doctor — Configuration Diagnostics");
    println!("============================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ⚠️  No config file at {} — using defaults", config_path.display());
    }

    match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid (model: {})", config.model);

            if config.has_api_key() {
                println!("  ✅ Anthropic API key configured");
            } else {
                println!("  ❌ No Anthropic API key — set ANTHROPIC_API_KEY or add api_key to config.toml");
                issues += 1;
            }

            if config.fal_key.is_some() {
                println!("  ✅ Fal key configured (image/video generation enabled)");
            } else {
                println!("  ⚠️  No FAL_KEY — generate_image and generate_video will return errors");
                issues += 1;
            }
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
