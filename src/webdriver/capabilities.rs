use std::path::Path;

use serde_json::{Value, json};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub fn chrome_capabilities(headless: bool, user_agent: &str, profile_dir: &Path) -> Value {
    let mut args = vec![
        format!("--user-data-dir={}", profile_dir.display()),
        "--window-size=1400,1200".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--disable-blink-features=AutomationControlled".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        format!("--user-agent={user_agent}"),
    ];
    if headless {
        args.push("--headless=new".to_string());
    }

    let chrome_options = json!({
        "args": args,
        "excludeSwitches": ["enable-automation"],
        "useAutomationExtension": false
    });
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "acceptInsecureCerts": true,
                "goog:chromeOptions": chrome_options
            }
        }
    })
}
