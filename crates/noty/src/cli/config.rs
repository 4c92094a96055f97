//! Config command handlers

use serde_json::Value;

use noty_core::ConfigKey;

use crate::cli::CliApp;
use crate::cli::args::ConfigCommands;

pub fn handle_config_command(app: &mut CliApp, command: Option<ConfigCommands>) -> bool {
    match command {
        None | Some(ConfigCommands::Show) => show_config(app),
        Some(ConfigCommands::Path) => {
            println!("{}", app.config().path().display());
            true
        }
        Some(ConfigCommands::Get { key }) => get_setting(app, &key),
        Some(ConfigCommands::Set { key, value }) => set_setting(app, &key, &value),
        Some(ConfigCommands::Reset { key }) => reset_setting(app, &key),
    }
}

fn parse_key(key: &str) -> Option<ConfigKey> {
    match key.parse::<ConfigKey>() {
        Ok(key) => Some(key),
        Err(e) => {
            eprintln!("✗ {}", e);
            let known: Vec<&str> = ConfigKey::ALL.iter().map(|k| k.as_str()).collect();
            eprintln!("Known keys: {}", known.join(", "));
            None
        }
    }
}

/// Interpret a command-line value: JSON if it parses, a plain string otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn show_config(app: &CliApp) -> bool {
    println!("Noty Configuration");
    println!("==================");
    println!("Config file: {}", app.config().path().display());
    println!();
    for (key, value) in app.config().entries() {
        println!("{:<36} {}", key, value);
    }
    true
}

fn get_setting(app: &CliApp, key: &str) -> bool {
    let Some(key) = parse_key(key) else {
        return false;
    };
    println!("{}", app.config().get(key));
    true
}

fn set_setting(app: &mut CliApp, key: &str, raw: &str) -> bool {
    let Some(key) = parse_key(key) else {
        return false;
    };
    let before = app.store().len();
    match app.update_setting(key, parse_value(raw)) {
        Ok(true) => {
            println!("✓ {} = {}", key, app.config().get(key));
            let after = app.store().len();
            if before != after {
                println!("  {} notes now listed (was {})", after, before);
            }
            true
        }
        Ok(false) => {
            println!("= {} already {}", key, app.config().get(key));
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}

fn reset_setting(app: &mut CliApp, key: &str) -> bool {
    let Some(key) = parse_key(key) else {
        return false;
    };
    match app.reset_setting(key) {
        Ok(_) => {
            println!("✓ {} = {}", key, app.config().get(key));
            true
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            false
        }
    }
}
