//! Palette command implementation

use std::path::Path;
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::color::to_hex;
use crate::config;
use crate::palette::{get_builtin, list_builtins, slot_char, Palette};

/// Execute the palette command
pub fn run_palette(config_path: Option<&Path>, builtin: Option<&str>, list: bool, json: bool) -> ExitCode {
    if list {
        let names = list_builtins();
        if json {
            println!("{}", serde_json::to_string_pretty(&names).unwrap_or_default());
        } else {
            for name in names {
                println!("{}", name);
            }
        }
        return ExitCode::from(EXIT_SUCCESS);
    }

    let palette = match builtin {
        Some(name) => match get_builtin(name) {
            Some(palette) => palette,
            None => {
                eprintln!("Error: Unknown palette '{}'", name);
                eprintln!("Available palettes: {}", list_builtins().join(", "));
                return ExitCode::from(EXIT_INVALID_ARGS);
            }
        },
        None => match resolve_configured(config_path) {
            Ok(palette) => palette,
            Err(code) => return code,
        },
    };

    if json {
        let slots: Vec<serde_json::Value> = palette
            .opaque_entries()
            .map(|(slot, color)| {
                serde_json::json!({ "slot": slot, "char": slot_char(slot).to_string(), "hex": to_hex(color) })
            })
            .collect();
        let output = serde_json::json!({ "transparent": "0", "slots": slots });
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
    } else {
        println!("  0  transparent");
        for (slot, color) in palette.opaque_entries() {
            println!("  {}  {}", slot_char(slot), to_hex(color));
        }
    }

    ExitCode::from(EXIT_SUCCESS)
}

fn resolve_configured(config_path: Option<&Path>) -> Result<Palette, ExitCode> {
    let cfg = config::load_config(config_path).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_INVALID_ARGS)
    })?;
    cfg.resolve_palette().map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })
}
