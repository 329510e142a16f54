pub mod ui;

use crate::stash::Stash;
use anyhow::Result;
use chrono::DateTime;
use comfy_table::Cell;
use serde_json::Value;
use std::time::Duration;

fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

pub fn set(stash: &Stash, key: &str, value: &str, ttl_ms: Option<u64>) -> Result<()> {
    // Accept any JSON literal; bare text becomes a JSON string
    let value: Value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    let ttl = ttl_ms.map(Duration::from_millis);
    if !stash.set(key, &value, ttl) {
        anyhow::bail!("failed to store '{key}'");
    }
    Ok(())
}

pub fn get(stash: &Stash, key: &str) -> Result<()> {
    match stash.get::<Value>(key) {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("{}", ui::style_text("(no value)", ui::StyleType::Subtle)),
    }
    Ok(())
}

pub fn remove(stash: &Stash, key: &str) -> Result<()> {
    if !stash.remove(key) {
        anyhow::bail!("failed to remove '{key}'");
    }
    Ok(())
}

pub fn keys(stash: &Stash) -> Result<()> {
    let keys = stash.keys();
    if keys.is_empty() {
        println!("{}", ui::style_text("(no entries)", ui::StyleType::Subtle));
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Key"),
        ui::header_cell("Created"),
        ui::header_cell("Expires"),
        ui::header_cell("Size"),
    ]);
    for key in keys {
        // A key can expire between enumeration and inspection; skip it then
        if let Some(info) = stash.info(&key) {
            table.add_row(vec![
                Cell::new(&key),
                Cell::new(format_timestamp(info.created_at)),
                ui::format_optional_cell(info.expires_at, format_timestamp),
                Cell::new(info.size.to_string()),
            ]);
        }
    }
    println!("{table}");
    Ok(())
}

pub fn info(stash: &Stash, key: &str) -> Result<()> {
    let Some(info) = stash.info(key) else {
        println!("{}", ui::style_text("(no entry)", ui::StyleType::Subtle));
        return Ok(());
    };

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Key"),
        ui::header_cell("Created"),
        ui::header_cell("Expires"),
        ui::header_cell("Size"),
    ]);
    table.add_row(vec![
        Cell::new(key),
        Cell::new(format_timestamp(info.created_at)),
        ui::format_optional_cell(info.expires_at, format_timestamp),
        Cell::new(info.size.to_string()),
    ]);
    println!("{table}");
    Ok(())
}

pub fn size(stash: &Stash) -> Result<()> {
    println!("{} bytes", stash.size());
    Ok(())
}

pub fn clear(stash: &Stash) -> Result<()> {
    if !stash.clear() {
        anyhow::bail!("failed to clear namespace");
    }
    println!("Namespace cleared");
    Ok(())
}

pub fn cleanup(stash: &Stash) -> Result<()> {
    let removed = stash.cleanup();
    println!("Removed {removed} expired entries");
    Ok(())
}
