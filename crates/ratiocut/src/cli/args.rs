//! Value parsers shared by the subcommands.

use ratiocut_core::{AspectRatio, AutoBalanceMode, CropRect, RgbBalance};
use std::path::PathBuf;

/// `"16:9"`, `"4x3"` or a bare ratio such as `"1.5"`.
pub fn parse_ratio(s: &str) -> Result<AspectRatio, String> {
    s.parse::<AspectRatio>().map_err(|e| e.to_string())
}

/// `"x,y,width,height"` in source pixels.
pub fn parse_crop(s: &str) -> Result<CropRect, String> {
    let parts = parse_list::<u32>(s, 4, "x,y,width,height")?;
    Ok(CropRect::new(parts[0], parts[1], parts[2], parts[3]))
}

/// `"r,g,b"`, each in -100..=100.
pub fn parse_rgb(s: &str) -> Result<RgbBalance, String> {
    let parts = parse_list::<i32>(s, 3, "r,g,b")?;
    Ok(RgbBalance::new(parts[0], parts[1], parts[2]))
}

/// `"key=value"` metadata pair.
pub fn parse_meta(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err("metadata key must not be empty".to_string());
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Auto-balance mode by name or number.
pub fn parse_mode(s: &str) -> Result<AutoBalanceMode, String> {
    s.parse()
}

/// Expand a leading `~` in a path argument.
pub fn expand_path(path: &std::path::Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).into_owned())
}

fn parse_list<T: std::str::FromStr>(s: &str, count: usize, shape: &str) -> Result<Vec<T>, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != count {
        return Err(format!("expected {shape}, got '{s}'"));
    }
    parts
        .iter()
        .map(|p| p.parse::<T>().map_err(|_| format!("invalid number '{p}' in '{s}'")))
        .collect()
}
