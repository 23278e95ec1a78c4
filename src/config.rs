use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::feed::AnchorConfig;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigFlags {
    pub watch: bool,
    pub no_pictograms: bool,
    pub perf: bool,
    pub user: Option<String>,
    pub media_timeout_ms: Option<u64>,
    pub engage_distance: Option<f64>,
    pub disengage_distance: Option<f64>,
    pub near_bottom_distance: Option<f64>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            watch: self.watch || other.watch,
            no_pictograms: self.no_pictograms || other.no_pictograms,
            perf: self.perf || other.perf,
            user: other.user.clone().or_else(|| self.user.clone()),
            media_timeout_ms: other.media_timeout_ms.or(self.media_timeout_ms),
            engage_distance: other.engage_distance.or(self.engage_distance),
            disengage_distance: other.disengage_distance.or(self.disengage_distance),
            near_bottom_distance: other.near_bottom_distance.or(self.near_bottom_distance),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    /// Apply the anchor overrides on top of `base`.
    pub fn anchor_config(&self, base: AnchorConfig) -> AnchorConfig {
        AnchorConfig {
            engage_distance: self.engage_distance.unwrap_or(base.engage_distance),
            disengage_distance: self.disengage_distance.unwrap_or(base.disengage_distance),
            near_bottom_distance: self.near_bottom_distance.unwrap_or(base.near_bottom_distance),
            media_timeout: self
                .media_timeout_ms
                .map_or(base.media_timeout, Duration::from_millis),
            ..base
        }
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("chatpane").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("chatpane")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("chatpane").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join("chatpane").join("config");
        }
    }

    PathBuf::from(".chatpanerc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".chatpanerc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# chatpane defaults (saved with --save)".to_string());
    if flags.watch {
        lines.push("--watch".to_string());
    }
    if flags.no_pictograms {
        lines.push("--no-pictograms".to_string());
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(user) = &flags.user {
        lines.push(format!("--user {user}"));
    }
    if let Some(ms) = flags.media_timeout_ms {
        lines.push(format!("--media-timeout-ms {ms}"));
    }
    if let Some(distance) = flags.engage_distance {
        lines.push(format!("--engage-distance {distance}"));
    }
    if let Some(distance) = flags.disengage_distance {
        lines.push(format!("--disengage-distance {distance}"));
    }
    if let Some(distance) = flags.near_bottom_distance {
        lines.push(format!("--near-bottom-distance {distance}"));
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value.to_string())),
            _ => (token, None),
        };
        match name {
            "--watch" => flags.watch = true,
            "--no-pictograms" => flags.no_pictograms = true,
            "--perf" => flags.perf = true,
            "--user"
            | "--media-timeout-ms"
            | "--engage-distance"
            | "--disengage-distance"
            | "--near-bottom-distance"
            | "--render-debug-log" => {
                let value = match inline {
                    Some(value) => Some(value),
                    None => {
                        let next = tokens.get(i + 1).cloned();
                        if next.is_some() {
                            i += 1;
                        }
                        next
                    }
                };
                if let Some(value) = value {
                    apply_value(&mut flags, name, &value);
                }
            }
            _ => {}
        }
        i += 1;
    }
    flags
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--user" => flags.user = Some(value.to_string()),
        "--media-timeout-ms" => flags.media_timeout_ms = value.parse().ok(),
        "--engage-distance" => flags.engage_distance = parse_distance(value),
        "--disengage-distance" => flags.disengage_distance = parse_distance(value),
        "--near-bottom-distance" => flags.near_bottom_distance = parse_distance(value),
        "--render-debug-log" => flags.render_debug_log = Some(PathBuf::from(value)),
        _ => {}
    }
}

fn parse_distance(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
}
