//! `dynamicconfig.ini`, the rates the game servers poll at runtime.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::container::rcon::{BroadcastOutcome, RconBridge};
use crate::error::Result;

pub const RELOAD_COMMAND: &str = "ForceUpdateDynamicConfig";
const HEADER: &str = "; https://ark.wiki.gg/wiki/Server_configuration#DynamicConfig\n";

pub type DynamicConfig = BTreeMap<String, String>;

pub const DESCRIPTIONS: [(&str, &str); 11] = [
    ("BabyCuddleIntervalMultiplier", "Interval between imprint cuddles. Lower is more frequent."),
    ("BabyImprintAmountMultiplier", "Imprint gained per cuddle."),
    ("BabyMatureSpeedMultiplier", "Baby growth speed. Higher grows faster."),
    ("DynamicColorset", "Dynamic colour set in use."),
    ("DynamicColorsetChanceOverride", "Chance that the dynamic colour set applies."),
    ("EggHatchSpeedMultiplier", "Egg hatch speed. Higher hatches faster."),
    ("HarvestAmountMultiplier", "Resources gained per harvest."),
    ("HexagonRewardMultiplier", "Hexagon reward multiplier."),
    ("MatingIntervalMultiplier", "Cooldown between matings. Lower is shorter."),
    ("XPMultiplier", "Experience gain multiplier."),
    ("TamingSpeedMultiplier", "Taming speed multiplier."),
];

pub fn descriptions() -> BTreeMap<&'static str, &'static str> {
    DESCRIPTIONS.into_iter().collect()
}

pub fn parse_dynamic_config(text: &str) -> DynamicConfig {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .map(|line| match line.split_once('=') {
            Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
            None => (line.to_string(), String::new()),
        })
        .collect()
}

pub fn serialize_dynamic_config(config: &DynamicConfig) -> String {
    let mut out = String::from(HEADER);
    for (key, value) in config {
        out.push_str(&format!("{}={}\n", key, value));
    }
    out
}

pub struct DynamicConfigFile {
    path: PathBuf,
}

impl DynamicConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read(&self) -> Result<DynamicConfig> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(parse_dynamic_config(&text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DynamicConfig::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn write(&self, config: &DynamicConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serialize_dynamic_config(config))?;
        tracing::info!("Dynamic config written ({} keys)", config.len());
        Ok(())
    }
}

/// Ask every running server to re-read the dynamic config.
pub async fn broadcast_reload(rcon: &RconBridge, running: &[String]) -> Vec<BroadcastOutcome> {
    rcon.broadcast(running, RELOAD_COMMAND).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_keeps_equals_in_values() {
        let config = parse_dynamic_config("; header\n\nXPMultiplier = 2.5\nDynamicColorset=a=b\n");
        assert_eq!(config.len(), 2);
        assert_eq!(config["XPMultiplier"], "2.5");
        assert_eq!(config["DynamicColorset"], "a=b");
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let file = DynamicConfigFile::new(dir.path().join("web/dynamicconfig.ini"));
        assert!(file.read().unwrap().is_empty());

        let mut config = DynamicConfig::new();
        config.insert("TamingSpeedMultiplier".into(), "3".into());
        config.insert("HarvestAmountMultiplier".into(), "2".into());
        file.write(&config).unwrap();

        let text = std::fs::read_to_string(dir.path().join("web/dynamicconfig.ini")).unwrap();
        assert!(text.starts_with(';'));
        assert!(text.ends_with("HarvestAmountMultiplier=2\nTamingSpeedMultiplier=3\n"));
        assert_eq!(file.read().unwrap(), config);
    }
}
