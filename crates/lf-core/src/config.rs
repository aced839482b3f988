//! Conversion configuration.
//!
//! A [`ConversionConfig`] is an immutable value handed to every conversion
//! attempt. Nothing in the engine reads ambient state; the environment
//! overrides below are applied by the front end before the value is frozen.

use serde::{Deserialize, Serialize};

fn env_true(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|val| {
        let trimmed = val.trim();
        !trimmed.is_empty() && !matches!(trimmed, "0" | "false" | "FALSE" | "False")
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub features: FeatureToggles,
    pub policies: ConversionPolicies,
}

impl ConversionConfig {
    /// Apply `LOOPFOLD_KEEP_PARAM_NAMES` and `LOOPFOLD_NO_COMMENTS`.
    pub fn with_env_overrides(mut self) -> Self {
        if env_true("LOOPFOLD_KEEP_PARAM_NAMES").unwrap_or(false) {
            self.policies.unused_param = UnusedParamPolicy::KeepName;
        }
        if env_true("LOOPFOLD_NO_COMMENTS").unwrap_or(false) {
            self.policies.comments.preserve = false;
        }
        self
    }

    pub fn terminal_enabled(&self, family: TerminalFamily) -> bool {
        match family {
            TerminalFamily::ForEach => self.features.for_each,
            TerminalFamily::Collect => self.features.collect,
            TerminalFamily::Reduce => self.features.reduce,
            TerminalFamily::Match => self.features.matching,
        }
    }
}

/// Pattern families that can be switched off independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalFamily {
    ForEach,
    Collect,
    Reduce,
    Match,
}

impl TerminalFamily {
    pub const ALL: [TerminalFamily; 4] = [
        TerminalFamily::ForEach,
        TerminalFamily::Collect,
        TerminalFamily::Reduce,
        TerminalFamily::Match,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalFamily::ForEach => "for-each",
            TerminalFamily::Collect => "collect",
            TerminalFamily::Reduce => "reduce",
            TerminalFamily::Match => "match",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FeatureToggles {
    pub for_each: bool,
    pub collect: bool,
    pub reduce: bool,
    /// Covers anyMatch/noneMatch/allMatch and findFirst.
    pub matching: bool,
    pub indexed_loops: bool,
    pub iterator_loops: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            for_each: true,
            collect: true,
            reduce: true,
            matching: true,
            indexed_loops: true,
            iterator_loops: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConversionPolicies {
    pub unused_param: UnusedParamPolicy,
    pub comments: CommentPolicy,
    pub side_effect_stage: SideEffectStage,
}

/// What to call a lambda parameter its body never reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnusedParamPolicy {
    Placeholder(String),
    KeepName,
}

impl Default for UnusedParamPolicy {
    fn default() -> Self {
        UnusedParamPolicy::Placeholder("_item".to_string())
    }
}

/// Line-proximity heuristic used to attach comments to statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CommentPolicy {
    pub preserve: bool,
    /// A comment attaches to the following statement when at most this many
    /// lines separate the end of the comment from the statement.
    pub max_line_distance: u32,
}

impl Default for CommentPolicy {
    fn default() -> Self {
        Self {
            preserve: true,
            max_line_distance: 1,
        }
    }
}

/// Stage used to keep side effects that run before an accumulator update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SideEffectStage {
    /// `map(x -> { effect(x); return x; })`
    #[default]
    Map,
    /// `peek(x -> effect(x))`
    Peek,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let config = ConversionConfig::default();
        for family in TerminalFamily::ALL {
            assert!(config.terminal_enabled(family), "{}", family.as_str());
        }
        assert!(config.features.indexed_loops);
        assert!(config.features.iterator_loops);
        assert_eq!(
            config.policies.unused_param,
            UnusedParamPolicy::Placeholder("_item".into())
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ConversionConfig =
            serde_json::from_str(r#"{"features": {"reduce": false}}"#).unwrap();
        assert!(!config.features.reduce);
        assert!(config.features.collect);
        assert_eq!(config.policies.comments.max_line_distance, 1);
    }
}
