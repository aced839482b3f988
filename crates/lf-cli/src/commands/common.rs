//! Helpers shared by `convert` and `check`.

use crate::diagnostics::engine_error;
use crate::Result;
use clap::{Args, ValueEnum};
use lf_convert::{ConversionDriver, ConvertedSource};
use lf_core::config::{ConversionConfig, SideEffectStage, TerminalFamily, UnusedParamPolicy};
use lf_core::source_map::SourceFile;
use lf_core::span::FileId;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FamilyArg {
    ForEach,
    Collect,
    Reduce,
    Match,
}

impl From<FamilyArg> for TerminalFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::ForEach => TerminalFamily::ForEach,
            FamilyArg::Collect => TerminalFamily::Collect,
            FamilyArg::Reduce => TerminalFamily::Reduce,
            FamilyArg::Match => TerminalFamily::Match,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SideEffectArg {
    Map,
    Peek,
}

/// Flags that override the configured engine settings
#[derive(Debug, Clone, Default, Args)]
pub struct ConversionArgs {
    /// Switch off a terminal family (repeatable)
    #[arg(long = "disable", value_enum)]
    pub disable: Vec<FamilyArg>,
    /// Keep the original name of lambda parameters the body never reads
    #[arg(long)]
    pub keep_names: bool,
    /// Do not carry loop comments into the pipeline
    #[arg(long)]
    pub no_comments: bool,
    /// Leave indexed `for (int i = 0; ...)` loops alone
    #[arg(long)]
    pub no_indexed: bool,
    /// Leave iterator loops alone
    #[arg(long)]
    pub no_iterator: bool,
    /// Stage that keeps side effects before an accumulator update
    #[arg(long, value_enum)]
    pub side_effects: Option<SideEffectArg>,
}

impl ConversionArgs {
    pub fn apply(&self, mut config: ConversionConfig) -> ConversionConfig {
        for family in &self.disable {
            let features = &mut config.features;
            match TerminalFamily::from(*family) {
                TerminalFamily::ForEach => features.for_each = false,
                TerminalFamily::Collect => features.collect = false,
                TerminalFamily::Reduce => features.reduce = false,
                TerminalFamily::Match => features.matching = false,
            }
        }
        if self.keep_names {
            config.policies.unused_param = UnusedParamPolicy::KeepName;
        }
        if self.no_comments {
            config.policies.comments.preserve = false;
        }
        if self.no_indexed {
            config.features.indexed_loops = false;
        }
        if self.no_iterator {
            config.features.iterator_loops = false;
        }
        match self.side_effects {
            Some(SideEffectArg::Map) => config.policies.side_effect_stage = SideEffectStage::Map,
            Some(SideEffectArg::Peek) => config.policies.side_effect_stage = SideEffectStage::Peek,
            None => {}
        }
        config
    }
}

/// Read, parse and convert one file.
pub fn convert_path(driver: &ConversionDriver, id: FileId, path: &Path) -> Result<(SourceFile, ConvertedSource)> {
    let text = std::fs::read_to_string(path)?;
    let file = SourceFile::new(id, path, &text);
    let converted = driver.convert_file(&file).map_err(|e| engine_error(&file, e))?;
    Ok((file, converted))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = ConversionArgs {
            disable: vec![FamilyArg::Reduce, FamilyArg::Match],
            keep_names: true,
            side_effects: Some(SideEffectArg::Peek),
            ..Default::default()
        };
        let config = args.apply(ConversionConfig::default());
        assert!(!config.features.reduce);
        assert!(!config.features.matching);
        assert!(config.features.collect);
        assert_eq!(config.policies.unused_param, UnusedParamPolicy::KeepName);
        assert_eq!(config.policies.side_effect_stage, SideEffectStage::Peek);
    }
}
