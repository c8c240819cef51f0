//! Boilerplate stripping rules, kept as data so new phrases need no code change.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::platform::PlatformKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Skip any description block containing `text`.
    DropBlock,
    /// Stop at the first block (or text position) containing `text`; it and
    /// everything after it are discarded.
    CutAt,
    /// Remove every match of the regex `text` from the final description.
    Strip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoilerplateRule {
    pub platform: PlatformKind,
    pub rule: RuleKind,
    pub text: String,
}

/// Compiled rules for every platform.
#[derive(Debug, Clone)]
pub struct Boilerplate {
    rules: Vec<Compiled>,
}

#[derive(Debug, Clone)]
struct Compiled {
    platform: PlatformKind,
    rule: RuleKind,
    text: String,
    pattern: Option<Regex>,
}

/// Phrases known to appear on the supported career sites.
pub fn default_rules() -> Vec<BoilerplateRule> {
    let rule = |platform, rule, text: &str| BoilerplateRule {
        platform,
        rule,
        text: text.to_string(),
    };
    vec![
        rule(PlatformKind::Paylocity, RuleKind::DropBlock, "At B&A, we foster"),
        rule(PlatformKind::Paylocity, RuleKind::CutAt, "More About B&A"),
        rule(
            PlatformKind::Adp,
            RuleKind::DropBlock,
            "Information Technology Strategies, Inc.",
        ),
        rule(PlatformKind::Adp, RuleKind::CutAt, "Work With Us"),
        rule(
            PlatformKind::Adp,
            RuleKind::Strip,
            r"Information Technology Strategies, Inc\. is a government IT solutions provider.*?to work for our company\.",
        ),
    ]
}

impl Default for Boilerplate {
    fn default() -> Self {
        // Built-in patterns are known to compile.
        Self::from_rules(default_rules()).unwrap_or(Self { rules: Vec::new() })
    }
}

impl Boilerplate {
    pub fn from_rules(rules: Vec<BoilerplateRule>) -> Result<Self, ConfigError> {
        let rules = rules
            .into_iter()
            .map(|r| {
                let pattern = match r.rule {
                    RuleKind::Strip => Some(
                        RegexBuilder::new(&r.text)
                            .case_insensitive(true)
                            .dot_matches_new_line(true)
                            .build()
                            .map_err(|source| ConfigError::Pattern {
                                pattern: r.text.clone(),
                                source,
                            })?,
                    ),
                    _ => None,
                };
                Ok(Compiled {
                    platform: r.platform,
                    rule: r.rule,
                    text: r.text,
                    pattern,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(Self { rules })
    }

    /// Load a JSON array of rules from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let rules: Vec<BoilerplateRule> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: display,
                source,
            })?;
        Self::from_rules(rules)
    }

    fn for_platform(&self, platform: PlatformKind) -> impl Iterator<Item = &Compiled> {
        self.rules.iter().filter(move |r| r.platform == platform)
    }

    /// Filter description blocks in document order: drop matching blocks and
    /// stop at the first cut marker.
    pub fn clean_blocks(&self, platform: PlatformKind, blocks: Vec<String>) -> Vec<String> {
        let mut kept = Vec::with_capacity(blocks.len());
        for block in blocks {
            if self.has(platform, RuleKind::CutAt, &block) {
                break;
            }
            if self.has(platform, RuleKind::DropBlock, &block) {
                continue;
            }
            kept.push(block);
        }
        kept
    }

    /// Clean flat description text: truncate at the earliest cut marker, then
    /// apply strip patterns.
    pub fn clean_text(&self, platform: PlatformKind, text: &str) -> String {
        let cut = self
            .for_platform(platform)
            .filter(|r| r.rule == RuleKind::CutAt)
            .filter_map(|r| text.find(&r.text))
            .min()
            .unwrap_or(text.len());

        let mut cleaned = text[..cut].to_string();
        for re in self.for_platform(platform).filter_map(|r| r.pattern.as_ref()) {
            cleaned = re.replace_all(&cleaned, "").into_owned();
        }
        cleaned.trim().to_string()
    }

    fn has(&self, platform: PlatformKind, kind: RuleKind, block: &str) -> bool {
        self.for_platform(platform)
            .any(|r| r.rule == kind && block.contains(&r.text))
    }
}
