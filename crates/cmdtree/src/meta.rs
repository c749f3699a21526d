//! Serializable snapshot of a command tree.
//!
//! Help rendering reads the tree through this model, and it can be dumped as
//! JSON for external tooling (shell integration, docs generation).

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::flag::{Flag, FlagKind, FlagValue};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlagMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub kind: FlagKind,
    pub default: FlagValue,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl FlagMeta {
    /// Canonical name followed by aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

impl From<&Flag> for FlagMeta {
    fn from(flag: &Flag) -> Self {
        Self {
            name: flag.name().to_string(),
            aliases: flag.aliases().to_vec(),
            description: flag.description().to_string(),
            kind: flag.kind(),
            default: flag.default_value().clone(),
            hidden: flag.is_hidden(),
            env: flag.env_var().map(str::to_string),
            choices: flag.choice_list().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommandMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help_text: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<FlagMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandMeta>,
}

impl CommandMeta {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Command {
    /// Snapshot of this command and its subtree.
    pub fn meta(&self) -> CommandMeta {
        CommandMeta {
            name: self.name().to_string(),
            aliases: self.aliases().to_vec(),
            description: self.about().to_string(),
            help_text: self.help().to_string(),
            hidden: self.is_hidden(),
            flags: self.flags().iter().map(FlagMeta::from).collect(),
            commands: self.children().iter().map(Command::meta).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_serializes_as_kebab_case_json() {
        let root = Command::new("app")
            .help_text("Longer text.")
            .flag(Flag::new(["max", "M"], 100, "upper bound").env("APP_MAX"))
            .command(Command::new(["choose", "ch"]).hidden());

        let meta = root.meta();
        assert_eq!(meta.commands[0].names().collect::<Vec<_>>(), ["choose", "ch"]);

        let json: serde_json::Value = serde_json::from_str(&meta.to_json().unwrap()).unwrap();
        assert_eq!(json["help-text"], "Longer text.");
        assert_eq!(json["flags"][0]["kind"], "int");
        assert_eq!(json["flags"][0]["default"], 100);
        assert_eq!(json["flags"][0]["env"], "APP_MAX");
        assert_eq!(json["commands"][0]["hidden"], true);

        let back: CommandMeta = serde_json::from_value(json).unwrap();
        assert_eq!(back, meta);
    }
}
