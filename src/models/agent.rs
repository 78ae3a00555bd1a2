// Agent Model
// Agent families and their permission/model mode enumerations
//
// The settings record stores modes as free-form strings so older and newer
// clients can exchange values they do not know yet. Reads go through the
// scoped coercion below: a stored string resolves to a member of the active
// family's enumeration or to that family's default, never to an error.

use serde::{Deserialize, Serialize};

/// The agent CLI family a session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    #[default]
    Claude,
    Codex,
}

impl AgentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Claude => "claude",
            AgentKind::Codex => "codex",
        }
    }

    pub fn parse(raw: &str) -> Option<AgentKind> {
        match raw {
            "claude" => Some(AgentKind::Claude),
            "codex" => Some(AgentKind::Codex),
            _ => None,
        }
    }

    /// Resolve a stored agent string, falling back to Claude.
    pub fn resolve(raw: Option<&str>) -> AgentKind {
        raw.and_then(AgentKind::parse).unwrap_or_default()
    }

    /// The other family, for the agent toggle in the new-session flow.
    pub fn toggled(self) -> AgentKind {
        match self {
            AgentKind::Claude => AgentKind::Codex,
            AgentKind::Codex => AgentKind::Claude,
        }
    }
}

/// Permission modes across both families. Which subset applies depends on
/// the active agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionMode {
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "acceptEdits")]
    AcceptEdits,
    #[serde(rename = "plan")]
    Plan,
    #[serde(rename = "bypassPermissions")]
    BypassPermissions,
    #[serde(rename = "read-only")]
    ReadOnly,
    #[serde(rename = "safe-yolo")]
    SafeYolo,
    #[serde(rename = "yolo")]
    Yolo,
}

impl PermissionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::Plan => "plan",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::ReadOnly => "read-only",
            PermissionMode::SafeYolo => "safe-yolo",
            PermissionMode::Yolo => "yolo",
        }
    }

    pub fn parse(raw: &str) -> Option<PermissionMode> {
        match raw {
            "default" => Some(PermissionMode::Default),
            "acceptEdits" => Some(PermissionMode::AcceptEdits),
            "plan" => Some(PermissionMode::Plan),
            "bypassPermissions" => Some(PermissionMode::BypassPermissions),
            "read-only" => Some(PermissionMode::ReadOnly),
            "safe-yolo" => Some(PermissionMode::SafeYolo),
            "yolo" => Some(PermissionMode::Yolo),
            _ => None,
        }
    }
}

/// Model modes across both families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelMode {
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "adaptiveUsage")]
    AdaptiveUsage,
    #[serde(rename = "sonnet")]
    Sonnet,
    #[serde(rename = "opus")]
    Opus,
    #[serde(rename = "gpt-5-codex-high")]
    Gpt5CodexHigh,
    #[serde(rename = "gpt-5-codex-medium")]
    Gpt5CodexMedium,
    #[serde(rename = "gpt-5-codex-low")]
    Gpt5CodexLow,
    #[serde(rename = "gpt-5-minimal")]
    Gpt5Minimal,
    #[serde(rename = "gpt-5-low")]
    Gpt5Low,
    #[serde(rename = "gpt-5-medium")]
    Gpt5Medium,
    #[serde(rename = "gpt-5-high")]
    Gpt5High,
}

impl ModelMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelMode::Default => "default",
            ModelMode::AdaptiveUsage => "adaptiveUsage",
            ModelMode::Sonnet => "sonnet",
            ModelMode::Opus => "opus",
            ModelMode::Gpt5CodexHigh => "gpt-5-codex-high",
            ModelMode::Gpt5CodexMedium => "gpt-5-codex-medium",
            ModelMode::Gpt5CodexLow => "gpt-5-codex-low",
            ModelMode::Gpt5Minimal => "gpt-5-minimal",
            ModelMode::Gpt5Low => "gpt-5-low",
            ModelMode::Gpt5Medium => "gpt-5-medium",
            ModelMode::Gpt5High => "gpt-5-high",
        }
    }

    pub fn parse(raw: &str) -> Option<ModelMode> {
        match raw {
            "default" => Some(ModelMode::Default),
            "adaptiveUsage" => Some(ModelMode::AdaptiveUsage),
            "sonnet" => Some(ModelMode::Sonnet),
            "opus" => Some(ModelMode::Opus),
            "gpt-5-codex-high" => Some(ModelMode::Gpt5CodexHigh),
            "gpt-5-codex-medium" => Some(ModelMode::Gpt5CodexMedium),
            "gpt-5-codex-low" => Some(ModelMode::Gpt5CodexLow),
            "gpt-5-minimal" => Some(ModelMode::Gpt5Minimal),
            "gpt-5-low" => Some(ModelMode::Gpt5Low),
            "gpt-5-medium" => Some(ModelMode::Gpt5Medium),
            "gpt-5-high" => Some(ModelMode::Gpt5High),
            _ => None,
        }
    }
}

const CLAUDE_PERMISSION_MODES: &[PermissionMode] = &[
    PermissionMode::Default,
    PermissionMode::AcceptEdits,
    PermissionMode::Plan,
    PermissionMode::BypassPermissions,
];

const CODEX_PERMISSION_MODES: &[PermissionMode] = &[
    PermissionMode::Default,
    PermissionMode::ReadOnly,
    PermissionMode::SafeYolo,
    PermissionMode::Yolo,
];

const CLAUDE_MODEL_MODES: &[ModelMode] = &[
    ModelMode::Default,
    ModelMode::AdaptiveUsage,
    ModelMode::Sonnet,
    ModelMode::Opus,
];

const CODEX_MODEL_MODES: &[ModelMode] = &[
    ModelMode::Gpt5CodexHigh,
    ModelMode::Gpt5CodexMedium,
    ModelMode::Gpt5CodexLow,
    ModelMode::Default,
    ModelMode::Gpt5Minimal,
    ModelMode::Gpt5Low,
    ModelMode::Gpt5Medium,
    ModelMode::Gpt5High,
];

/// Membership-checked coercion: a raw stored string resolves to a member of
/// the scope's enumeration, or to the scope's fallback.
fn coerce<M: Copy + PartialEq>(
    raw: Option<&str>,
    parse: fn(&str) -> Option<M>,
    allowed: &[M],
    fallback: M,
) -> M {
    raw.and_then(parse)
        .filter(|mode| allowed.contains(mode))
        .unwrap_or(fallback)
}

impl AgentKind {
    /// Permission modes this family supports, in display order.
    pub fn permission_modes(self) -> &'static [PermissionMode] {
        match self {
            AgentKind::Claude => CLAUDE_PERMISSION_MODES,
            AgentKind::Codex => CODEX_PERMISSION_MODES,
        }
    }

    /// Model modes this family supports, in display order.
    pub fn model_modes(self) -> &'static [ModelMode] {
        match self {
            AgentKind::Claude => CLAUDE_MODEL_MODES,
            AgentKind::Codex => CODEX_MODEL_MODES,
        }
    }

    pub fn default_permission_mode(self) -> PermissionMode {
        PermissionMode::Default
    }

    pub fn default_model_mode(self) -> ModelMode {
        match self {
            AgentKind::Claude => ModelMode::Default,
            AgentKind::Codex => ModelMode::Gpt5CodexHigh,
        }
    }

    /// Resolve a stored permission mode string within this family.
    pub fn resolve_permission_mode(self, raw: Option<&str>) -> PermissionMode {
        coerce(
            raw,
            PermissionMode::parse,
            self.permission_modes(),
            self.default_permission_mode(),
        )
    }

    /// Resolve a stored model mode string within this family.
    pub fn resolve_model_mode(self, raw: Option<&str>) -> ModelMode {
        coerce(
            raw,
            ModelMode::parse,
            self.model_modes(),
            self.default_model_mode(),
        )
    }
}
