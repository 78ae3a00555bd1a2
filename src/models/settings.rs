// Settings Model
// The synced, schema-tolerant settings record shared by every UI surface
//
// Settings are a flat record: one field == one setting, prefixes for
// grouping, no nesting unless a value is a single composite (like an image
// with url/width/height). The record must stay forward and backward
// compatible: older clients may be missing fields, newer clients may add
// fields, and every client only touches the fields it knows about.
// Unrecognized keys ride along in `extra` and survive every round-trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::migrations;

/// Upper bound on the recent machine/path MRU list.
pub const RECENT_MACHINE_PATHS_CAP: usize = 10;

// ============================================================================
// Default value functions
// ============================================================================

fn default_expand_todos() -> bool {
    true
}

fn default_show_line_numbers() -> bool {
    true
}

fn default_avatar_style() -> String {
    "brutalist".to_string()
}

fn default_voice_assistant_agent_id() -> String {
    // Debug builds talk to the staging voice agent
    if cfg!(debug_assertions) {
        "agent_7801k2c0r5hjfraa1kdbytpvs6yt".to_string()
    } else {
        "agent_6701k211syvvegba4kt7m68nxjmw".to_string()
    }
}

// Both Claude Code and Codex start on "default" so new sessions use the
// CLI's own permission configuration instead of any YOLO-style mode. The
// UI labels this "Use CLI settings".
fn default_cli_permission_mode() -> Option<String> {
    Some("default".to_string())
}

// ============================================================================
// Recent machine paths
// ============================================================================

/// One entry of the machine/path MRU list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentMachinePath {
    pub machine_id: String,
    pub path: String,
}

/// Record a machine/path use: drop any entry for the same machine, prepend
/// the new one, cap the list. The result is folded back into the record as
/// an ordinary field update; the list has no storage of its own.
pub fn record_machine_path(
    list: &[RecentMachinePath],
    machine_id: &str,
    path: &str,
) -> Vec<RecentMachinePath> {
    let mut updated = Vec::with_capacity(list.len() + 1);
    updated.push(RecentMachinePath {
        machine_id: machine_id.to_string(),
        path: path.to_string(),
    });
    updated.extend(
        list.iter()
            .filter(|entry| entry.machine_id != machine_id)
            .cloned(),
    );
    updated.truncate(RECENT_MACHINE_PATHS_CAP);
    updated
}

// ============================================================================
// Settings record
// ============================================================================

/// The total settings record. Every recognized field always carries a value
/// (its own or its default); unknown keys from newer clients live in
/// `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Whether to view inline tool calls
    #[serde(default)]
    pub view_inline: bool,

    /// OpenAI API key for inference
    #[serde(rename = "inferenceOpenAIKey", default)]
    pub inference_open_ai_key: Option<String>,

    /// Whether to expand todo lists
    #[serde(default = "default_expand_todos")]
    pub expand_todos: bool,

    /// Whether to show line numbers in diffs
    #[serde(default = "default_show_line_numbers")]
    pub show_line_numbers: bool,

    /// Whether to show line numbers in tool view diffs
    #[serde(default)]
    pub show_line_numbers_in_tool_views: bool,

    /// Whether to wrap long lines in diff views
    #[serde(default)]
    pub wrap_lines_in_diffs: bool,

    /// Whether to opt out of anonymous analytics
    #[serde(default)]
    pub analytics_opt_out: bool,

    /// Whether to enable experimental features
    #[serde(default)]
    pub experiments: bool,

    /// Always show context size in the agent input
    #[serde(default)]
    pub always_show_context_size: bool,

    /// Avatar display style
    #[serde(default = "default_avatar_style")]
    pub avatar_style: String,

    /// Whether to show AI provider icons in avatars
    #[serde(default)]
    pub show_flavor_icons: bool,

    /// Whether to use the compact view for active sessions
    #[serde(default)]
    pub compact_session_view: bool,

    /// Hide inactive sessions in the main list
    #[serde(default)]
    pub hide_inactive_sessions: bool,

    /// Whether the review prompt has been answered
    #[serde(default)]
    pub review_prompt_answered: bool,

    /// Whether the user liked the app when asked
    #[serde(default)]
    pub review_prompt_liked_app: Option<bool>,

    /// Preferred language for the voice assistant (None = auto-detect)
    #[serde(default)]
    pub voice_assistant_language: Option<String>,

    /// Voice assistant agent id
    #[serde(default = "default_voice_assistant_agent_id")]
    pub voice_assistant_agent_id: String,

    /// Preferred UI language (None = auto-detect from device locale)
    #[serde(default)]
    pub preferred_language: Option<String>,

    /// Last 10 machine/path combinations, most recent first
    #[serde(default)]
    pub recent_machine_paths: Vec<RecentMachinePath>,

    /// Last selected agent type for new sessions
    #[serde(default)]
    pub last_used_agent: Option<String>,

    /// Last selected permission mode for new sessions
    #[serde(default)]
    pub last_used_permission_mode: Option<String>,

    /// Last selected model mode for new sessions
    #[serde(default)]
    pub last_used_model_mode: Option<String>,

    /// Default permission mode for Claude Code sessions
    #[serde(default = "default_cli_permission_mode")]
    pub claude_default_permission_mode: Option<String>,

    /// Default model mode for Claude Code sessions
    #[serde(default)]
    pub claude_default_model_mode: Option<String>,

    /// Default permission mode for Codex sessions
    #[serde(default = "default_cli_permission_mode")]
    pub codex_default_permission_mode: Option<String>,

    /// Default model mode for Codex sessions
    #[serde(default)]
    pub codex_default_model_mode: Option<String>,

    /// Fields from newer clients, preserved verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_inline: false,
            inference_open_ai_key: None,
            expand_todos: default_expand_todos(),
            show_line_numbers: default_show_line_numbers(),
            show_line_numbers_in_tool_views: false,
            wrap_lines_in_diffs: false,
            analytics_opt_out: false,
            experiments: false,
            always_show_context_size: false,
            avatar_style: default_avatar_style(),
            show_flavor_icons: false,
            compact_session_view: false,
            hide_inactive_sessions: false,
            review_prompt_answered: false,
            review_prompt_liked_app: None,
            voice_assistant_language: None,
            voice_assistant_agent_id: default_voice_assistant_agent_id(),
            preferred_language: None,
            recent_machine_paths: Vec::new(),
            last_used_agent: None,
            last_used_permission_mode: None,
            last_used_model_mode: None,
            claude_default_permission_mode: default_cli_permission_mode(),
            claude_default_model_mode: None,
            codex_default_permission_mode: default_cli_permission_mode(),
            codex_default_model_mode: None,
            extra: Map::new(),
        }
    }
}

/// Every recognized wire key, in record order. Keys not in this list are
/// carried through `extra`.
pub(crate) const RECOGNIZED_KEYS: &[&str] = &[
    "viewInline",
    "inferenceOpenAIKey",
    "expandTodos",
    "showLineNumbers",
    "showLineNumbersInToolViews",
    "wrapLinesInDiffs",
    "analyticsOptOut",
    "experiments",
    "alwaysShowContextSize",
    "avatarStyle",
    "showFlavorIcons",
    "compactSessionView",
    "hideInactiveSessions",
    "reviewPromptAnswered",
    "reviewPromptLikedApp",
    "voiceAssistantLanguage",
    "voiceAssistantAgentId",
    "preferredLanguage",
    "recentMachinePaths",
    "lastUsedAgent",
    "lastUsedPermissionMode",
    "lastUsedModelMode",
    "claudeDefaultPermissionMode",
    "claudeDefaultModelMode",
    "codexDefaultPermissionMode",
    "codexDefaultModelMode",
];

// ============================================================================
// Tolerant field readers
// ============================================================================

// Each reader overwrites its slot only when the value has the declared
// shape; null and ill-typed values leave the default in place.

fn read_bool(value: &Value, slot: &mut bool) {
    if let Some(b) = value.as_bool() {
        *slot = b;
    }
}

fn read_string(value: &Value, slot: &mut String) {
    if let Some(s) = value.as_str() {
        *slot = s.to_string();
    }
}

fn read_nullable_string(value: &Value, slot: &mut Option<String>) {
    if let Some(s) = value.as_str() {
        *slot = Some(s.to_string());
    }
}

fn read_nullable_bool(value: &Value, slot: &mut Option<bool>) {
    if let Some(b) = value.as_bool() {
        *slot = Some(b);
    }
}

fn read_recent_paths(value: &Value, slot: &mut Vec<RecentMachinePath>) {
    // The list resolves as a unit: one malformed entry rejects the field,
    // not the record.
    if value.is_array() {
        if let Ok(list) = serde_json::from_value::<Vec<RecentMachinePath>>(value.clone()) {
            *slot = list;
        }
    }
}

impl Settings {
    /// Resolve an untrusted value into a total settings record.
    ///
    /// Non-object input yields the full default record. Object input is
    /// resolved field by field: recognized keys are taken when well-typed
    /// and fall back to their own default otherwise, unrecognized keys are
    /// carried through unchanged. Migrations run last. Never fails.
    pub fn parse(raw: &Value) -> Settings {
        let map = match raw.as_object() {
            Some(map) => map,
            None => {
                if !raw.is_null() {
                    log::warn!("Settings payload is not an object, using defaults");
                }
                return Settings::default();
            }
        };

        let mut settings = Settings::default();
        for (key, value) in map {
            match key.as_str() {
                "viewInline" => read_bool(value, &mut settings.view_inline),
                "inferenceOpenAIKey" => {
                    read_nullable_string(value, &mut settings.inference_open_ai_key)
                }
                "expandTodos" => read_bool(value, &mut settings.expand_todos),
                "showLineNumbers" => read_bool(value, &mut settings.show_line_numbers),
                "showLineNumbersInToolViews" => {
                    read_bool(value, &mut settings.show_line_numbers_in_tool_views)
                }
                "wrapLinesInDiffs" => read_bool(value, &mut settings.wrap_lines_in_diffs),
                "analyticsOptOut" => read_bool(value, &mut settings.analytics_opt_out),
                "experiments" => read_bool(value, &mut settings.experiments),
                "alwaysShowContextSize" => {
                    read_bool(value, &mut settings.always_show_context_size)
                }
                "avatarStyle" => read_string(value, &mut settings.avatar_style),
                "showFlavorIcons" => read_bool(value, &mut settings.show_flavor_icons),
                "compactSessionView" => read_bool(value, &mut settings.compact_session_view),
                "hideInactiveSessions" => {
                    read_bool(value, &mut settings.hide_inactive_sessions)
                }
                "reviewPromptAnswered" => {
                    read_bool(value, &mut settings.review_prompt_answered)
                }
                "reviewPromptLikedApp" => {
                    read_nullable_bool(value, &mut settings.review_prompt_liked_app)
                }
                "voiceAssistantLanguage" => {
                    read_nullable_string(value, &mut settings.voice_assistant_language)
                }
                "voiceAssistantAgentId" => {
                    read_string(value, &mut settings.voice_assistant_agent_id)
                }
                "preferredLanguage" => {
                    read_nullable_string(value, &mut settings.preferred_language)
                }
                "recentMachinePaths" => {
                    read_recent_paths(value, &mut settings.recent_machine_paths)
                }
                "lastUsedAgent" => read_nullable_string(value, &mut settings.last_used_agent),
                "lastUsedPermissionMode" => {
                    read_nullable_string(value, &mut settings.last_used_permission_mode)
                }
                "lastUsedModelMode" => {
                    read_nullable_string(value, &mut settings.last_used_model_mode)
                }
                "claudeDefaultPermissionMode" => {
                    read_nullable_string(value, &mut settings.claude_default_permission_mode)
                }
                "claudeDefaultModelMode" => {
                    read_nullable_string(value, &mut settings.claude_default_model_mode)
                }
                "codexDefaultPermissionMode" => {
                    read_nullable_string(value, &mut settings.codex_default_permission_mode)
                }
                "codexDefaultModelMode" => {
                    read_nullable_string(value, &mut settings.codex_default_model_mode)
                }
                other => {
                    settings.extra.insert(other.to_string(), value.clone());
                }
            }
        }

        migrations::run(&mut settings);
        settings
    }

    /// Merge a partial update into this record, producing a new record.
    ///
    /// Every field the delta carries wins outright, including explicit
    /// nulls on nullable fields. Unknown keys from the delta overwrite
    /// same-named unknown keys already on the record. No type checks, no
    /// migration: deltas come from consumers that hold type-correct
    /// values, and migration belongs to the parse boundary.
    pub fn apply(&self, delta: &SettingsDelta) -> Settings {
        let mut next = self.clone();

        if let Some(v) = delta.view_inline {
            next.view_inline = v;
        }
        if let Some(v) = &delta.inference_open_ai_key {
            next.inference_open_ai_key = v.clone();
        }
        if let Some(v) = delta.expand_todos {
            next.expand_todos = v;
        }
        if let Some(v) = delta.show_line_numbers {
            next.show_line_numbers = v;
        }
        if let Some(v) = delta.show_line_numbers_in_tool_views {
            next.show_line_numbers_in_tool_views = v;
        }
        if let Some(v) = delta.wrap_lines_in_diffs {
            next.wrap_lines_in_diffs = v;
        }
        if let Some(v) = delta.analytics_opt_out {
            next.analytics_opt_out = v;
        }
        if let Some(v) = delta.experiments {
            next.experiments = v;
        }
        if let Some(v) = delta.always_show_context_size {
            next.always_show_context_size = v;
        }
        if let Some(v) = &delta.avatar_style {
            next.avatar_style = v.clone();
        }
        if let Some(v) = delta.show_flavor_icons {
            next.show_flavor_icons = v;
        }
        if let Some(v) = delta.compact_session_view {
            next.compact_session_view = v;
        }
        if let Some(v) = delta.hide_inactive_sessions {
            next.hide_inactive_sessions = v;
        }
        if let Some(v) = delta.review_prompt_answered {
            next.review_prompt_answered = v;
        }
        if let Some(v) = delta.review_prompt_liked_app {
            next.review_prompt_liked_app = v;
        }
        if let Some(v) = &delta.voice_assistant_language {
            next.voice_assistant_language = v.clone();
        }
        if let Some(v) = &delta.voice_assistant_agent_id {
            next.voice_assistant_agent_id = v.clone();
        }
        if let Some(v) = &delta.preferred_language {
            next.preferred_language = v.clone();
        }
        if let Some(v) = &delta.recent_machine_paths {
            next.recent_machine_paths = v.clone();
        }
        if let Some(v) = &delta.last_used_agent {
            next.last_used_agent = v.clone();
        }
        if let Some(v) = &delta.last_used_permission_mode {
            next.last_used_permission_mode = v.clone();
        }
        if let Some(v) = &delta.last_used_model_mode {
            next.last_used_model_mode = v.clone();
        }
        if let Some(v) = &delta.claude_default_permission_mode {
            next.claude_default_permission_mode = v.clone();
        }
        if let Some(v) = &delta.claude_default_model_mode {
            next.claude_default_model_mode = v.clone();
        }
        if let Some(v) = &delta.codex_default_permission_mode {
            next.codex_default_permission_mode = v.clone();
        }
        if let Some(v) = &delta.codex_default_model_mode {
            next.codex_default_model_mode = v.clone();
        }

        for (key, value) in &delta.extra {
            next.extra.insert(key.clone(), value.clone());
        }

        next
    }
}

// ============================================================================
// Settings delta
// ============================================================================

/// A partial settings update. `None` means "leave the field alone"; for
/// nullable fields, `Some(None)` clears the stored value. Never serialized:
/// only the merged record crosses a process boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsDelta {
    pub view_inline: Option<bool>,
    pub inference_open_ai_key: Option<Option<String>>,
    pub expand_todos: Option<bool>,
    pub show_line_numbers: Option<bool>,
    pub show_line_numbers_in_tool_views: Option<bool>,
    pub wrap_lines_in_diffs: Option<bool>,
    pub analytics_opt_out: Option<bool>,
    pub experiments: Option<bool>,
    pub always_show_context_size: Option<bool>,
    pub avatar_style: Option<String>,
    pub show_flavor_icons: Option<bool>,
    pub compact_session_view: Option<bool>,
    pub hide_inactive_sessions: Option<bool>,
    pub review_prompt_answered: Option<bool>,
    pub review_prompt_liked_app: Option<Option<bool>>,
    pub voice_assistant_language: Option<Option<String>>,
    pub voice_assistant_agent_id: Option<String>,
    pub preferred_language: Option<Option<String>>,
    pub recent_machine_paths: Option<Vec<RecentMachinePath>>,
    pub last_used_agent: Option<Option<String>>,
    pub last_used_permission_mode: Option<Option<String>>,
    pub last_used_model_mode: Option<Option<String>>,
    pub claude_default_permission_mode: Option<Option<String>>,
    pub claude_default_model_mode: Option<Option<String>>,
    pub codex_default_permission_mode: Option<Option<String>>,
    pub codex_default_model_mode: Option<Option<String>>,
    pub extra: Map<String, Value>,
}


#[cfg(test)]
mod proptests {
    use proptest::prelude::*;
    use serde_json::{json, Value};

    use super::*;

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            "[a-zA-Z0-9 /_.-]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z]{1,16}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        // Parsing any value terminates and yields a record whose wire form
        // carries every recognized key.
        #[test]
        fn parse_is_total(raw in arb_json()) {
            let parsed = Settings::parse(&raw);
            let doc = serde_json::to_value(&parsed).unwrap();
            let map = doc.as_object().unwrap();
            for key in RECOGNIZED_KEYS {
                prop_assert!(map.contains_key(*key));
            }
        }

        // parse(serialize(parse(x))) == parse(x): resolution plus migration
        // reaches a fixpoint in one step.
        #[test]
        fn parse_is_stable(raw in arb_json()) {
            let parsed = Settings::parse(&raw);
            let reparsed = Settings::parse(&serde_json::to_value(&parsed).unwrap());
            prop_assert_eq!(parsed, reparsed);
        }

        // Unrecognized keys survive with their values unchanged.
        #[test]
        fn parse_preserves_unknown_keys(
            entries in prop::collection::btree_map("[a-z]{1,12}", arb_json(), 0..6)
        ) {
            let input = Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            );
            let parsed = Settings::parse(&input);
            for (key, value) in &entries {
                if !RECOGNIZED_KEYS.contains(&key.as_str()) {
                    prop_assert_eq!(parsed.extra.get(key), Some(value));
                }
            }
        }

        // Any sequence of uses keeps the list capped, unique by machine,
        // and most-recent-first.
        #[test]
        fn recent_paths_invariants(
            ops in prop::collection::vec(("m[0-9]{1,2}", "/[a-z]{1,8}"), 1..40)
        ) {
            let mut list = Vec::new();
            for (machine_id, path) in &ops {
                list = record_machine_path(&list, machine_id, path);
            }
            prop_assert!(list.len() <= RECENT_MACHINE_PATHS_CAP);

            let mut seen = std::collections::HashSet::new();
            for entry in &list {
                prop_assert!(seen.insert(entry.machine_id.clone()));
            }

            let (last_machine, last_path) = ops.last().unwrap();
            prop_assert_eq!(&list[0].machine_id, last_machine);
            prop_assert_eq!(&list[0].path, last_path);
        }

        // A delta field always wins; untouched fields always survive.
        #[test]
        fn apply_precedence(current_flag in any::<bool>(), delta_flag in any::<bool>()) {
            let current = Settings {
                view_inline: current_flag,
                avatar_style: "gradient".to_string(),
                ..Settings::default()
            };
            let next = current.apply(&SettingsDelta {
                view_inline: Some(delta_flag),
                ..SettingsDelta::default()
            });
            prop_assert_eq!(next.view_inline, delta_flag);
            prop_assert_eq!(next.avatar_style.as_str(), "gradient");
            prop_assert_eq!(next.expand_todos, Settings::default().expand_todos);
        }

        // The zh rewrite holds for any surrounding record shape.
        #[test]
        fn legacy_zh_tag_always_rewrites(flag in any::<bool>()) {
            let parsed = Settings::parse(&json!({
                "viewInline": flag,
                "preferredLanguage": "zh",
            }));
            prop_assert_eq!(parsed.preferred_language.as_deref(), Some("zh-Hans"));
            prop_assert_eq!(parsed.view_inline, flag);
        }
    }
}
