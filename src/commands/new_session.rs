// New Session Commands
// Prefill and remember-selection logic for the new-session flow

use serde::Serialize;

use crate::models::{
    AgentKind, Machine, ModelMode, PermissionMode, Session, Settings, SettingsDelta,
};
use crate::services::{best_path_for_machine, pick_machine, SyncService};

/// Everything the new-session screen preselects before the user types.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSessionDefaults {
    pub agent: AgentKind,
    pub permission_mode: PermissionMode,
    pub model_mode: ModelMode,
    pub machine_id: Option<String>,
    pub machine_label: Option<String>,
    pub path: String,
}

/// Resolve the prefill from the current record: last used agent, last used
/// modes coerced within that agent's family, the most recently used machine
/// that is still known, and the best path for it.
pub fn new_session_defaults(
    sync: &SyncService,
    machines: &[Machine],
    sessions: &[Session],
) -> NewSessionDefaults {
    let settings = sync.settings();

    let agent = AgentKind::resolve(settings.last_used_agent.as_deref());
    let permission_mode =
        agent.resolve_permission_mode(settings.last_used_permission_mode.as_deref());
    let model_mode = agent.resolve_model_mode(settings.last_used_model_mode.as_deref());

    let machine = pick_machine(&settings.recent_machine_paths, machines);
    let machine_id = machine.map(|m| m.id.clone());
    let machine_label = machine.and_then(|m| m.label().map(str::to_string));
    let path = best_path_for_machine(
        machine_id.as_deref(),
        &settings.recent_machine_paths,
        machines,
        sessions,
    );

    NewSessionDefaults {
        agent,
        permission_mode,
        model_mode,
        machine_id,
        machine_label,
        path,
    }
}

/// Flip between the two families and remember the choice.
pub fn toggle_agent(sync: &SyncService) -> AgentKind {
    let current = AgentKind::resolve(sync.settings().last_used_agent.as_deref());
    let next = current.toggled();
    remember_agent(sync, next);
    next
}

pub fn remember_agent(sync: &SyncService, agent: AgentKind) -> Settings {
    sync.apply_settings(&SettingsDelta {
        last_used_agent: Some(Some(agent.as_str().to_string())),
        ..SettingsDelta::default()
    })
}

pub fn remember_permission_mode(sync: &SyncService, mode: PermissionMode) -> Settings {
    sync.apply_settings(&SettingsDelta {
        last_used_permission_mode: Some(Some(mode.as_str().to_string())),
        ..SettingsDelta::default()
    })
}

pub fn remember_model_mode(sync: &SyncService, mode: ModelMode) -> Settings {
    sync.apply_settings(&SettingsDelta {
        last_used_model_mode: Some(Some(mode.as_str().to_string())),
        ..SettingsDelta::default()
    })
}

/// Per-family configured defaults, as the agent-defaults screen shows them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefaults {
    pub permission_mode: PermissionMode,
    pub model_mode: ModelMode,
}

/// Read a family's configured defaults with stored strings coerced into
/// that family's enumerations.
pub fn agent_defaults(settings: &Settings, agent: AgentKind) -> AgentDefaults {
    let (permission_raw, model_raw) = match agent {
        AgentKind::Claude => (
            settings.claude_default_permission_mode.as_deref(),
            settings.claude_default_model_mode.as_deref(),
        ),
        AgentKind::Codex => (
            settings.codex_default_permission_mode.as_deref(),
            settings.codex_default_model_mode.as_deref(),
        ),
    };
    AgentDefaults {
        permission_mode: agent.resolve_permission_mode(permission_raw),
        model_mode: agent.resolve_model_mode(model_raw),
    }
}

/// Store a family's configured defaults.
pub fn set_agent_defaults(
    sync: &SyncService,
    agent: AgentKind,
    permission_mode: PermissionMode,
    model_mode: ModelMode,
) -> Settings {
    let permission = Some(Some(permission_mode.as_str().to_string()));
    let model = Some(Some(model_mode.as_str().to_string()));
    let delta = match agent {
        AgentKind::Claude => SettingsDelta {
            claude_default_permission_mode: permission,
            claude_default_model_mode: model,
            ..SettingsDelta::default()
        },
        AgentKind::Codex => SettingsDelta {
            codex_default_permission_mode: permission,
            codex_default_model_mode: model,
            ..SettingsDelta::default()
        },
    };
    sync.apply_settings(&delta)
}
