// Settings Migrations
// Ordered, idempotent value rewrites applied at the end of Settings::parse
//
// There is no schema version number: each rule carries its own precondition
// and decides for itself whether it still has work to do, so running the
// list over already-migrated data is a no-op. Ordering only matters if two
// rules could match the same raw value; keep new rules additive and
// self-guarded.

use super::settings::Settings;

struct Migration {
    name: &'static str,
    apply: fn(&mut Settings) -> bool,
}

const MIGRATIONS: &[Migration] = &[Migration {
    name: "preferred-language-zh",
    apply: migrate_preferred_language_zh,
}];

/// Convert the legacy bare "zh" language tag to its script-qualified form.
fn migrate_preferred_language_zh(settings: &mut Settings) -> bool {
    if settings.preferred_language.as_deref() == Some("zh") {
        settings.preferred_language = Some("zh-Hans".to_string());
        return true;
    }
    false
}

/// Run every migration in order. Returns whether anything was rewritten so
/// the caller can persist the modernized record.
pub(crate) fn run(settings: &mut Settings) -> bool {
    let mut changed = false;
    for migration in MIGRATIONS {
        if (migration.apply)(settings) {
            log::info!("Settings migration applied: {}", migration.name);
            changed = true;
        }
    }
    changed
}
