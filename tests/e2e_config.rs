// End-to-end tests over a temporary configuration tree: settings
// persistence, the profile catalogue, and hook manifest loading, the way
// a fresh installation would exercise them.

use std::fs;

use tempfile::TempDir;

use linux_armoury::app::hooks::HookManager;
use linux_armoury::app::profile_mgr::ProfileManager;
use linux_armoury::app::settings::SettingsStore;
use linux_armoury::core::model::ProfileKind;
use linux_armoury::core::profile::builtin_profiles;
use linux_armoury::platform::config::AppPaths;

fn fresh_install() -> (TempDir, AppPaths) {
    let dir = TempDir::new().unwrap();
    let paths = AppPaths::at(dir.path().join("linux-armoury")).unwrap();
    (dir, paths)
}

#[test]
fn first_run_creates_the_tree() {
    let (_dir, paths) = fresh_install();
    assert!(paths.config_dir.is_dir());
    assert!(paths.profiles_dir.is_dir());
    assert!(paths.plugins_dir.is_dir());
    assert!(!paths.settings_file().exists());
}

#[test]
fn settings_survive_restart() {
    let (_dir, paths) = fresh_install();

    let mut store = SettingsStore::open(paths.settings_file());
    store.settings.auto_switch_enabled = true;
    store.settings.ac_profile = "gaming".to_string();
    store.save().unwrap();
    store.remember_profile("gaming").unwrap();

    // Second process start
    let reloaded = SettingsStore::open(paths.settings_file());
    assert!(reloaded.settings.auto_switch_enabled);
    assert_eq!(reloaded.settings.ac_profile, "gaming");
    assert_eq!(reloaded.settings.last_profile.as_deref(), Some("gaming"));
}

#[test]
fn hand_edited_settings_keep_unknown_keys() {
    let (_dir, paths) = fresh_install();
    fs::write(
        paths.settings_file(),
        r#"{"battery_profile": "efficient", "theme": "dark"}"#,
    )
    .unwrap();

    let mut store = SettingsStore::open(paths.settings_file());
    assert_eq!(store.settings.battery_profile, "efficient");
    store.settings.auto_switch_enabled = true;
    store.save().unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(paths.settings_file()).unwrap()).unwrap();
    assert_eq!(raw["theme"], "dark");
    assert_eq!(raw["auto_switch_enabled"], true);
}

#[test]
fn profile_lifecycle() {
    let (_dir, paths) = fresh_install();
    let mgr = ProfileManager::new(&paths.profiles_dir);

    // Fresh install shows exactly the built-ins
    let builtin_count = builtin_profiles().len();
    assert_eq!(mgr.list().len(), builtin_count);

    // Save a custom variant of a built-in, see it shadow
    let mut custom = mgr.get("performance").unwrap().profile;
    custom.tdp_watts = 60;
    mgr.save(&custom).unwrap();

    let entry = mgr.get("performance").unwrap();
    assert_eq!(entry.kind, ProfileKind::Custom);
    assert_eq!(entry.profile.tdp_watts, 60);
    assert_eq!(mgr.list().len(), builtin_count);

    // Delete restores the built-in
    mgr.delete("performance").unwrap();
    let entry = mgr.get("performance").unwrap();
    assert_eq!(entry.kind, ProfileKind::Builtin);
    assert_eq!(entry.profile.tdp_watts, 55);
}

#[test]
fn profile_files_are_plain_json() {
    let (_dir, paths) = fresh_install();
    let mgr = ProfileManager::new(&paths.profiles_dir);

    let mut custom = mgr.get("balanced").unwrap().profile;
    custom.name = "Desk Work".to_string();
    let saved_path = mgr.save(&custom).unwrap();

    // File name is sanitized; contents readable and re-importable
    assert_eq!(saved_path.file_name().unwrap(), "desk_work.json");
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&saved_path).unwrap()).unwrap();
    assert_eq!(raw["name"], "Desk Work");

    let (_dir2, paths2) = fresh_install();
    let other = ProfileManager::new(&paths2.profiles_dir);
    let imported = other.import(&saved_path).unwrap();
    assert_eq!(imported.name, "Desk Work");
}

#[test]
fn corrupt_profile_does_not_break_the_catalogue() {
    let (_dir, paths) = fresh_install();
    let mgr = ProfileManager::new(&paths.profiles_dir);

    fs::write(paths.profiles_dir.join("broken.json"), "{oops").unwrap();
    fs::write(
        paths.profiles_dir.join("over_budget.json"),
        r#"{"name": "hot", "tdp_watts": 300}"#,
    )
    .unwrap();

    // Both bad files are skipped; the built-ins remain intact
    assert_eq!(mgr.list().len(), builtin_profiles().len());
    assert!(mgr.get("hot").is_err());
}

#[test]
fn hooks_load_from_plugins_dir() {
    let (_dir, paths) = fresh_install();
    fs::write(
        paths.plugins_dir.join("notify.toml"),
        "name = \"notify\"\ncommand = \"/bin/true\"\nevents = [\"profile_change\"]\n",
    )
    .unwrap();
    fs::write(paths.plugins_dir.join("junk.toml"), "???").unwrap();

    let mgr = HookManager::load(&paths.plugins_dir);
    assert_eq!(mgr.hook_count(), 1);
    assert!(paths.plugins_dir.join("README").exists());
}
