// linux-armoury - app/profile_mgr.rs
//
// Profile catalogue: the built-in presets plus user JSON files under the
// profiles directory. Custom profiles shadow built-ins of the same name;
// built-ins can never be deleted. Lookup is case-insensitive.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::core::model::{PowerProfile, ProfileKind};
use crate::core::profile::{builtin_profiles, parse_profile_json, validate};
use crate::platform::config::atomic_write;
use crate::util::constants;
use crate::util::error::{ProfileError, Result};

/// A profile together with its origin.
#[derive(Debug, Clone)]
pub struct ProfileEntry {
    pub profile: PowerProfile,
    pub kind: ProfileKind,
}

#[derive(Debug, Clone)]
pub struct ProfileManager {
    profiles_dir: PathBuf,
}

impl ProfileManager {
    pub fn new(profiles_dir: impl Into<PathBuf>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
        }
    }

    /// All profiles, built-ins first, with customs shadowing built-ins of
    /// the same name. Unreadable custom files are skipped with a warning
    /// so one bad file cannot hide the rest.
    pub fn list(&self) -> Vec<ProfileEntry> {
        let mut entries: Vec<ProfileEntry> = builtin_profiles()
            .into_iter()
            .map(|profile| ProfileEntry {
                profile,
                kind: ProfileKind::Builtin,
            })
            .collect();

        for custom in self.load_customs() {
            let key = custom.name.to_lowercase();
            if let Some(existing) = entries
                .iter_mut()
                .find(|e| e.profile.name.to_lowercase() == key)
            {
                debug!(name = %custom.name, "custom profile shadows built-in");
                existing.profile = custom;
                existing.kind = ProfileKind::Custom;
            } else {
                entries.push(ProfileEntry {
                    profile: custom,
                    kind: ProfileKind::Custom,
                });
            }
        }

        entries
    }

    /// Look up one profile by name, case-insensitively.
    pub fn get(&self, name: &str) -> Result<ProfileEntry> {
        let key = name.to_lowercase();
        self.list()
            .into_iter()
            .find(|e| e.profile.name.to_lowercase() == key)
            .ok_or_else(|| {
                ProfileError::NotFound {
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// Validate and persist a custom profile.
    pub fn save(&self, profile: &PowerProfile) -> Result<PathBuf> {
        validate(profile)?;

        let customs = self.load_customs();
        let key = profile.name.to_lowercase();
        let replacing = customs.iter().any(|p| p.name.to_lowercase() == key);
        if !replacing && customs.len() >= constants::MAX_PROFILES {
            return Err(ProfileError::TooManyProfiles {
                count: customs.len(),
                max: constants::MAX_PROFILES,
            }
            .into());
        }

        let path = self.profile_path(&profile.name);
        let json =
            serde_json::to_string_pretty(profile).map_err(|source| ProfileError::JsonParse {
                path: path.clone(),
                source,
            })?;
        atomic_write(&path, &json)?;
        info!(name = %profile.name, path = %path.display(), "profile saved");
        Ok(path)
    }

    /// Delete a custom profile. Built-ins are refused; deleting a custom
    /// that shadows a built-in just restores the built-in.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.profile_path(name);
        if !path.exists() {
            let is_builtin = builtin_profiles()
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(name));
            if is_builtin {
                return Err(ProfileError::BuiltinProtected {
                    name: name.to_string(),
                }
                .into());
            }
            return Err(ProfileError::NotFound {
                name: name.to_string(),
            }
            .into());
        }

        std::fs::remove_file(&path).map_err(|source| ProfileError::Io {
            path: path.clone(),
            source,
        })?;
        info!(name, "custom profile deleted");
        Ok(())
    }

    /// Copy a profile JSON file from outside into the catalogue.
    pub fn import(&self, source: &Path) -> Result<PowerProfile> {
        let profile = self.load_custom_file(source)?;
        self.save(&profile)?;
        Ok(profile)
    }

    /// Write a profile (built-in or custom) to an external file.
    pub fn export(&self, name: &str, destination: &Path) -> Result<()> {
        let entry = self.get(name)?;
        let json = serde_json::to_string_pretty(&entry.profile).map_err(|source| {
            ProfileError::JsonParse {
                path: destination.to_path_buf(),
                source,
            }
        })?;
        atomic_write(destination, &json)?;
        info!(name, destination = %destination.display(), "profile exported");
        Ok(())
    }

    fn profile_path(&self, name: &str) -> PathBuf {
        // Profile names become file names; keep them filesystem-safe.
        let safe: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.profiles_dir.join(format!("{safe}.json"))
    }

    fn load_customs(&self) -> Vec<PowerProfile> {
        let mut profiles = Vec::new();
        let entries = match std::fs::read_dir(&self.profiles_dir) {
            Ok(entries) => entries,
            Err(_) => return profiles,
        };

        let mut paths: Vec<PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            match self.load_custom_file(&path) {
                Ok(profile) => profiles.push(profile),
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable profile file");
                }
            }
        }
        profiles
    }

    fn load_custom_file(&self, path: &Path) -> Result<PowerProfile> {
        let metadata = std::fs::metadata(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if metadata.len() > constants::MAX_PROFILE_FILE_SIZE {
            return Err(ProfileError::FileTooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max_size: constants::MAX_PROFILE_FILE_SIZE,
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let profile = parse_profile_json(&content, path)?;
        validate(&profile)?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, ProfileManager) {
        let dir = TempDir::new().unwrap();
        let mgr = ProfileManager::new(dir.path());
        (dir, mgr)
    }

    fn custom(name: &str, tdp: u32) -> PowerProfile {
        PowerProfile {
            name: name.to_string(),
            tdp_watts: tdp,
            ..builtin_profiles().remove(0)
        }
    }

    #[test]
    fn test_list_contains_builtins() {
        let (_dir, mgr) = manager();
        let entries = mgr.list();
        assert_eq!(entries.len(), 7);
        assert!(entries.iter().all(|e| e.kind == ProfileKind::Builtin));
    }

    #[test]
    fn test_save_and_get_custom() {
        let (_dir, mgr) = manager();
        mgr.save(&custom("work", 35)).unwrap();

        let entry = mgr.get("Work").unwrap();
        assert_eq!(entry.kind, ProfileKind::Custom);
        assert_eq!(entry.profile.tdp_watts, 35);
        assert_eq!(mgr.list().len(), 8);
    }

    #[test]
    fn test_custom_shadows_builtin() {
        let (_dir, mgr) = manager();
        mgr.save(&custom("gaming", 65)).unwrap();

        let entries = mgr.list();
        assert_eq!(entries.len(), 7);
        let gaming = mgr.get("gaming").unwrap();
        assert_eq!(gaming.kind, ProfileKind::Custom);
        assert_eq!(gaming.profile.tdp_watts, 65);
    }

    #[test]
    fn test_delete_builtin_refused() {
        let (_dir, mgr) = manager();
        let err = mgr.delete("balanced").unwrap_err();
        assert!(err.to_string().contains("built-in"));
    }

    #[test]
    fn test_delete_shadow_restores_builtin() {
        let (_dir, mgr) = manager();
        mgr.save(&custom("gaming", 65)).unwrap();
        mgr.delete("gaming").unwrap();

        let entry = mgr.get("gaming").unwrap();
        assert_eq!(entry.kind, ProfileKind::Builtin);
        assert_eq!(entry.profile.tdp_watts, 70);
    }

    #[test]
    fn test_delete_missing_custom() {
        let (_dir, mgr) = manager();
        let err = mgr.delete("no-such-profile").unwrap_err();
        assert!(err.to_string().contains("no-such-profile"));
    }

    #[test]
    fn test_save_rejects_invalid() {
        let (_dir, mgr) = manager();
        assert!(mgr.save(&custom("hot", 300)).is_err());
    }

    #[test]
    fn test_unreadable_file_skipped() {
        let (dir, mgr) = manager();
        std::fs::write(dir.path().join("bad.json"), "{broken").unwrap();
        mgr.save(&custom("good", 30)).unwrap();

        // bad.json is skipped, good profile still listed
        assert_eq!(mgr.list().len(), 8);
    }

    #[test]
    fn test_oversized_file_rejected() {
        let (dir, mgr) = manager();
        let big = "x".repeat(constants::MAX_PROFILE_FILE_SIZE as usize + 1);
        std::fs::write(dir.path().join("big.json"), big).unwrap();
        assert_eq!(mgr.list().len(), 7);
    }

    #[test]
    fn test_export_import_round_trip() {
        let (dir, mgr) = manager();
        let out = dir.path().join("exported.json");
        mgr.export("balanced", &out).unwrap();

        let (_dir2, other) = manager();
        let imported = other.import(&out).unwrap();
        assert_eq!(imported.name, "balanced");
        assert_eq!(other.get("balanced").unwrap().kind, ProfileKind::Custom);
    }
}
