use crate::error::ProfileError;
use crate::profile::{UserProfile, SCHEMA_VERSION};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty profile.
    pub fn load(&self) -> Result<UserProfile, ProfileError> {
        if !self.path.exists() {
            return Ok(UserProfile::default());
        }

        let data = fs::read(&self.path).map_err(|source| self.io_error(source))?;
        let profile: UserProfile =
            serde_json::from_slice(&data).map_err(|source| ProfileError::Parse {
                path: self.path.display().to_string(),
                source,
            })?;

        if profile.schema_version != SCHEMA_VERSION {
            return Err(ProfileError::UnknownSchema {
                path: self.path.display().to_string(),
                version: profile.schema_version,
            });
        }
        Ok(profile)
    }

    pub fn save(&self, profile: &UserProfile) -> Result<(), ProfileError> {
        self.write_atomic(profile)
            .map_err(|source| self.io_error(source))
    }

    fn write_atomic(&self, profile: &UserProfile) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(profile)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

        fs::write(&tmp_path, bytes)?;
        match fs::rename(&tmp_path, &self.path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if self.path.exists() {
                    fs::remove_file(&self.path)?;
                    fs::rename(&tmp_path, &self.path)?;
                    Ok(())
                } else {
                    Err(rename_err)
                }
            }
        }
    }

    fn io_error(&self, source: io::Error) -> ProfileError {
        ProfileError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ProfileStore;
    use crate::error::ProfileError;
    use crate::profile::UserProfile;
    use std::fs;

    #[test]
    fn missing_file_loads_empty_profile() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ProfileStore::new(dir.path().join("profile.json"));

        let profile = store.load().expect("missing profile should load");
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn save_then_load_keeps_fields_and_creates_parent_dir() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let store = ProfileStore::new(dir.path().join("nested").join("profile.json"));

        let mut profile = UserProfile::default();
        profile
            .fields
            .insert("reading_level".to_string(), "undergraduate".to_string());
        store.save(&profile).expect("profile should save");

        let loaded = store.load().expect("profile should load");
        assert_eq!(
            loaded.fields.get("reading_level").map(String::as_str),
            Some("undergraduate")
        );
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn unknown_schema_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("profile.json");
        fs::write(&path, r#"{"schema_version": 99, "fields": {}}"#)
            .expect("fixture should write");

        let err = ProfileStore::new(&path)
            .load()
            .expect_err("unknown schema should fail");
        assert!(matches!(err, ProfileError::UnknownSchema { version: 99, .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("profile.json");
        fs::write(&path, "not json").expect("fixture should write");

        let err = ProfileStore::new(&path)
            .load()
            .expect_err("garbage should fail");
        assert!(err.to_string().contains("failed to parse"));
    }
}
