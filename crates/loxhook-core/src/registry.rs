// ── Control registry ──
//
// Loads every `*.toml` definition file below a directory, merges them
// into one accumulator, and validates the whole set before handing out
// an immutable `Registry`. Any failure here is fatal to startup.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::command::AllowedCommand;
use crate::error::ControlError;
use crate::model::{Category, Control, CredentialTable};

/// Extension of control definition files.
pub const DEFINITION_EXTENSION: &str = "toml";

/// Time budget for discovering definition files.
pub const WALK_BUDGET: Duration = Duration::from_secs(2);

// ── Definition documents ────────────────────────────────────────────

/// One parsed definition file, before validation.
///
/// The capitalized keys (`Tokens`, `Controls`, `Category`, `ID`, `Allowed`)
/// of older deployments are accepted as aliases.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionFile {
    /// Credential name → secret.
    #[serde(default, alias = "tokens", alias = "Tokens")]
    pub credentials: IndexMap<String, String>,

    /// Control name → definition.
    #[serde(default, alias = "Controls")]
    pub controls: IndexMap<String, ControlDefinition>,
}

impl DefinitionFile {
    pub fn parse(path: &Path, text: &str) -> Result<Self, ControlError> {
        toml::from_str(text).map_err(|e| ControlError::Parse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })
    }
}

/// Unvalidated control definition as written in a file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControlDefinition {
    #[serde(alias = "Category")]
    pub category: String,
    #[serde(alias = "ID", alias = "Id")]
    pub id: i64,
    #[serde(default, alias = "Allowed")]
    pub allowed: Vec<String>,
    #[serde(default, alias = "tokens", alias = "Tokens")]
    pub credentials: Vec<String>,
}

// ── Discovery ───────────────────────────────────────────────────────

/// Recursively collect definition files below `dir`, sorted by path.
///
/// The walk checks `budget` before every entry and gives up with
/// [`ControlError::WalkTimeout`] instead of crawling a huge tree.
pub fn definition_files(dir: &Path, budget: Duration) -> Result<Vec<PathBuf>, ControlError> {
    let deadline = Instant::now() + budget;
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        if Instant::now() >= deadline {
            return Err(ControlError::WalkTimeout {
                dir: dir.to_path_buf(),
                budget,
            });
        }
        let entry = entry?;
        let is_definition = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|ext| ext == DEFINITION_EXTENSION);
        if is_definition {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Whether `name` matches `^[A-Za-z0-9_-]+$`.
pub fn is_valid_control_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

// ── Accumulator ─────────────────────────────────────────────────────

/// Credentials and controls merged across definition files.
#[derive(Debug, Default)]
pub struct Definitions {
    credentials: CredentialTable,
    controls: IndexMap<String, ControlDefinition>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one file into the accumulator.
    ///
    /// A control name seen before is an error. A credential name seen
    /// before is accepted only if it maps to the same secret.
    pub fn merge(&mut self, path: &Path, file: DefinitionFile) -> Result<(), ControlError> {
        for (name, secret) in file.credentials {
            match self.credentials.secret(&name).map(str::to_owned) {
                Some(existing) if existing != secret => {
                    return Err(ControlError::DuplicateCredential {
                        name,
                        path: path.to_path_buf(),
                    });
                }
                Some(_) => {}
                None => {
                    self.credentials.insert(name, secret);
                }
            }
        }

        for (name, def) in file.controls {
            if self.controls.contains_key(&name) {
                return Err(ControlError::DuplicateControl {
                    name,
                    path: path.to_path_buf(),
                });
            }
            self.controls.insert(name, def);
        }

        Ok(())
    }

    /// Validate the merged set, stopping at the first violation.
    ///
    /// Controls are checked in name order: name grammar, category, id,
    /// allowed commands, then credential references.
    pub fn validate(self) -> Result<Registry, ControlError> {
        let mut owners: HashMap<&str, &str> = HashMap::new();
        for (name, secret) in self.credentials.iter() {
            if let Some(first) = owners.insert(secret, name) {
                return Err(ControlError::DuplicateSecret {
                    first: first.to_owned(),
                    second: name.to_owned(),
                });
            }
        }

        let sorted: BTreeMap<String, ControlDefinition> = self.controls.into_iter().collect();
        let mut controls = BTreeMap::new();

        for (name, def) in sorted {
            let control = validate_control(name, def, &self.credentials)?;
            if control.allowed.is_empty() {
                warn!(control = %control.name, "control allows no commands");
            }
            controls.insert(control.name.clone(), control);
        }

        Ok(Registry {
            credentials: self.credentials,
            controls,
        })
    }
}

fn validate_control(
    name: String,
    def: ControlDefinition,
    credentials: &CredentialTable,
) -> Result<Control, ControlError> {
    if !is_valid_control_name(&name) {
        return Err(ControlError::InvalidControlName { name });
    }

    let Ok(category) = def.category.parse::<Category>() else {
        return Err(ControlError::InvalidCategory {
            control: name,
            category: def.category,
        });
    };

    let id = match u32::try_from(def.id) {
        Ok(id) if id > 0 => id,
        _ => {
            return Err(ControlError::InvalidId {
                control: name,
                id: def.id,
            });
        }
    };

    let allowed = def
        .allowed
        .iter()
        .map(|raw| {
            AllowedCommand::parse(category, raw).ok_or_else(|| ControlError::InvalidCommand {
                category: category.to_string(),
                command: raw.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(missing) = def.credentials.iter().find(|c| !credentials.contains(c)) {
        return Err(ControlError::InvalidCredential {
            name: missing.clone(),
        });
    }

    Ok(Control {
        name,
        category,
        id,
        allowed,
        credentials: def.credentials,
    })
}

// ── Registry ────────────────────────────────────────────────────────

/// Validated, immutable set of credentials and controls.
///
/// Built once at startup and shared read-only by every request worker.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    credentials: CredentialTable,
    controls: BTreeMap<String, Control>,
}

impl Registry {
    /// Load and validate every definition file below `dir`.
    pub fn load(dir: &Path) -> Result<Self, ControlError> {
        let files = definition_files(dir, WALK_BUDGET)?;
        let mut definitions = Definitions::new();

        for path in &files {
            debug!(path = %path.display(), "reading control definitions");
            let text = std::fs::read_to_string(path).map_err(|source| ControlError::Io {
                path: path.clone(),
                source,
            })?;
            definitions.merge(path, DefinitionFile::parse(path, &text)?)?;
        }

        let registry = definitions.validate()?;
        info!(
            files = files.len(),
            controls = registry.len(),
            credentials = registry.credentials.len(),
            "control definitions loaded"
        );
        Ok(registry)
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.get(name)
    }

    pub fn controls(&self) -> impl Iterator<Item = &Control> {
        self.controls.values()
    }

    pub fn credentials(&self) -> &CredentialTable {
        &self.credentials
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::command::DviCommand;

    fn validate(text: &str) -> Result<Registry, ControlError> {
        let path = Path::new("inline.toml");
        let mut defs = Definitions::new();
        defs.merge(path, DefinitionFile::parse(path, text)?)?;
        defs.validate()
    }

    #[test]
    fn accepts_full_name_alphabet() {
        let registry = validate(
            r#"
            [credentials]
            ValidKey = "325ce159-0ddf-433a-966f-a94b313a7eb5"

            [controls.abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_-]
            category = "dvi"
            id = 1
            allowed = ["<all>"]
            credentials = ["ValidKey"]
            "#,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_invalid_control_names() {
        for name in ["No spaces please", "No+please", "No:please", "back`tick", "caret^"] {
            let text = format!(
                r#"
                [credentials]
                ValidKey = "325ce159-0ddf-433a-966f-a94b313a7eb5"

                [controls."{name}"]
                category = "dvi"
                id = 1
                allowed = ["<all>"]
                credentials = ["ValidKey"]
                "#
            );
            let err = validate(&text).unwrap_err();
            assert!(
                matches!(&err, ControlError::InvalidControlName { name: n } if n == name),
                "{name}: {err:?}"
            );
        }
    }

    #[test]
    fn rejects_unknown_category() {
        let err = validate(
            r#"
            [credentials]
            key = "f6694286-66e6-4b79-8936-9e45284eba60"

            [controls.light]
            category = "NonExistentCategory"
            id = 1
            allowed = ["<all>"]
            credentials = ["key"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ControlError::InvalidCategory { .. }), "{err:?}");
    }

    #[test]
    fn rejects_command_outside_vocabulary() {
        let err = validate(
            r#"
            [credentials]
            key = "f6694286-66e6-4b79-8936-9e45284eba60"

            [controls.light]
            category = "dvi"
            id = 1
            allowed = ["on", "NotAllowedCommand"]
            credentials = ["key"]
            "#,
        )
        .unwrap_err();
        match err {
            ControlError::InvalidCommand { category, command } => {
                assert_eq!(category, "dvi");
                assert_eq!(command, "NotAllowedCommand");
            }
            other => panic!("expected InvalidCommand, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_credential_reference() {
        let err = validate(
            r#"
            [credentials]
            ValidKey = "325ce159-0ddf-433a-966f-a94b313a7eb5"

            [controls.ControlName]
            category = "dvi"
            id = 1
            allowed = ["<all>"]
            credentials = ["InvalidKey"]
            "#,
        )
        .unwrap_err();
        assert!(
            matches!(&err, ControlError::InvalidCredential { name } if name == "InvalidKey"),
            "{err:?}"
        );
    }

    #[test]
    fn rejects_non_positive_id() {
        for id in ["0", "-4"] {
            let text = format!(
                r#"
                [controls.light]
                category = "dvi"
                id = {id}
                "#
            );
            let err = validate(&text).unwrap_err();
            assert!(matches!(err, ControlError::InvalidId { .. }), "{id}: {err:?}");
        }
    }

    #[test]
    fn rejects_shared_secret() {
        let err = validate(
            r#"
            [credentials]
            one = "same-secret"
            two = "same-secret"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ControlError::DuplicateSecret { .. }), "{err:?}");
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = validate(
            r#"
            [controls.light]
            category = "dvi"
            id = 1
            tokens = ["key"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ControlError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn builds_typed_controls() {
        let registry = validate(
            r#"
            [credentials]
            doorKey = "5b7f2c1e-6d7a-4c55-9a0e-2b9a3f4c8d11"

            [controls.door]
            category = "dvi"
            id = 7
            allowed = ["pulse", "Impuls"]
            credentials = ["doorKey"]
            "#,
        )
        .unwrap();

        let door = registry.control("door").unwrap();
        assert_eq!(door.category, Category::Dvi);
        assert_eq!(door.id, 7);
        assert_eq!(
            door.allowed,
            vec![
                AllowedCommand::Dvi(DviCommand::Pulse),
                AllowedCommand::Dvi(DviCommand::Impuls)
            ]
        );
        assert_eq!(
            registry.credentials().name_for_secret("5b7f2c1e-6d7a-4c55-9a0e-2b9a3f4c8d11"),
            Some("doorKey")
        );
    }

    #[test]
    fn duplicate_control_in_second_file_is_an_error() {
        let first = r#"
            [controls.door]
            category = "dvi"
            id = 7
        "#;
        let second = r#"
            [controls.door]
            category = "dvi"
            id = 8
        "#;
        let mut defs = Definitions::new();
        defs.merge(Path::new("a.toml"), DefinitionFile::parse(Path::new("a.toml"), first).unwrap())
            .unwrap();
        let err = defs
            .merge(Path::new("b.toml"), DefinitionFile::parse(Path::new("b.toml"), second).unwrap())
            .unwrap_err();
        assert!(
            matches!(&err, ControlError::DuplicateControl { name, path } if name == "door" && path == Path::new("b.toml")),
            "{err:?}"
        );
    }

    #[test]
    fn identical_credential_redefinition_is_accepted() {
        let text = r#"
            [credentials]
            shared = "0c6f7d4e-0a44-4a51-8f7e-7f0e7e0b9a21"
        "#;
        let mut defs = Definitions::new();
        for file in ["a.toml", "b.toml"] {
            defs.merge(Path::new(file), DefinitionFile::parse(Path::new(file), text).unwrap())
                .unwrap();
        }
        assert_eq!(defs.validate().unwrap().credentials().len(), 1);
    }
}
