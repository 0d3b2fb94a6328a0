//! FormDefinitions: a directory of hand-authored form trees.
//!
//! Each form lives in `<name>.yaml` as a [`FormDefinition`]. The registry
//! keeps an in-memory index by name and writes through to disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::{FieldsError, Result};
use crate::types::FormDefinition;

/// Builder for `FormDefinitions`. Created by `FormDefinitions::open()`.
pub struct FormDefinitionsBuilder {
    root: PathBuf,
    defaults: Vec<FormDefinition>,
}

impl FormDefinitionsBuilder {
    /// Definitions written on open unless a file with the same name exists.
    pub fn with_defaults(mut self, defaults: impl IntoIterator<Item = FormDefinition>) -> Self {
        self.defaults.extend(defaults);
        self
    }

    /// Create the directory, seed defaults and load every definition.
    pub async fn build(self) -> Result<FormDefinitions> {
        fs::create_dir_all(&self.root).await?;

        for def in &self.defaults {
            let path = definition_path(&self.root, &def.name);
            if !path.exists() {
                let yaml = serde_yaml_ng::to_string(def)?;
                atomic_write(&path, yaml.as_bytes()).await?;
                debug!(name = %def.name, "seeded default form definition");
            }
        }

        let mut ctx = FormDefinitions {
            root: self.root,
            forms: Vec::new(),
            index: HashMap::new(),
        };
        ctx.load().await?;

        debug!(forms = ctx.forms.len(), root = %ctx.root.display(), "form definitions opened");
        Ok(ctx)
    }
}

/// Registry of form definitions backed by a directory of YAML files.
pub struct FormDefinitions {
    root: PathBuf,
    forms: Vec<FormDefinition>,
    index: HashMap<String, usize>,
}

impl FormDefinitions {
    /// Open or create a definitions directory.
    ///
    /// ```rust,ignore
    /// let forms = FormDefinitions::open(dir)
    ///     .with_defaults(builtin_forms())
    ///     .build()
    ///     .await?;
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> FormDefinitionsBuilder {
        FormDefinitionsBuilder {
            root: root.into(),
            defaults: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormDefinition> {
        self.index.get(name).map(|&i| &self.forms[i])
    }

    /// Like [`get`](Self::get) but a missing form is an error.
    pub fn require(&self, name: &str) -> Result<&FormDefinition> {
        self.get(name).ok_or_else(|| FieldsError::DefinitionNotFound {
            name: name.to_string(),
        })
    }

    pub fn all(&self) -> &[FormDefinition] {
        &self.forms
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create or replace a definition. Persists immediately.
    pub async fn write(&mut self, def: &FormDefinition) -> Result<()> {
        def.tree.check()?;
        let yaml = serde_yaml_ng::to_string(def)?;
        atomic_write(&definition_path(&self.root, &def.name), yaml.as_bytes()).await?;

        if let Some(&idx) = self.index.get(&def.name) {
            self.forms[idx] = def.clone();
        } else {
            self.index.insert(def.name.clone(), self.forms.len());
            self.forms.push(def.clone());
        }
        Ok(())
    }

    /// Remove a definition and its file.
    pub async fn delete(&mut self, name: &str) -> Result<()> {
        let idx = self
            .index
            .remove(name)
            .ok_or_else(|| FieldsError::DefinitionNotFound {
                name: name.to_string(),
            })?;
        let _ = fs::remove_file(definition_path(&self.root, name)).await;

        self.forms.swap_remove(idx);
        if let Some(moved) = self.forms.get(idx) {
            self.index.insert(moved.name.clone(), idx);
        }
        Ok(())
    }

    async fn load(&mut self) -> Result<()> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
                paths.push(path);
            }
        }
        // read_dir order is platform dependent
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path).await?;
            let def = match serde_yaml_ng::from_str::<FormDefinition>(&content) {
                Ok(def) => def,
                Err(e) => {
                    warn!(?path, %e, "skipping invalid form definition");
                    continue;
                }
            };
            if let Err(e) = def.tree.check() {
                warn!(?path, %e, "skipping malformed form tree");
                continue;
            }
            self.index.insert(def.name.clone(), self.forms.len());
            self.forms.push(def);
        }
        Ok(())
    }
}

fn definition_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{name}.yaml"))
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
