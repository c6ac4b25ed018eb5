//! FILENAME: core/persistence/src/templates.rs
//! Saved pivot templates: a named config + options tied to a dataset.
//!
//! Templates are stored together in one JSON document:
//! `{ "version": 1, "templates": [ ... ] }`. A template whose dataset has
//! since lost some columns still loads; `stale_fields` reports the gaps so
//! the editor can ask before applying it.

use std::fs;
use std::path::Path;

use pivot_engine::{PivotConfig, PivotOptions};
use serde::{Deserialize, Serialize};

use crate::PersistenceError;

pub const TEMPLATE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTemplate {
    pub name: String,
    pub dataset_id: String,
    pub config: PivotConfig,
    #[serde(default)]
    pub options: PivotOptions,
}

impl PivotTemplate {
    pub fn new(
        name: impl Into<String>,
        dataset_id: impl Into<String>,
        config: PivotConfig,
        options: PivotOptions,
    ) -> Self {
        PivotTemplate {
            name: name.into(),
            dataset_id: dataset_id.into(),
            config,
            options,
        }
    }

    /// Fields the template uses that are not among `headers`.
    pub fn stale_fields<S: AsRef<str>>(&self, headers: &[S]) -> Vec<String> {
        self.config
            .referenced_fields()
            .into_iter()
            .filter(|field| !headers.iter().any(|h| h.as_ref() == *field))
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TemplateFile {
    version: u32,
    templates: Vec<PivotTemplate>,
}

/// All saved templates, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateStore {
    templates: Vec<PivotTemplate>,
}

impl TemplateStore {
    pub fn new() -> Self {
        TemplateStore::default()
    }

    /// Loads a store. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(TemplateStore::new()),
            Err(e) => return Err(e.into()),
        };
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let file: TemplateFile = serde_json::from_str(json)?;
        if file.version > TEMPLATE_FORMAT_VERSION {
            return Err(PersistenceError::InvalidFormat(format!(
                "template file version {} is newer than supported version {}",
                file.version, TEMPLATE_FORMAT_VERSION
            )));
        }
        log::debug!("loaded {} pivot templates", file.templates.len());
        Ok(TemplateStore {
            templates: file.templates,
        })
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        let file = TemplateFile {
            version: TEMPLATE_FORMAT_VERSION,
            templates: self.templates.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Adds a template, replacing one with the same dataset and name.
    pub fn upsert(&mut self, template: PivotTemplate) {
        match self
            .templates
            .iter_mut()
            .find(|t| t.dataset_id == template.dataset_id && t.name == template.name)
        {
            Some(existing) => *existing = template,
            None => self.templates.push(template),
        }
    }

    pub fn get(&self, dataset_id: &str, name: &str) -> Option<&PivotTemplate> {
        self.templates
            .iter()
            .find(|t| t.dataset_id == dataset_id && t.name == name)
    }

    pub fn remove(&mut self, dataset_id: &str, name: &str) -> Result<PivotTemplate, PersistenceError> {
        let index = self
            .templates
            .iter()
            .position(|t| t.dataset_id == dataset_id && t.name == name)
            .ok_or_else(|| PersistenceError::TemplateNotFound(name.to_string()))?;
        Ok(self.templates.remove(index))
    }

    pub fn for_dataset(&self, dataset_id: &str) -> Vec<&PivotTemplate> {
        self.templates
            .iter()
            .filter(|t| t.dataset_id == dataset_id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
