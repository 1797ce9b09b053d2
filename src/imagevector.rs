// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Container image lookup for chart values.
//!
//! The image vector is a YAML file listing every image the charts may use:
//!
//! ```yaml
//! images:
//! - name: coredns
//!   repository: registry.example.com/coredns/coredns
//!   tag: "1.6.3"
//! ```

use crate::errors::ImageVectorError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    pub name: String,
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl ImageSource {
    /// `repository:tag`, or just the repository if untagged.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.tag {
            Some(tag) => format!("{}:{}", self.repository, tag),
            None => self.repository.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVector {
    #[serde(default)]
    pub images: Vec<ImageSource>,
}

impl ImageVector {
    /// # Errors
    ///
    /// Returns [`ImageVectorError::Parse`] if the YAML is invalid.
    pub fn parse(yaml: &str) -> Result<Self, ImageVectorError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub async fn read(path: &Path) -> Result<Self, ImageVectorError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ImageVectorError::Read {
                path: path.display().to_string(),
                source,
            })?;
        Self::parse(&yaml)
    }

    /// # Errors
    ///
    /// Returns [`ImageVectorError::NotFound`] if no image has that name.
    pub fn find(&self, name: &str) -> Result<&ImageSource, ImageVectorError> {
        self.images
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| ImageVectorError::NotFound(name.to_string()))
    }

    /// Set `values.images.<name>` to the full image name of every `names` entry.
    ///
    /// Non-object `values` are replaced by an object.
    ///
    /// # Errors
    ///
    /// Returns [`ImageVectorError::NotFound`] for the first unknown image.
    pub fn inject_images(
        &self,
        values: &mut serde_json::Value,
        names: &[&str],
    ) -> Result<(), ImageVectorError> {
        let mut images = serde_json::Map::new();
        for name in names {
            images.insert(
                (*name).to_string(),
                serde_json::Value::String(self.find(name)?.full_name()),
            );
        }

        if !values.is_object() {
            *values = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(object) = values.as_object_mut() {
            object.insert("images".to_string(), serde_json::Value::Object(images));
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "imagevector_tests.rs"]
mod imagevector_tests;
