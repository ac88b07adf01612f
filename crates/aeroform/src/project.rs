//! Resource file discovery and loading

use aeroform_plugin::DynamicValue;
use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const RESOURCE_FILE: &str = "aeroform.yaml";
pub const ENV_PROJECT_ROOT: &str = "AEROFORM_PROJECT_ROOT";

/// Resources declared in `aeroform.yaml`, keyed by name
#[derive(Debug)]
pub struct Project {
    pub resources: BTreeMap<String, DynamicValue>,
}

/// Locate the directory holding `aeroform.yaml`
///
/// An explicit directory must contain the file. Otherwise the search walks
/// up from the current directory.
pub fn find_project_root(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(dir) = explicit {
        if dir.join(RESOURCE_FILE).exists() {
            return Ok(dir.to_path_buf());
        }
        anyhow::bail!("{} not found in {}", RESOURCE_FILE, dir.display());
    }

    let start = std::env::current_dir()?;
    search_upward(&start).ok_or_else(|| {
        anyhow::anyhow!(
            "{} not found in {} or any parent directory",
            RESOURCE_FILE,
            start.display()
        )
    })
}

fn search_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(RESOURCE_FILE).exists())
        .map(Path::to_path_buf)
}

impl Project {
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let path = root.join(RESOURCE_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let raw: Option<BTreeMap<String, serde_yaml::Value>> = serde_yaml::from_str(content)?;
        let mut resources = BTreeMap::new();
        for (name, attributes) in raw.unwrap_or_default() {
            let json = serde_json::to_value(&attributes)
                .with_context(|| format!("Resource '{}' is not representable as JSON", name))?;
            if !json.is_object() {
                anyhow::bail!("Resource '{}' must be a mapping of attributes", name);
            }
            resources.insert(name, DynamicValue::new(json));
        }
        Ok(Self { resources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_parse_resources() {
        let project = Project::parse(
            r#"
main:
  name: airflow-prod
  subnet_ids: [e9b-a]
  webserver:
    count: 1
    resource_preset_id: c1-m4
  airflow_config:
    core:
      load_examples: "False"
"#,
        )
        .unwrap();

        assert_eq!(project.resources.len(), 1);
        let main = project.resources["main"].as_json();
        assert_eq!(main["name"], json!("airflow-prod"));
        assert_eq!(main["webserver"]["count"], json!(1));
        assert_eq!(main["airflow_config"]["core"]["load_examples"], json!("False"));
    }

    #[test]
    fn test_parse_empty_file() {
        let project = Project::parse("").unwrap();
        assert!(project.resources.is_empty());
    }

    #[test]
    fn test_parse_rejects_scalar_resource() {
        let err = Project::parse("main: 42\n").unwrap_err();
        assert!(err.to_string().contains("must be a mapping"));
    }

    #[test]
    fn test_find_explicit_root() {
        let dir = tempdir().unwrap();
        assert!(find_project_root(Some(dir.path())).is_err());

        std::fs::write(dir.path().join(RESOURCE_FILE), "").unwrap();
        assert_eq!(find_project_root(Some(dir.path())).unwrap(), dir.path());
    }

    #[test]
    fn test_search_upward() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("dags").join("daily");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(RESOURCE_FILE), "").unwrap();

        assert_eq!(search_upward(&nested).as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempdir().unwrap();
        let err = Project::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(RESOURCE_FILE));
    }
}
