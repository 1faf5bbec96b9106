//! 实验配置 YAML：读取、改写特征映射模块、另存

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::core::HarnessError;

/// 一份实验配置（保留未知字段）
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentConfig {
    root: Mapping,
}

fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

impl ExperimentConfig {
    pub fn from_yaml(text: &str) -> Result<Self, HarnessError> {
        let root: Mapping =
            serde_yaml::from_str(text).map_err(|e| HarnessError::Config(e.to_string()))?;
        Ok(Self { root })
    }

    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text).map_err(|e| match e {
            HarnessError::Config(msg) => HarnessError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// `device.n_qubits`
    pub fn n_qubits(&self) -> Result<usize, HarnessError> {
        self.root
            .get("device")
            .and_then(|d| d.get("n_qubits"))
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .ok_or_else(|| HarnessError::Config("n_qubits is not found in the config.".into()))
    }

    pub fn feature_map_module(&self) -> Option<&str> {
        self.root
            .get("feature_map")
            .and_then(|f| f.get("module_name"))
            .and_then(Value::as_str)
    }

    pub fn feature_map_class(&self) -> Option<&str> {
        self.root
            .get("feature_map")
            .and_then(|f| f.get("implement_name"))
            .and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.root.get("description").and_then(Value::as_str)
    }

    /// 指向新的特征映射模块与类
    pub fn with_feature_map(mut self, module_name: &str, implement_name: &str) -> Self {
        let section = self
            .root
            .entry(key("feature_map"))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
        if !section.is_mapping() {
            *section = Value::Mapping(Mapping::new());
        }
        if let Value::Mapping(fm) = section {
            fm.insert(key("module_name"), key(module_name));
            fm.insert(key("implement_name"), key(implement_name));
        }
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.root.insert(key("description"), key(description));
        self
    }

    pub fn to_yaml(&self) -> Result<String, HarnessError> {
        serde_yaml::to_string(&self.root).map_err(|e| HarnessError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), HarnessError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }
}

/// 生成代码所在模块：`{module_root}.{experiment}.{module}`
pub fn module_path(module_root: &str, experiment: &str, module: &str) -> String {
    format!("{}.{}.{}", module_root, experiment, module)
}

/// 为一个想法写出 `config_{idea_id}.yaml`，返回路径
pub fn write_trial_config(
    base: &ExperimentConfig,
    config_dir: &Path,
    module_root: &str,
    experiment: &str,
    idea_id: &str,
    class_name: &str,
    summary: &str,
) -> Result<PathBuf, HarnessError> {
    let module = module_path(module_root, experiment, &format!("feature_map_{}", idea_id));
    let config = base
        .clone()
        .with_description(summary)
        .with_feature_map(&module, class_name);
    let path = config_dir.join(format!("config_{}.yaml", idea_id));
    config.save(&path)?;
    Ok(path)
}

/// 试运行配置：`{stem}_tmp.yaml`，模块固定为 `dry_run`
pub fn write_dry_run_config(
    dry_run_config: &Path,
    module_root: &str,
    experiment: &str,
    class_name: &str,
) -> Result<PathBuf, HarnessError> {
    let config = ExperimentConfig::load(dry_run_config)?
        .with_feature_map(&module_path(module_root, experiment, "dry_run"), class_name);
    let stem = dry_run_config
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dry_run");
    let path = dry_run_config.with_file_name(format!("{}_tmp.yaml", stem));
    config.save(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "description: seed\ndevice:\n  n_qubits: 8\nfeature_map:\n  module_name: seed.feature_map\n  implement_name: SeedFeatureMap\n  params:\n    reps: 2\n";

    #[test]
    fn test_n_qubits() {
        let cfg = ExperimentConfig::from_yaml(BASE).unwrap();
        assert_eq!(cfg.n_qubits().unwrap(), 8);

        let missing = ExperimentConfig::from_yaml("device: {}\n").unwrap();
        assert!(matches!(missing.n_qubits(), Err(HarnessError::Config(_))));
    }

    #[test]
    fn test_write_trial_config_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let base = ExperimentConfig::from_yaml(BASE).unwrap();
        let path = write_trial_config(&base, dir.path(), "generated", "exp", "2_1", "NewMap", "a summary")
            .unwrap();
        assert!(path.ends_with("config_2_1.yaml"));

        let written = ExperimentConfig::load(&path).unwrap();
        assert_eq!(written.feature_map_module(), Some("generated.exp.feature_map_2_1"));
        assert_eq!(written.feature_map_class(), Some("NewMap"));
        assert_eq!(written.description(), Some("a summary"));
        assert_eq!(written.n_qubits().unwrap(), 8);
        let text = written.to_yaml().unwrap();
        assert!(text.contains("reps: 2"));
    }

    #[test]
    fn test_write_dry_run_config() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("dry_run.yaml");
        std::fs::write(&src, BASE).unwrap();
        let path = write_dry_run_config(&src, "generated", "exp", "Candidate").unwrap();
        assert!(path.ends_with("dry_run_tmp.yaml"));
        let cfg = ExperimentConfig::load(&path).unwrap();
        assert_eq!(cfg.feature_map_module(), Some("generated.exp.dry_run"));
        assert_eq!(cfg.feature_map_class(), Some("Candidate"));
    }
}
