//! 配置模块，负责加载JSON配置文件

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

use crate::predicate::{Record, Value};

/// 配置错误
#[derive(Debug, Error)]
#[error("配置错误: {message}")]
pub struct ConfigError {
    pub message: String,
}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// 翻译器配置
///
/// ```json
/// { "parenthesize_groups": false, "captures": { "owner": { "Id": "00000000-0000-0000-0000-000000000000" } } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// 为不同运算符的嵌套逻辑组加括号 (默认关闭, 保持平铺输出)
    pub parenthesize_groups: bool,
    /// 额外的捕获变量, 名称 -> JSON 值
    pub captures: BTreeMap<String, serde_json::Value>,
}

impl TranslatorConfig {
    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "配置文件不存在: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!("无法读取配置文件 {}: {}", path_ref.display(), e))
        })?;

        Self::from_json_str(&content).map_err(|e| {
            ConfigError::new(format!("无法解析JSON配置文件 {}: {}", path_ref.display(), e.message))
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: TranslatorConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::new(e.to_string()))?;
        // 提前检查捕获值能否转换
        config.captures_record("captures")?;
        Ok(config)
    }

    /// 把捕获变量转换成一个 [`Record`]
    pub fn captures_record(&self, type_name: &str) -> Result<Record, ConfigError> {
        let mut record = Record::new(type_name);
        for (name, json) in &self.captures {
            record.insert(name.clone(), json_to_value(name, json)?);
        }
        Ok(record)
    }
}

/// JSON 值转换为运行时值; 规范格式的 UUID 字符串转换为 `UniqueId`
fn json_to_value(path: &str, json: &serde_json::Value) -> Result<Value, ConfigError> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Value::Int(i)),
            None => n
                .as_f64()
                .map(Value::Float)
                .ok_or_else(|| ConfigError::new(format!("{}: 数字超出范围", path))),
        },
        serde_json::Value::String(s) => match Uuid::parse_str(s) {
            Ok(id) if s.len() == 36 => Ok(Value::UniqueId(id)),
            _ => Ok(Value::Text(s.clone())),
        },
        serde_json::Value::Object(map) => {
            let mut record = Record::new(path);
            for (name, value) in map {
                record.insert(name.clone(), json_to_value(&format!("{}.{}", path, name), value)?);
            }
            Ok(record.into())
        }
        serde_json::Value::Array(_) => Err(ConfigError::new(format!("{}: 不支持数组", path))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Captured;
    use std::io::Write;

    #[test]
    fn test_load_valid_json_config() {
        let temp_file = "test_translator_config.json";
        let mut file = fs::File::create(temp_file).unwrap();
        writeln!(file, r#"{{
            "parenthesize_groups": true,
            "captures": {{ "name": "Namee", "age": 33 }}
        }}"#).unwrap();

        let config = TranslatorConfig::from_json_file(temp_file).unwrap();
        assert!(config.parenthesize_groups);
        assert_eq!(config.captures.len(), 2);

        fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_invalid_json_config() {
        let temp_file = "test_invalid_translator_config.json";
        let mut file = fs::File::create(temp_file).unwrap();
        writeln!(file, "invalid json").unwrap();

        let result = TranslatorConfig::from_json_file(temp_file);
        assert!(result.is_err());

        fs::remove_file(temp_file).ok();
    }

    #[test]
    fn test_missing_file() {
        let result = TranslatorConfig::from_json_file("non_existent_translator_config.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::new("缺少字段".to_string());
        assert_eq!(err.to_string(), "配置错误: 缺少字段");

        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert!(boxed.source().is_none());
    }

    #[test]
    fn test_default_config() {
        let config = TranslatorConfig::from_json_str("{}").unwrap();
        assert!(!config.parenthesize_groups);
        assert!(config.captures.is_empty());
    }

    #[test]
    fn test_captures_conversion() {
        let config = TranslatorConfig::from_json_str(
            r#"{ "captures": {
                "name": "Namee",
                "age": 33,
                "score": 1.5,
                "owner": { "Id": "f47ac10b-58cc-4372-a567-0e02b2c3d479" }
            } }"#,
        )
        .unwrap();
        let record = config.captures_record("captures").unwrap();

        assert_eq!(record.member("name"), Some(Value::Text("Namee".to_string())));
        assert_eq!(record.member("age"), Some(Value::Int(33)));
        assert_eq!(record.member("score"), Some(Value::Float(1.5)));

        let Some(Value::Object(owner)) = record.member("owner") else {
            panic!("Expected owner object");
        };
        assert_eq!(owner.type_name(), "owner");
        assert_eq!(
            owner.member("Id"),
            Some(Value::UniqueId(Uuid::parse_str("f47ac10b-58cc-4372-a567-0e02b2c3d479").unwrap()))
        );
    }

    #[test]
    fn test_array_capture_is_rejected() {
        let result = TranslatorConfig::from_json_str(r#"{ "captures": { "ids": [1, 2] } }"#);
        assert!(result.is_err());
    }
}
