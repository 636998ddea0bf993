use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommandStatus {
    Ok,
    Error,
}

/// Envelope printed by `--json` front ends
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CommandResponse {
    pub status: CommandStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl CommandResponse {
    pub fn ok<T: Serialize>(data: &T) -> Result<Self> {
        Ok(Self {
            status: CommandStatus::Ok,
            message: None,
            data: serde_json::to_value(data)?,
        })
    }

    pub fn ok_with_message<T: Serialize>(data: &T, message: impl Into<String>) -> Result<Self> {
        let mut response = Self::ok(data)?;
        response.message = Some(message.into());
        Ok(response)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: CommandStatus::Error,
            message: Some(message.into()),
            data: Value::Null,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, CommandStatus::Error)
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn ok_envelope_omits_message() {
        let response = CommandResponse::ok(&json!({"countsByActor": {}})).unwrap();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "ok", "data": {"countsByActor": {}}})
        );
        assert!(!response.is_error());
    }

    #[test]
    fn error_envelope_carries_message_and_null_data() {
        let response = CommandResponse::error("config file not found");
        let raw = serialize_json(&response).unwrap();
        assert_eq!(
            raw,
            r#"{"status":"error","message":"config file not found","data":null}"#
        );
        let parsed: CommandResponse = serde_json::from_str(&raw).unwrap();
        assert!(parsed.is_error());
    }
}
