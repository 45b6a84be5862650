// src/types.rs — 所有核心数据类型

use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 加密方式，仅限手机扫码能识别的几种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Encryption {
    Open,
    Wep,
    #[default]
    Wpa,
    Wpa2,
    Wpa3,
}

impl Encryption {
    /// 全部取值，按表单中的顺序
    pub const ALL: [Encryption; 5] = [
        Encryption::Wpa2,
        Encryption::Wpa3,
        Encryption::Wpa,
        Encryption::Wep,
        Encryption::Open,
    ];

    pub fn needs_password(&self) -> bool {
        !matches!(self, Encryption::Open)
    }

    /// Wi-Fi 内容中 `T:` 字段的值
    pub fn payload_token(&self) -> &'static str {
        match self {
            Encryption::Open => "nopass",
            Encryption::Wep => "WEP",
            Encryption::Wpa | Encryption::Wpa2 | Encryption::Wpa3 => "WPA",
        }
    }
}

impl std::fmt::Display for Encryption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Encryption::Open => write!(f, "Open"),
            Encryption::Wep => write!(f, "WEP"),
            Encryption::Wpa => write!(f, "WPA"),
            Encryption::Wpa2 => write!(f, "WPA2"),
            Encryption::Wpa3 => write!(f, "WPA3"),
        }
    }
}

impl FromStr for Encryption {
    type Err = PipelineError;

    fn from_str(s: &str) -> PipelineResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "" | "OPEN" | "NONE" | "NOPASS" => Ok(Encryption::Open),
            "WEP" => Ok(Encryption::Wep),
            "WPA" => Ok(Encryption::Wpa),
            "WPA2" => Ok(Encryption::Wpa2),
            "WPA3" => Ok(Encryption::Wpa3),
            _ => Err(PipelineError::InvalidCredential(format!(
                "unsupported encryption type `{s}` (expected WPA, WPA2, WPA3, WEP or open)"
            ))),
        }
    }
}

impl TryFrom<String> for Encryption {
    type Error = PipelineError;

    fn try_from(s: String) -> PipelineResult<Self> {
        s.parse()
    }
}

impl From<Encryption> for String {
    fn from(e: Encryption) -> Self {
        e.to_string()
    }
}

/// 校验过的网络凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    ssid: String,
    password: String,
    encryption: Encryption,
}

impl Credential {
    /// 保留原样输入；trim 只用来判断是否为空
    pub fn new(ssid: &str, password: &str, encryption: Encryption) -> PipelineResult<Self> {
        if ssid.trim().is_empty() {
            return Err(PipelineError::InvalidCredential("SSID must not be empty".into()));
        }
        let password = if encryption.needs_password() {
            if password.trim().is_empty() {
                return Err(PipelineError::InvalidCredential(format!(
                    "{encryption} networks need a password"
                )));
            }
            password.to_string()
        } else {
            String::new()
        };
        Ok(Self {
            ssid: ssid.to_string(),
            password,
            encryption,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn encryption(&self) -> Encryption {
        self.encryption
    }
}

/// 表单提交的原始字段
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub ssid: String,
    pub password: String,
    pub encryption: Encryption,
}

impl Submission {
    pub fn credential(&self) -> PipelineResult<Credential> {
        Credential::new(&self.ssid, &self.password, self.encryption)
    }
}
