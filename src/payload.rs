// src/payload.rs — Wi-Fi 二维码内容（`WIFI:T:..;S:..;P:..;;`）

use crate::error::PipelineResult;
use crate::types::{Credential, Encryption};

/// 转义后的内容字符串，可直接交给二维码编码器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedPayload(String);

impl EscapedPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 字节长度（二维码容量按字节计）
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for EscapedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 校验原始输入并生成内容
pub fn encode(ssid: &str, password: &str, encryption: Encryption) -> PipelineResult<EscapedPayload> {
    Ok(encode_credential(&Credential::new(ssid, password, encryption)?))
}

/// 开放网络不带 `P:` 字段
pub fn encode_credential(cred: &Credential) -> EscapedPayload {
    let token = cred.encryption().payload_token();
    let ssid = escape_field(cred.ssid());
    let text = if cred.encryption().needs_password() {
        let pass = escape_field(cred.password());
        format!("WIFI:T:{token};S:{ssid};P:{pass};;")
    } else {
        format!("WIFI:T:{token};S:{ssid};;")
    };
    EscapedPayload(text)
}

/// 用反斜杠转义 `\ ; , :`；单遍处理，插入的反斜杠不会被再次转义
pub fn escape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        if matches!(c, '\\' | ';' | ',' | ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// [`escape_field`] 的逆操作
#[cfg(test)]
fn unescape_field(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}
