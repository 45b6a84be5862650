// src/rofi.rs — 用 rofi -dmenu 拼出的输入表单

use crate::config::RofiConfig;
use crate::types::{Encryption, Submission};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// 通用 rofi dmenu；按 Esc 返回 `None`，确认空行返回 `Some("")`
pub async fn dmenu(items: &[String], prompt: &str, cfg: &RofiConfig, extra: &[&str]) -> Option<String> {
    let input = items.join("\n");
    let mut args = vec![
        "-dmenu".to_string(),
        "-p".to_string(),
        prompt.to_string(),
        "-font".to_string(),
        cfg.font.clone(),
        "-location".to_string(),
        cfg.position.to_string(),
        "-yoffset".to_string(),
        cfg.y_offset.to_string(),
        "-xoffset".to_string(),
        cfg.x_offset.to_string(),
    ];
    args.extend(extra.iter().map(|e| e.to_string()));

    let mut child = match Command::new("rofi")
        .args(&args)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .spawn()
    {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "cannot start rofi");
            return None;
        }
    };

    // 必须关闭 stdin，否则 rofi 会一直等待输入
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(input.as_bytes()).await;
    }

    let out = child.wait_with_output().await.ok()?;
    if out.status.success() {
        Some(strip_line_end(&String::from_utf8_lossy(&out.stdout)).to_string())
    } else {
        None
    }
}

/// 只去掉换行符；SSID 和密码里的空格是合法的
fn strip_line_end(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}

/// 密码输入框
pub async fn password_prompt(prompt: &str, cfg: &RofiConfig) -> Option<String> {
    dmenu(&[], prompt, cfg, &["-password", "-lines", "0"]).await
}

pub async fn input_prompt(prompt: &str, cfg: &RofiConfig) -> Option<String> {
    dmenu(&[], prompt, cfg, &["-lines", "0"]).await
}

/// 是/否确认框，`true` = 是
pub async fn confirm(message: &str, cfg: &RofiConfig) -> bool {
    let items = vec!["Yes".to_string(), "No".to_string()];
    matches!(
        dmenu(&items, message, cfg, &["-lines", "2", "-no-custom"]).await.as_deref(),
        Some("Yes")
    )
}

/// 选择加密方式，默认选中 `preset`
pub async fn choose_encryption(preset: Encryption, cfg: &RofiConfig) -> Option<Encryption> {
    let items: Vec<String> = Encryption::ALL.iter().map(|e| e.to_string()).collect();
    let selected = Encryption::ALL.iter().position(|e| *e == preset).unwrap_or(0).to_string();
    let lines = items.len().to_string();
    let choice = dmenu(
        &items,
        "Security: ",
        cfg,
        &["-lines", lines.as_str(), "-no-custom", "-selected-row", selected.as_str()],
    )
    .await?;
    choice.parse().ok()
}

/// 表单三项；任一项取消则返回 `None`
pub async fn read_submission(preset: Encryption, cfg: &RofiConfig) -> Option<Submission> {
    let ssid = input_prompt("SSID: ", cfg).await?;
    let encryption = choose_encryption(preset, cfg).await?;
    let password = if encryption.needs_password() {
        password_prompt("Password: ", cfg).await?
    } else {
        String::new()
    };
    Some(Submission {
        ssid,
        password,
        encryption,
    })
}
