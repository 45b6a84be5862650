// src/main.rs — 主入口 & CLI
mod app;
mod compose;
mod config;
mod error;
mod label;
mod lock;
mod logging;
mod notify;
mod output;
mod payload;
mod pipeline;
mod qr;
mod rofi;
mod types;

use anyhow::{bail, Context, Result};
use app::{Application, SubmitOutcome};
use clap::{Args, Parser, Subcommand};
use config::Config;
use std::io::BufRead;
use std::path::PathBuf;
use types::{Encryption, Submission};

// ════════════════════════════════════════════════════════════════
// CLI 参数
// ════════════════════════════════════════════════════════════════

#[derive(Parser)]
#[command(name = "wifi2qr", about = "Wi-Fi QR code generator", version)]
struct Cli {
    /// Config file to use instead of the default search
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Generate one QR image without the form
    Generate {
        #[command(flatten)]
        cred: CredentialArgs,
        /// Overrides `output_dir` from the config
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Overrides `prefix` from the config
        #[arg(long)]
        prefix: Option<String>,
        /// Print the artifact as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the escaped Wi-Fi payload
    Payload {
        #[command(flatten)]
        cred: CredentialArgs,
    },
    /// Show the QR code in the terminal
    Preview {
        #[command(flatten)]
        cred: CredentialArgs,
    },
}

#[derive(Args)]
struct CredentialArgs {
    #[arg(short, long)]
    ssid: String,
    #[arg(short, long, conflicts_with = "password_stdin")]
    password: Option<String>,
    /// Read the password from the first line of stdin
    #[arg(long)]
    password_stdin: bool,
    /// WPA, WPA2, WPA3, WEP or open (default from config)
    #[arg(short, long)]
    encryption: Option<Encryption>,
}

impl CredentialArgs {
    fn into_submission(self, default: Encryption) -> Result<Submission> {
        let password = if self.password_stdin {
            let mut line = String::new();
            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("reading password from stdin")?;
            line.trim_end_matches(['\n', '\r']).to_string()
        } else {
            self.password.unwrap_or_default()
        };
        Ok(Submission {
            ssid: self.ssid,
            password,
            encryption: self.encryption.unwrap_or(default),
        })
    }
}

// ════════════════════════════════════════════════════════════════
// 入口
// ════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut cfg = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            tracing::warn!(error = %format!("{e:#}"), "ignoring unreadable config file");
            Config::default()
        }),
    };

    match cli.cmd {
        None => Application::new(cfg).run_form().await?,

        Some(Cmd::Generate {
            cred,
            output_dir,
            prefix,
            json,
        }) => {
            if let Some(dir) = output_dir {
                cfg.output_dir = dir;
            }
            if let Some(prefix) = prefix {
                cfg.prefix = prefix;
            }
            let submission = cred.into_submission(cfg.encryption)?;
            // 无界面运行只输出到 stdout/stderr
            cfg.notify = false;
            let app = Application::new(cfg);
            match app.submit(&submission)? {
                SubmitOutcome::Saved(artifact) if json => {
                    println!("{}", serde_json::to_string_pretty(&artifact)?)
                }
                SubmitOutcome::Saved(artifact) => println!("{}", artifact.path.display()),
                SubmitOutcome::Busy => bail!("another QR code is being generated, try again"),
                SubmitOutcome::Failed(e) => return Err(e.into()),
            }
        }

        Some(Cmd::Payload { cred }) => {
            let s = cred.into_submission(cfg.encryption)?;
            println!("{}", payload::encode(&s.ssid, &s.password, s.encryption)?);
        }

        Some(Cmd::Preview { cred }) => {
            let cred = cred.into_submission(cfg.encryption)?.credential()?;
            let payload = payload::encode_credential(&cred);
            println!("{}", qr::preview(&payload, cfg.qr.error_correction)?);
            println!("  SSID: {}", cred.ssid());
        }
    }

    Ok(())
}
