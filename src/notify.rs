// src/notify.rs — 桌面通知，降级到 stderr

#[derive(Debug, Clone, Copy)]
pub enum Urgency {
    Low,
    Normal,
    Critical,
}

impl Urgency {
    fn as_str(self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Normal => "normal",
            Urgency::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Notifier {
    desktop: bool,
}

impl Notifier {
    pub fn new(desktop: bool) -> Self {
        Self { desktop }
    }

    pub fn send(&self, urgency: Urgency, title: &str, body: &str) {
        let u = urgency.as_str();
        // 优先 notify-send
        let shown = self.desktop
            && std::process::Command::new("notify-send")
                .args(["-a", "wifi2qr", "-u", u, &format!("WiFi2QR: {title}"), body])
                .status()
                .map(|s| s.success())
                .unwrap_or(false);

        if !shown {
            eprintln!("{}", console_line(urgency, title, body));
        }
    }

    pub fn low(&self, title: &str, body: &str) {
        self.send(Urgency::Low, title, body)
    }

    pub fn normal(&self, title: &str, body: &str) {
        self.send(Urgency::Normal, title, body)
    }

    pub fn critical(&self, title: &str, body: &str) {
        self.send(Urgency::Critical, title, body)
    }
}

fn console_line(urgency: Urgency, title: &str, body: &str) -> String {
    if body.is_empty() {
        format!("[{}] WiFi2QR: {title}", urgency.as_str())
    } else {
        format!("[{}] WiFi2QR: {title}: {body}", urgency.as_str())
    }
}
