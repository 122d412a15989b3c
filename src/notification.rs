//! Desktop notifications for finished workflow runs.
//!
//! Delivery shells out to whatever the platform provides. A failed delivery
//! is advisory: it is logged and the message is printed on the console
//! instead.

use log::debug;
use std::process::Command;

use crate::error::{advise, Error, Result};

/// Sends a desktop notification, falling back to a console line.
pub fn notify(title: &str, message: &str) {
    if advise("desktop notification", send(title, message)).is_none() {
        println!("\n🔔 {}: {}", title, message);
    }
}

fn send(title: &str, message: &str) -> Result<()> {
    let mut command = match platform_command(std::env::consts::OS, title, message) {
        Some(command) => command,
        None => {
            println!("\n🔔 {}: {}", title, message);
            return Ok(());
        }
    };
    debug!("sending notification via {:?}", command.get_program());

    let status = command.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Advisory {
            operation: format!("{:?}", command.get_program()),
            message: format!("exited with {}", status),
        })
    }
}

fn platform_command(os: &str, title: &str, message: &str) -> Option<Command> {
    match os {
        "macos" => {
            let mut command = Command::new("osascript");
            command.arg("-e").arg(format!(
                "display notification \"{}\" with title \"{}\" sound name \"default\"",
                applescript_escape(message),
                applescript_escape(title)
            ));
            Some(command)
        }
        "linux" | "freebsd" | "openbsd" | "netbsd" => {
            let mut command = Command::new("notify-send");
            command.arg(title).arg(message);
            Some(command)
        }
        "windows" => {
            let mut command = Command::new("powershell");
            command.arg("-Command").arg(toast_script(title, message));
            Some(command)
        }
        _ => None,
    }
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn toast_script(title: &str, message: &str) -> String {
    format!(
        r#"[Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null
[Windows.Data.Xml.Dom.XmlDocument, Windows.Data.Xml.Dom.XmlDocument, ContentType = WindowsRuntime] | Out-Null
$xml = New-Object Windows.Data.Xml.Dom.XmlDocument
$xml.LoadXml('<toast><visual><binding template="ToastText02"><text id="1">{}</text><text id="2">{}</text></binding></visual></toast>')
$toast = New-Object Windows.UI.Notifications.ToastNotification $xml
[Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier("Forklift").Show($toast)"#,
        xml_escape(title).replace('\'', "''"),
        xml_escape(message).replace('\'', "''")
    )
}
