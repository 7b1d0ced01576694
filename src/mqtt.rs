//! MQTT client for remote control
//!
//! Connects to an MQTT broker and subscribes to a topic. Commands received
//! are forwarded to the main loop, which applies them as if the matching
//! keys had been pressed.

use rumqttc::{Client, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

/// Commands accepted over MQTT
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Switch to the named theme
    Theme(String),
    NextTheme,
    PrevTheme,
    Pause,
    Resume,
    /// Set the scroll speed in rows per second
    Rate(f32),
    Quit,
}

/// JSON format for incoming messages (optional; plain text also works)
#[derive(Deserialize)]
struct JsonMessage {
    command: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

/// MQTT client that receives commands in a background thread
pub struct MqttClient {
    receiver: Receiver<Command>,
    _thread: thread::JoinHandle<()>,
}

impl MqttClient {
    /// Create a new MQTT client and connect to the broker.
    /// Fails immediately if connection cannot be established.
    pub fn new(host: &str, port: u16, topic: &str) -> Result<Self, String> {
        let mut options = MqttOptions::new("specfall", host, port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut connection) = Client::new(options, 10);

        client
            .subscribe(topic, QoS::AtMostOnce)
            .map_err(|e| format!("Failed to subscribe to topic '{}': {}", topic, e))?;

        // Test connection by polling once - fail fast if broker unreachable
        match connection.iter().next() {
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                return Err(format!(
                    "Failed to connect to MQTT broker at {}:{} - {}",
                    host, port, e
                ));
            }
            None => {
                return Err(format!(
                    "Failed to connect to MQTT broker at {}:{} - connection closed",
                    host, port
                ));
            }
        }

        let (sender, receiver) = mpsc::channel();
        let topic_owned = topic.to_string();

        let handle = thread::spawn(move || {
            Self::message_loop(connection, sender, &topic_owned);
        });

        eprintln!(
            "MQTT: Connected to {}:{}, subscribed to '{}'",
            host, port, topic
        );

        Ok(Self {
            receiver,
            _thread: handle,
        })
    }

    fn message_loop(mut connection: rumqttc::Connection, sender: Sender<Command>, topic: &str) {
        for event in connection.iter() {
            match event {
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    if publish.topic != topic {
                        continue;
                    }
                    if let Ok(text) = String::from_utf8(publish.payload.to_vec()) {
                        if let Some(cmd) = Self::parse_command(text.trim()) {
                            if sender.send(cmd).is_err() {
                                // Main thread gone, exit
                                break;
                            }
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("MQTT error: {}", e);
                    // Continue trying - connection may recover
                }
            }
        }
    }

    /// Parse a command from plain text ("theme radar", "pause", "rate 30")
    /// or the JSON form {"command": "theme", "value": "radar"}
    fn parse_command(text: &str) -> Option<Command> {
        if text.is_empty() {
            return None;
        }

        if let Ok(json) = serde_json::from_str::<JsonMessage>(text) {
            let value_str = json
                .value
                .as_ref()
                .and_then(|v| v.as_str())
                .map(str::to_string);
            let value_num = json.value.as_ref().and_then(|v| v.as_f64());
            return Self::command_from_parts(
                &json.command.to_lowercase(),
                value_str.as_deref(),
                value_num.map(|v| v as f32),
            );
        }

        let lower = text.to_lowercase();
        let mut parts = lower.splitn(2, char::is_whitespace);
        let head = parts.next()?;
        let rest = parts.next().map(str::trim);
        Self::command_from_parts(head, rest, rest.and_then(|r| r.parse().ok()))
    }

    fn command_from_parts(head: &str, value: Option<&str>, number: Option<f32>) -> Option<Command> {
        match head {
            "theme" => value.map(|v| Command::Theme(v.to_string())),
            "next" => Some(Command::NextTheme),
            "prev" | "previous" => Some(Command::PrevTheme),
            "pause" => Some(Command::Pause),
            "resume" | "run" => Some(Command::Resume),
            "rate" | "speed" => number.map(Command::Rate),
            "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }

    /// Get any pending commands (non-blocking)
    pub fn poll(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(cmd) = self.receiver.try_recv() {
            commands.push(cmd);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(
            MqttClient::parse_command("theme radar"),
            Some(Command::Theme("radar".to_string()))
        );
        assert_eq!(MqttClient::parse_command("pause"), Some(Command::Pause));
        assert_eq!(MqttClient::parse_command("NEXT"), Some(Command::NextTheme));
        assert_eq!(MqttClient::parse_command("rate 30"), Some(Command::Rate(30.0)));
        assert_eq!(MqttClient::parse_command("quit"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_json() {
        assert_eq!(
            MqttClient::parse_command(r#"{"command": "theme", "value": "sharp"}"#),
            Some(Command::Theme("sharp".to_string()))
        );
        assert_eq!(
            MqttClient::parse_command(r#"{"command": "rate", "value": 15.5}"#),
            Some(Command::Rate(15.5))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(MqttClient::parse_command(""), None);
        assert_eq!(MqttClient::parse_command("frobnicate"), None);
        assert_eq!(MqttClient::parse_command("rate fast"), None);
        assert_eq!(MqttClient::parse_command("theme"), None);
    }
}
