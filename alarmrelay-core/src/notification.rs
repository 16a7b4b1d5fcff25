use crate::contracts::NotificationMessage;
use crate::models::EnrichedEvent;
use chrono::NaiveDateTime;
use std::fmt::Write;
use tracing::warn;

/// Used when the configured `time_format` cannot be rendered.
const FALLBACK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Assembles the outgoing message. Pure; no failure path.
#[derive(Debug, Clone)]
pub struct NotificationBuilder {
    time_format: String,
}

impl Default for NotificationBuilder {
    fn default() -> Self {
        Self::new(crate::config::RelayConfig::default().time_format)
    }
}

impl NotificationBuilder {
    pub fn new(time_format: impl Into<String>) -> Self {
        Self { time_format: time_format.into() }
    }

    pub fn build(&self, enriched: &EnrichedEvent) -> NotificationMessage {
        let event = &enriched.event;
        NotificationMessage {
            element: enriched.element_name.clone(),
            parameter: parameter_label(
                enriched.parameter_name.as_deref(),
                event.parameter_instance.as_deref(),
            ),
            value: event.alarm_value.clone(),
            severity: event.severity_label.clone(),
            time: self.render_time(&event.alarm_time),
            kind: event.type_label.clone(),
        }
    }

    fn render_time(&self, time: &NaiveDateTime) -> String {
        let mut out = String::new();
        if write!(out, "{}", time.format(&self.time_format)).is_ok() {
            return out;
        }
        warn!(format = %self.time_format, "time format not renderable, using default");
        time.format(FALLBACK_TIME_FORMAT).to_string()
    }
}

/// "{name} - {instance}" for table parameters, else just the name.
/// An unknown name renders as empty, so it still reads " - {instance}".
pub fn parameter_label(name: Option<&str>, instance: Option<&str>) -> String {
    let name = name.unwrap_or_default();
    match instance.filter(|i| !i.is_empty()) {
        Some(instance) => format!("{} - {}", name, instance),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DecodedEvent, EndpointRef};
    use chrono::NaiveDate;

    #[test]
    fn test_parameter_label() {
        assert_eq!(parameter_label(Some("Signal Level"), Some("3")), "Signal Level - 3");
        assert_eq!(parameter_label(Some("Signal Level"), None), "Signal Level");
        assert_eq!(parameter_label(Some("Signal Level"), Some("")), "Signal Level");
        assert_eq!(parameter_label(None, Some("3")), " - 3");
        assert_eq!(parameter_label(None, None), "");
    }

    fn enriched() -> EnrichedEvent {
        EnrichedEvent {
            event: DecodedEvent {
                source_host_id: 1,
                source_element_id: 2,
                parameter_id: 3,
                parameter_instance: Some("3".into()),
                severity_label: "Minor".into(),
                type_label: "Escalated from Warning".into(),
                alarm_value: "-71 dBm".into(),
                alarm_time: NaiveDate::from_ymd_opt(2024, 8, 12)
                    .unwrap()
                    .and_hms_opt(10, 5, 9)
                    .unwrap(),
            },
            element_name: "Encoder 01".into(),
            parameter_name: Some("Signal Level".into()),
            destination: EndpointRef { host_id: 7, element_id: 8 },
        }
    }

    #[test]
    fn test_build() {
        let enriched = enriched();

        let message = NotificationBuilder::default().build(&enriched);
        assert_eq!(
            message,
            NotificationMessage {
                element: "Encoder 01".into(),
                parameter: "Signal Level - 3".into(),
                value: "-71 dBm".into(),
                severity: "Minor".into(),
                time: "2024-08-12 10:05:09".into(),
                kind: "Escalated from Warning".into(),
            }
        );

        let message = NotificationBuilder::new("%d/%m/%Y %H:%M").build(&enriched);
        assert_eq!(message.time, "12/08/2024 10:05");
    }

    #[test]
    fn test_unknown_name_keeps_separator() {
        let mut enriched = enriched();
        enriched.parameter_name = None;

        let message = NotificationBuilder::default().build(&enriched);
        assert_eq!(message.parameter, " - 3");
    }

    #[test]
    fn test_unrenderable_format_falls_back() {
        let message = NotificationBuilder::new("%Q").build(&enriched());
        assert_eq!(message.time, "2024-08-12 10:05:09");
    }
}
