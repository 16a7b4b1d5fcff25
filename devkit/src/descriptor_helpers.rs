/*!
Helpers to build raw alarm descriptors for tests

Produces the `|`-delimited line the platform emits, with sensible defaults
for every position so a test only sets the fields it cares about.
*/

use alarmrelay_core::decoder::{field, DELIMITER};
use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    fields: Vec<String>,
}

impl Default for DescriptorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorBuilder {
    /// Host 1, element 2, parameter 3, Critical/Open, value "OK".
    pub fn new() -> Self {
        let mut fields = vec![String::new(); field::REQUIRED];
        fields[0] = "0".into();
        fields[field::HOST_ID] = "1".into();
        fields[field::ELEMENT_ID] = "2".into();
        fields[field::PARAMETER_ID] = "3".into();
        fields[field::SEVERITY] = "1".into();
        fields[field::TYPE] = "12".into();
        fields[field::VALUE] = "OK".into();
        fields[field::TIMESTAMP] = "2024-08-12T10:00:00".into();
        Self { fields }
    }

    /// Sets any position, growing the line when needed.
    pub fn set<S: Into<String>>(mut self, index: usize, value: S) -> Self {
        if index >= self.fields.len() {
            self.fields.resize(index + 1, String::new());
        }
        self.fields[index] = value.into();
        self
    }

    pub fn source(self, host_id: i32, element_id: i32) -> Self {
        self.set(field::HOST_ID, host_id.to_string())
            .set(field::ELEMENT_ID, element_id.to_string())
    }

    pub fn parameter(self, parameter_id: i32) -> Self {
        self.set(field::PARAMETER_ID, parameter_id.to_string())
    }

    pub fn instance<S: Into<String>>(self, instance: S) -> Self {
        self.set(field::PARAMETER_INSTANCE, instance)
    }

    pub fn severity(self, code: i32) -> Self {
        self.set(field::SEVERITY, code.to_string())
    }

    pub fn kind(self, code: i32) -> Self {
        self.set(field::TYPE, code.to_string())
    }

    pub fn value<S: Into<String>>(self, value: S) -> Self {
        self.set(field::VALUE, value)
    }

    pub fn time(self, time: NaiveDateTime) -> Self {
        self.set(field::TIMESTAMP, time.format("%Y-%m-%dT%H:%M:%S").to_string())
    }

    /// Cuts the line to its first `count` fields.
    pub fn truncate(mut self, count: usize) -> Self {
        self.fields.truncate(count);
        self
    }

    pub fn build(&self) -> String {
        self.fields.join(&DELIMITER.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alarmrelay_core::EventDecoder;

    #[test]
    fn test_default_descriptor_decodes() {
        let raw = DescriptorBuilder::new().build();
        assert_eq!(raw.split('|').count(), 12);

        let event = EventDecoder::default().decode(&raw).unwrap().unwrap();
        assert_eq!(event.source_host_id, 1);
        assert_eq!(event.severity_label, "Critical");
        assert_eq!(event.type_label, "Open");
    }

    #[test]
    fn test_builder_setters() {
        let raw = DescriptorBuilder::new()
            .source(12, 345)
            .parameter(1002)
            .instance("Slot 4")
            .severity(4)
            .kind(35)
            .value("-71 dBm")
            .build();

        assert_eq!(raw, "0|12|345|1002|Slot 4|||4|35||-71 dBm|2024-08-12T10:00:00");
        assert_eq!(DescriptorBuilder::new().truncate(5).build(), "0|1|2|3|");
    }
}
