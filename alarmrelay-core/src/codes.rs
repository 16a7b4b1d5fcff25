//! Severity / state / category code table.
//!
//! The platform reuses one numeric space for severities, alarm lifecycle
//! states, source categories and transition flags. Downstream consumers match
//! on the rendered label text, so the table is kept exactly as emitted.

/// Label returned for any code outside the table.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Internal names indexed by code. Underscores become spaces on display.
const SEVERITY_CODES: [(i32, &str); 54] = [
    (1, "Critical"),
    (2, "Major"),
    (3, "Minor"),
    (4, "Warning"),
    (5, "Normal"),
    (6, "High"),
    (7, "Low"),
    (8, "Escalated"),
    (9, "Dropped"),
    (10, "NewAlarm"),
    (11, "Cleared"),
    (12, "Open"),
    (13, "Information"),
    (14, "Mobile_Gateway"),
    (15, "Service_Monitor"),
    (16, "DataMiner_System"),
    (17, "Timeout"),
    (18, "Not_Assigned"),
    (19, "Acknowledged"),
    (20, "Resolved"),
    (21, "Unresolved"),
    (22, "Comment_Added"),
    (23, "Correlation_Engine"),
    (24, "Error"),
    (25, "Mask"),
    (26, "Automation_Engine"),
    (27, "Unmask"),
    (28, "Notice"),
    (29, "WatchDog"),
    (30, "External"),
    (31, "Dropped_from_Critical"),
    (32, "Dropped_from_Major"),
    (33, "Dropped_from_Minor"),
    (34, "Dropped_from_Warning"),
    (35, "Escalated_from_Warning"),
    (36, "Escalated_from_Minor"),
    (37, "Escalated_from_Major"),
    (38, "Flipped"),
    (39, "Systemdisplay"),
    (40, "Service_impact_changed"),
    (41, "Value_changed"),
    (42, "Name_changed"),
    (43, "RCA_level_changed"),
    (44, "Element"),
    (45, "Service"),
    (46, "View"),
    (47, "Read_only"),
    (48, "Read_write"),
    (49, "Alarm"),
    (50, "Properties_changed"),
    (51, "Protocol"),
    (52, "Internal"),
    (53, "Threshold_changed"),
    (54, "Clearable"),
];

/// Internal (underscored) name for a code, if defined.
pub fn internal_name(code: i32) -> Option<&'static str> {
    SEVERITY_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Display label for a code. Never fails: undefined codes yield `"Unknown"`.
pub fn resolve(code: i32) -> String {
    match internal_name(code) {
        Some(name) => name.replace('_', " "),
        None => UNKNOWN_LABEL.to_string(),
    }
}

/// Number of defined codes.
pub fn len() -> usize {
    SEVERITY_CODES.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED: [&str; 54] = [
        "Critical", "Major", "Minor", "Warning", "Normal", "High", "Low",
        "Escalated", "Dropped", "NewAlarm", "Cleared", "Open", "Information",
        "Mobile Gateway", "Service Monitor", "DataMiner System", "Timeout",
        "Not Assigned", "Acknowledged", "Resolved", "Unresolved", "Comment Added",
        "Correlation Engine", "Error", "Mask", "Automation Engine", "Unmask",
        "Notice", "WatchDog", "External", "Dropped from Critical",
        "Dropped from Major", "Dropped from Minor", "Dropped from Warning",
        "Escalated from Warning", "Escalated from Minor", "Escalated from Major",
        "Flipped", "Systemdisplay", "Service impact changed", "Value changed",
        "Name changed", "RCA level changed", "Element", "Service", "View",
        "Read only", "Read write", "Alarm", "Properties changed", "Protocol",
        "Internal", "Threshold changed", "Clearable",
    ];

    #[test]
    fn test_every_defined_code() {
        assert_eq!(len(), 54);
        for (i, expected) in EXPECTED.iter().enumerate() {
            let code = i as i32 + 1;
            assert_eq!(resolve(code), *expected, "code {}", code);
        }
    }

    #[test]
    fn test_unknown_codes() {
        for code in [0, -1, 55, 100, i32::MAX, i32::MIN] {
            assert_eq!(resolve(code), UNKNOWN_LABEL);
        }
    }

    #[test]
    fn test_underscores_rendered_as_spaces() {
        assert_eq!(internal_name(14), Some("Mobile_Gateway"));
        assert_eq!(resolve(14), "Mobile Gateway");
        assert!(EXPECTED.iter().all(|label| !label.contains('_')));
    }
}
