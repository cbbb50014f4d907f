use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One axis of the evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Privacy,
    Functionality,
    Infrastructure,
    Performance,
    Security,
}

impl Dimension {
    /// Fixed evaluation and report order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Privacy,
        Dimension::Functionality,
        Dimension::Infrastructure,
        Dimension::Performance,
        Dimension::Security,
    ];

    /// Key used in `evaluation_weights`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Privacy => "privacy",
            Dimension::Functionality => "functionality",
            Dimension::Infrastructure => "infrastructure",
            Dimension::Performance => "performance",
            Dimension::Security => "security",
        }
    }

    /// Human-readable label for the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Privacy => "Privacy Protection",
            Dimension::Functionality => "Functionality",
            Dimension::Infrastructure => "Infrastructure",
            Dimension::Performance => "Performance",
            Dimension::Security => "Security",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }

    /// Whether the dimension takes a live host snapshot.
    pub fn uses_host_metrics(&self) -> bool {
        matches!(
            self,
            Dimension::Infrastructure | Dimension::Performance | Dimension::Security
        )
    }

    /// Artificial work time when latency simulation is on.
    pub fn simulated_latency(&self) -> Duration {
        match self {
            Dimension::Privacy => Duration::from_millis(1000),
            Dimension::Functionality => Duration::from_millis(1200),
            Dimension::Infrastructure => Duration::from_millis(800),
            Dimension::Performance => Duration::from_millis(1500),
            Dimension::Security => Duration::from_millis(1300),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard label for an arbitrary weight key; unknown keys are shown as-is.
pub fn label_for(name: &str) -> &str {
    Dimension::parse(name).map(|d| d.label()).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for dimension in Dimension::ALL {
            assert_eq!(Dimension::parse(dimension.as_str()), Some(dimension));
        }
        assert_eq!(Dimension::parse("Privacy"), None);
    }

    #[test]
    fn test_host_metric_dimensions() {
        let live: Vec<_> = Dimension::ALL
            .into_iter()
            .filter(Dimension::uses_host_metrics)
            .collect();
        assert_eq!(
            live,
            [
                Dimension::Infrastructure,
                Dimension::Performance,
                Dimension::Security
            ]
        );
    }

    #[test]
    fn test_label_for_unknown_key() {
        assert_eq!(label_for("privacy"), "Privacy Protection");
        assert_eq!(label_for("latency"), "latency");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Dimension::Infrastructure).unwrap();
        assert_eq!(json, "\"infrastructure\"");
    }
}
