use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of document types a document can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    Invoice,
    Contract,
    Earnings,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Invoice, Label::Contract, Label::Earnings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Invoice => "Invoice",
            Label::Contract => "Contract",
            Label::Earnings => "Earnings",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown label: {0:?}")]
pub struct UnknownLabel(pub String);

impl FromStr for Label {
    type Err = UnknownLabel;

    /// Case-insensitive match against the label names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Label::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!("Invoice".parse::<Label>().unwrap(), Label::Invoice);
        assert_eq!("contract".parse::<Label>().unwrap(), Label::Contract);
        assert_eq!("EARNINGS".parse::<Label>().unwrap(), Label::Earnings);
        assert!("Receipt".parse::<Label>().is_err());
        assert!("".parse::<Label>().is_err());
    }

    #[test]
    fn test_serde_uses_label_names() {
        let json = serde_json::to_string(&Label::Earnings).unwrap();
        assert_eq!(json, "\"Earnings\"");
        let back: Label = serde_json::from_str("\"Contract\"").unwrap();
        assert_eq!(back, Label::Contract);
    }
}
