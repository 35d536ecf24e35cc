use serde::{Deserialize, Serialize};

/// Well-known tag categories. Unknown tags fall into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    Urgent,
    Important,
    Optional,
    DeepWork,
    QuickWin,
    Other,
}

impl TagKind {
    /// Case-sensitive match on the tag labels the UI offers.
    pub fn classify(tag: &str) -> Self {
        match tag {
            "Urgent" => TagKind::Urgent,
            "Important" => TagKind::Important,
            "Optional" => TagKind::Optional,
            "Deep Work" => TagKind::DeepWork,
            "Quick Win" => TagKind::QuickWin,
            _ => TagKind::Other,
        }
    }

    /// Base colour name used when highlighting the tag.
    pub fn color(&self) -> &'static str {
        match self {
            TagKind::Urgent => "red",
            TagKind::Important => "orange",
            TagKind::Optional => "gray",
            TagKind::DeepWork => "indigo",
            TagKind::QuickWin => "green",
            TagKind::Other => "blue",
        }
    }

    /// ANSI SGR foreground code for terminal output.
    pub fn ansi_code(&self) -> u8 {
        match self {
            TagKind::Urgent => 31,
            TagKind::Important => 33,
            TagKind::Optional => 90,
            TagKind::DeepWork => 35,
            TagKind::QuickWin => 32,
            TagKind::Other => 34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_classify() {
        assert_eq!(TagKind::classify("Deep Work"), TagKind::DeepWork);
        assert_eq!(TagKind::classify("Quick Win").color(), "green");
        assert_eq!(TagKind::classify("urgent"), TagKind::Other);
    }
}
