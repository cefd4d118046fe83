use serde::Serialize;

/// Pixel density a member file serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Scale {
    #[serde(rename = "1x")]
    One,
    #[serde(rename = "2x")]
    Two,
    #[serde(rename = "3x")]
    Three,
}

impl Scale {
    /// File-stem suffix: `""`, `"@2x"`, `"@3x"`.
    pub fn suffix(self) -> &'static str {
        match self {
            Scale::One => "",
            Scale::Two => "@2x",
            Scale::Three => "@3x",
        }
    }

    /// Value of the manifest's `scale` field.
    pub fn as_manifest(self) -> &'static str {
        match self {
            Scale::One => "1x",
            Scale::Two => "2x",
            Scale::Three => "3x",
        }
    }

    pub fn from_manifest(value: &str) -> Option<Self> {
        match value {
            "1x" => Some(Scale::One),
            "2x" => Some(Scale::Two),
            "3x" => Some(Scale::Three),
            _ => None,
        }
    }

    /// Split a file stem into its base and density: `logo@2x` → (`logo`, Two).
    pub fn split_stem(stem: &str) -> (&str, Scale) {
        for scale in [Scale::Two, Scale::Three] {
            if let Some(base) = stem.strip_suffix(scale.suffix()) {
                return (base, scale);
            }
        }
        (stem, Scale::One)
    }
}
