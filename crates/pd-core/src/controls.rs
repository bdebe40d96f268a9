//! Control identifiers and their closed value domains

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ControlError;

/// Identifies one user-settable input on the dashboard page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    /// Category selector driving the line chart
    Category,
    /// Summer/winter checklist driving the bar charts
    Types,
    /// Map point currently under the pointer
    Hover,
}

impl ControlId {
    pub const ALL: [ControlId; 3] = [ControlId::Category, ControlId::Types, ControlId::Hover];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlId::Category => "category",
            ControlId::Types => "types",
            ControlId::Hover => "hover",
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlId {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" => Ok(ControlId::Category),
            "types" => Ok(ControlId::Types),
            "hover" => Ok(ControlId::Hover),
            // Not aimed at any known control; report against the selector
            other => Err(ControlError::InvalidParameter {
                control: ControlId::Category,
                value: other.to_string(),
            }),
        }
    }
}

/// Edition attribute plotted by the line chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Events,
    Sports,
    Countries,
    Participants,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::Events,
        Feature::Sports,
        Feature::Countries,
        Feature::Participants,
    ];

    /// Column name in both the flat and the relational record sets
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Events => "events",
            Feature::Sports => "sports",
            Feature::Countries => "countries",
            Feature::Participants => "participants",
        }
    }

    /// Axis label: the column name with a leading capital
    pub fn axis_label(&self) -> String {
        capitalize(self.as_str())
    }
}

impl Default for Feature {
    fn default() -> Self {
        Feature::Events
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Feature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == normalized)
            .ok_or_else(|| ControlError::InvalidParameter {
                control: ControlId::Category,
                value: s.to_string(),
            })
    }
}

/// Summer or winter games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamesType {
    Summer,
    Winter,
}

impl GamesType {
    pub const ALL: [GamesType; 2] = [GamesType::Summer, GamesType::Winter];

    pub fn as_str(&self) -> &'static str {
        match self {
            GamesType::Summer => "summer",
            GamesType::Winter => "winter",
        }
    }
}

impl fmt::Display for GamesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GamesType {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summer" => Ok(GamesType::Summer),
            "winter" => Ok(GamesType::Winter),
            _ => Err(ControlError::InvalidParameter {
                control: ControlId::Types,
                value: s.to_string(),
            }),
        }
    }
}

/// Ordered, duplicate-free, non-empty selection of games types
///
/// Order is preserved exactly as supplied: the bar chart collection renders
/// one chart per entry in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GamesType>", into = "Vec<GamesType>")]
pub struct TypeChecklist(Vec<GamesType>);

impl TypeChecklist {
    pub fn new(types: Vec<GamesType>) -> Result<Self, ControlError> {
        if types.is_empty() {
            return Err(ControlError::EmptyChecklist);
        }
        for (idx, games_type) in types.iter().enumerate() {
            if types[..idx].contains(games_type) {
                return Err(ControlError::DuplicateType(*games_type));
            }
        }
        Ok(Self(types))
    }

    pub fn as_slice(&self) -> &[GamesType] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = GamesType> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, games_type: GamesType) -> bool {
        self.0.contains(&games_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TypeChecklist {
    fn default() -> Self {
        Self(vec![GamesType::Summer])
    }
}

impl TryFrom<Vec<GamesType>> for TypeChecklist {
    type Error = ControlError;

    fn try_from(types: Vec<GamesType>) -> Result<Self, Self::Error> {
        Self::new(types)
    }
}

impl From<TypeChecklist> for Vec<GamesType> {
    fn from(checklist: TypeChecklist) -> Self {
        checklist.0
    }
}

/// Structured key for one edition: the host name and the year it was held
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostYear {
    pub host: String,
    pub year: i32,
}

impl HostYear {
    pub fn new(host: impl Into<String>, year: i32) -> Self {
        Self {
            host: host.into(),
            year,
        }
    }

    /// Parse the `"{host} {year}"` display label shown on map points.
    ///
    /// The split happens at the last whitespace, so multi-word hosts parse.
    /// The year part must be exactly four ASCII digits.
    pub fn parse_label(label: &str) -> Result<Self, ControlError> {
        let malformed = || ControlError::MalformedKey(label.to_string());
        let trimmed = label.trim();
        let (host, year) = trimmed
            .rsplit_once(char::is_whitespace)
            .ok_or_else(malformed)?;
        let host = host.trim();
        if host.is_empty() || year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let year = year.parse::<i32>().map_err(|_| malformed())?;
        Ok(Self::new(host, year))
    }

    /// Display label, the inverse of [`HostYear::parse_label`]
    pub fn label(&self) -> String {
        format!("{} {}", self.host, self.year)
    }
}

impl fmt::Display for HostYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.host, self.year)
    }
}

impl FromStr for HostYear {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s)
    }
}

/// Current value of one control, tagged by the control it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "control", content = "value", rename_all = "snake_case")]
pub enum ControlValue {
    Category(Feature),
    Types(TypeChecklist),
    Hover(Option<HostYear>),
}

impl ControlValue {
    pub fn control_id(&self) -> ControlId {
        match self {
            ControlValue::Category(_) => ControlId::Category,
            ControlValue::Types(_) => ControlId::Types,
            ControlValue::Hover(_) => ControlId::Hover,
        }
    }

    /// Value a control holds before the user touches it
    pub fn default_for(control: ControlId) -> Self {
        match control {
            ControlId::Category => ControlValue::Category(Feature::default()),
            ControlId::Types => ControlValue::Types(TypeChecklist::default()),
            ControlId::Hover => ControlValue::Hover(None),
        }
    }

    /// Parse a renderer's string payload for `control`.
    ///
    /// The category selector takes exactly one value, the checklist takes the
    /// selected types in display order, and the hover target takes the label
    /// words of a map point (no words clears the hover).
    pub fn parse(control: ControlId, args: &[&str]) -> Result<Self, ControlError> {
        match control {
            ControlId::Category => match args {
                [feature] => Ok(ControlValue::Category(feature.parse()?)),
                _ => Err(ControlError::InvalidParameter {
                    control,
                    value: args.join(" "),
                }),
            },
            ControlId::Types => {
                let types = args
                    .iter()
                    .map(|arg| arg.parse::<GamesType>())
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ControlValue::Types(TypeChecklist::new(types)?))
            }
            ControlId::Hover => {
                if args.iter().all(|arg| arg.trim().is_empty()) {
                    Ok(ControlValue::Hover(None))
                } else {
                    Ok(ControlValue::Hover(Some(HostYear::parse_label(&args.join(" "))?)))
                }
            }
        }
    }

    /// Re-check domain invariants on values that bypassed the constructors
    pub fn validate(&self) -> Result<(), ControlError> {
        match self {
            ControlValue::Category(_) => Ok(()),
            ControlValue::Types(checklist) => TypeChecklist::new(checklist.as_slice().to_vec()).map(|_| ()),
            ControlValue::Hover(None) => Ok(()),
            ControlValue::Hover(Some(key)) => {
                if key.host.trim().is_empty() || !(1000..=9999).contains(&key.year) {
                    Err(ControlError::MalformedKey(key.label()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_id_parse() {
        for control in ControlId::ALL {
            assert_eq!(control.as_str().parse::<ControlId>(), Ok(control));
        }
        assert_eq!(" Hover ".parse::<ControlId>(), Ok(ControlId::Hover));
        assert!("dropdown-category".parse::<ControlId>().is_err());
        assert!("map".parse::<ControlId>().is_err());
    }

    #[test]
    fn test_feature_parse_is_case_insensitive() {
        assert_eq!("Sports".parse::<Feature>(), Ok(Feature::Sports));
        assert_eq!(" participants ".parse::<Feature>(), Ok(Feature::Participants));
    }

    #[test]
    fn test_feature_rejects_medals() {
        let err = "medals".parse::<Feature>().unwrap_err();
        assert_eq!(
            err,
            ControlError::InvalidParameter {
                control: ControlId::Category,
                value: "medals".to_string(),
            }
        );
    }

    #[test]
    fn test_checklist_keeps_given_order() {
        let checklist = TypeChecklist::new(vec![GamesType::Winter, GamesType::Summer]).unwrap();
        assert_eq!(checklist.as_slice(), &[GamesType::Winter, GamesType::Summer]);
    }

    #[test]
    fn test_checklist_rejects_empty_and_duplicates() {
        assert_eq!(TypeChecklist::new(vec![]), Err(ControlError::EmptyChecklist));
        assert_eq!(
            TypeChecklist::new(vec![GamesType::Summer, GamesType::Summer]),
            Err(ControlError::DuplicateType(GamesType::Summer))
        );
    }

    #[test]
    fn test_checklist_deserialize_validates() {
        let ok: TypeChecklist = serde_json::from_str(r#"["winter","summer"]"#).unwrap();
        assert_eq!(ok.as_slice(), &[GamesType::Winter, GamesType::Summer]);
        assert!(serde_json::from_str::<TypeChecklist>("[]").is_err());
    }

    #[test]
    fn test_host_year_parses_multi_word_hosts() {
        let key = HostYear::parse_label("Salt Lake City 2002").unwrap();
        assert_eq!(key, HostYear::new("Salt Lake City", 2002));
        assert_eq!(key.label(), "Salt Lake City 2002");
    }

    #[test]
    fn test_host_year_rejects_malformed_labels() {
        for label in ["Sydney", "Sydney2000", "2000", "Sydney 20000", "Sydney 2k00", " 2000"] {
            assert!(
                matches!(HostYear::parse_label(label), Err(ControlError::MalformedKey(_))),
                "accepted {label:?}"
            );
        }
    }

    #[test]
    fn test_control_value_parse() {
        assert_eq!(
            ControlValue::parse(ControlId::Category, &["countries"]),
            Ok(ControlValue::Category(Feature::Countries))
        );
        assert_eq!(
            ControlValue::parse(ControlId::Hover, &["Tel", "Aviv", "1968"]),
            Ok(ControlValue::Hover(Some(HostYear::new("Tel Aviv", 1968))))
        );
        assert_eq!(ControlValue::parse(ControlId::Hover, &[]), Ok(ControlValue::Hover(None)));
        assert_eq!(
            ControlValue::parse(ControlId::Types, &[]),
            Err(ControlError::EmptyChecklist)
        );
        assert!(ControlValue::parse(ControlId::Category, &["events", "sports"]).is_err());
    }

    #[test]
    fn test_axis_label() {
        assert_eq!(Feature::Participants.axis_label(), "Participants");
    }
}
