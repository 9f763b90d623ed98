use serde::{Deserialize, Serialize};

/// The five record types managed through the backend API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Coordinates,
    Location,
    Person,
    Discipline,
    LabWork,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Coordinates,
        ResourceKind::Location,
        ResourceKind::Person,
        ResourceKind::Discipline,
        ResourceKind::LabWork,
    ];

    /// Collection segment under the API base, e.g. `labworks`.
    pub fn collection(&self) -> &'static str {
        match self {
            ResourceKind::Coordinates => "coordinates",
            ResourceKind::Location => "locations",
            ResourceKind::Person => "person",
            ResourceKind::Discipline => "disciplines",
            ResourceKind::LabWork => "labworks",
        }
    }

    /// Listing of the caller's own records.
    pub fn my_path(&self) -> String { format!("{}/my", self.collection()) }

    pub fn record_path(&self, id: i64) -> String { format!("{}/{}", self.collection(), id) }

    /// Human label used in user-facing messages ("lab works", "coordinates").
    pub fn plural_label(&self) -> &'static str {
        match self {
            ResourceKind::Coordinates => "coordinates",
            ResourceKind::Location => "locations",
            ResourceKind::Person => "persons",
            ResourceKind::Discipline => "disciplines",
            ResourceKind::LabWork => "lab works",
        }
    }

    /// Lenient parse accepting the collection segment, the singular name, or the enum name.
    pub fn parse(s: &str) -> Option<ResourceKind> {
        let norm = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match norm.as_str() {
            "coordinates" | "coordinate" | "coords" => Some(ResourceKind::Coordinates),
            "location" | "locations" => Some(ResourceKind::Location),
            "person" | "persons" | "people" => Some(ResourceKind::Person),
            "discipline" | "disciplines" => Some(ResourceKind::Discipline),
            "labwork" | "labworks" => Some(ResourceKind::LabWork),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResourceKind::Coordinates => "Coordinates",
            ResourceKind::Location => "Location",
            ResourceKind::Person => "Person",
            ResourceKind::Discipline => "Discipline",
            ResourceKind::LabWork => "LabWork",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths() {
        assert_eq!(ResourceKind::Coordinates.my_path(), "coordinates/my");
        assert_eq!(ResourceKind::Location.my_path(), "locations/my");
        assert_eq!(ResourceKind::Person.my_path(), "person/my");
        assert_eq!(ResourceKind::Discipline.record_path(4), "disciplines/4");
        assert_eq!(ResourceKind::LabWork.record_path(9), "labworks/9");
    }

    #[test]
    fn parse_accepts_common_spellings() {
        assert_eq!(ResourceKind::parse("lab-work"), Some(ResourceKind::LabWork));
        assert_eq!(ResourceKind::parse("LabWorks"), Some(ResourceKind::LabWork));
        assert_eq!(ResourceKind::parse("person"), Some(ResourceKind::Person));
        assert_eq!(ResourceKind::parse("coordinate"), Some(ResourceKind::Coordinates));
        assert_eq!(ResourceKind::parse("admin"), None);
    }
}
