use serde::{Deserialize, Serialize};

/// Business category. The backend has used several name fields over time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Category {
    pub fn display_name(&self) -> String {
        first_non_empty(&[&self.name, &self.category_name, &self.title])
            .unwrap_or_else(|| format!("Category {}", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Province {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub province_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Province {
    pub fn display_name(&self) -> String {
        first_non_empty(&[&self.name, &self.province_name, &self.title])
            .unwrap_or_else(|| format!("Province {}", self.id))
    }
}

/// Filter choices for the business directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryFilters {
    pub categories: Vec<Category>,
    pub provinces: Vec<Province>,
}

fn first_non_empty(candidates: &[&Option<String>]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_name_fallbacks() {
        let c: Category = serde_json::from_str(r#"{"id":3,"name":"Bakery"}"#).unwrap();
        assert_eq!(c.display_name(), "Bakery");

        let c: Category =
            serde_json::from_str(r#"{"id":3,"name":"","category_name":"Food"}"#).unwrap();
        assert_eq!(c.display_name(), "Food");

        let c: Category = serde_json::from_str(r#"{"id":3}"#).unwrap();
        assert_eq!(c.display_name(), "Category 3");
    }

    #[test]
    fn test_province_display_name_fallbacks() {
        let p: Province = serde_json::from_str(r#"{"id":1,"title":"Kabul"}"#).unwrap();
        assert_eq!(p.display_name(), "Kabul");

        let p: Province = serde_json::from_str(r#"{"id":9}"#).unwrap();
        assert_eq!(p.display_name(), "Province 9");
    }
}
