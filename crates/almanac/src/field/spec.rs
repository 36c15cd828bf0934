//! Field specifications and extracted field values.

use serde::{Deserialize, Serialize};

use crate::extract::{
    CategoryList, CategoryListParser, Diagnostic, Extraction, Quantity, QuantityParser,
};

/// Which grammar a field is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// A scalar value with unit, magnitude and year.
    Quantity,
    /// An enumeration of named categories with percentages.
    CategoryList,
}

impl FieldKind {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Quantity => "Quantity",
            FieldKind::CategoryList => "Category List",
        }
    }
}

impl std::str::FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "quantity" | "scalar" => Ok(FieldKind::Quantity),
            "category_list" | "categories" | "list" => Ok(FieldKind::CategoryList),
            _ => Err(format!(
                "Unknown field kind: {}. Use quantity or category_list.",
                s
            )),
        }
    }
}

/// How one corpus field is located and parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Normalized field key.
    pub key: String,
    pub kind: FieldKind,
    /// Unit the quantity is expected to carry (diagnostics only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_unit: Option<String>,
    /// Alternative names the field appears under.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldSpec {
    /// Create a specification for a scalar field.
    pub fn quantity(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::Quantity)
    }

    /// Create a specification for an enumeration field.
    pub fn category_list(key: impl Into<String>) -> Self {
        Self::new(key, FieldKind::CategoryList)
    }

    fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: normalize_key(&key.into()),
            kind,
            expected_unit: None,
            aliases: Vec::new(),
            description: None,
        }
    }

    /// Set the expected unit.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.expected_unit = Some(unit.into());
        self
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(normalize_key(&alias.into()));
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse a raw value for this field.
    pub fn extract(&self, text: Option<&str>) -> FieldValue {
        match self.kind {
            FieldKind::Quantity => {
                let parser = match &self.expected_unit {
                    Some(unit) => QuantityParser::new().with_expected_unit(unit.clone()),
                    None => QuantityParser::new(),
                };
                FieldValue::Quantity(parser.parse(text))
            }
            FieldKind::CategoryList => FieldValue::CategoryList(CategoryListParser::new().parse(text)),
        }
    }
}

/// The parsed value of one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldValue {
    Quantity(Extraction<Quantity>),
    CategoryList(Extraction<CategoryList>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Quantity(_) => FieldKind::Quantity,
            FieldValue::CategoryList(_) => FieldKind::CategoryList,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            FieldValue::Quantity(e) => &e.diagnostics,
            FieldValue::CategoryList(e) => &e.diagnostics,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            FieldValue::Quantity(e) => e.confidence(),
            FieldValue::CategoryList(e) => e.confidence(),
        }
    }

    pub fn is_absent(&self) -> bool {
        match self {
            FieldValue::Quantity(e) => e.is_absent(),
            FieldValue::CategoryList(e) => e.is_absent(),
        }
    }

    pub fn as_quantity(&self) -> Option<&Quantity> {
        match self {
            FieldValue::Quantity(e) => Some(&e.record),
            FieldValue::CategoryList(_) => None,
        }
    }

    pub fn as_category_list(&self) -> Option<&CategoryList> {
        match self {
            FieldValue::CategoryList(e) => Some(&e.record),
            FieldValue::Quantity(_) => None,
        }
    }
}

/// Normalize a field name to a registry key.
///
/// Lowercases, turns every run of non-alphanumeric characters into a single
/// `_`, and trims underscores: `"Real GDP (purchasing power parity)"`
/// becomes `real_gdp_purchasing_power_parity`.
pub fn normalize_key(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            key.extend(ch.to_lowercase());
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Population growth rate"), "population_growth_rate");
        assert_eq!(
            normalize_key("Real GDP (purchasing power parity)"),
            "real_gdp_purchasing_power_parity"
        );
        assert_eq!(normalize_key("  --Religions--  "), "religions");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn test_field_kind_from_str() {
        assert_eq!("quantity".parse::<FieldKind>(), Ok(FieldKind::Quantity));
        assert_eq!("category-list".parse::<FieldKind>(), Ok(FieldKind::CategoryList));
        assert!("table".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_extract_quantity_with_unit() {
        let spec = FieldSpec::quantity("Birth rate").with_unit("births/1,000 population");
        assert_eq!(spec.key, "birth_rate");

        let value = spec.extract(Some("10.9 births/1,000 population (2024 est.)"));
        assert_eq!(value.kind(), FieldKind::Quantity);
        assert_eq!(value.as_quantity().and_then(|q| q.value), Some(10.9));
        assert!(value.as_category_list().is_none());
        assert!(value.diagnostics().is_empty());
        assert_eq!(value.confidence(), 1.0);
    }

    #[test]
    fn test_extract_category_list() {
        let spec = FieldSpec::category_list("religions");
        let value = spec.extract(Some("Muslim 99%, other 1% (2010 est.)"));
        let list = value.as_category_list().unwrap();
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.timestamp.as_deref(), Some("2010"));
    }

    #[test]
    fn test_extract_absent() {
        let value = FieldSpec::quantity("area").extract(None);
        assert!(value.is_absent());
        assert_eq!(value.confidence(), 0.0);
    }

    #[test]
    fn test_field_value_json_is_tagged() {
        let value = FieldSpec::quantity("coastline").extract(Some("19,924 km"));
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["kind"], "quantity");
        assert_eq!(json["record"]["value"], 19924.0);

        let back: FieldValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }
}
