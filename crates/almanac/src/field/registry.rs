//! Lookup table from field identifiers to parsers.
//!
//! # Configuration file
//!
//! ```json
//! {
//!   "extends_builtin": true,
//!   "fields": [
//!     { "key": "coastline", "kind": "quantity", "expected_unit": "km" },
//!     { "key": "religions", "kind": "category_list", "aliases": ["religion"] }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{AlmanacError, Result};

use super::spec::{normalize_key, FieldKind, FieldSpec, FieldValue};

/// Built-in country-fact fields: `(key, kind, expected unit, aliases)`.
const BUILTIN_FIELDS: &[(&str, FieldKind, Option<&str>, &[&str])] = &[
    // Geography
    ("area_total", FieldKind::Quantity, Some("sq km"), &["area", "total_area"]),
    ("coastline", FieldKind::Quantity, Some("km"), &[]),
    // People and society
    ("population", FieldKind::Quantity, None, &["total_population"]),
    ("population_growth_rate", FieldKind::Quantity, Some("%"), &[]),
    ("birth_rate", FieldKind::Quantity, Some("births/1,000 population"), &[]),
    ("death_rate", FieldKind::Quantity, Some("deaths/1,000 population"), &[]),
    ("net_migration_rate", FieldKind::Quantity, Some("migrant"), &[]),
    ("median_age", FieldKind::Quantity, Some("years"), &[]),
    ("life_expectancy_at_birth", FieldKind::Quantity, Some("years"), &["life_expectancy"]),
    ("total_fertility_rate", FieldKind::Quantity, Some("children born/woman"), &["fertility_rate"]),
    ("infant_mortality_rate", FieldKind::Quantity, Some("deaths/1,000 live births"), &[]),
    ("religions", FieldKind::CategoryList, None, &["religion"]),
    ("ethnic_groups", FieldKind::CategoryList, None, &["ethnicity"]),
    ("languages", FieldKind::CategoryList, None, &["language"]),
    // Economy
    ("real_gdp_purchasing_power_parity", FieldKind::Quantity, Some("$"), &["gdp_ppp"]),
    ("real_gdp_growth_rate", FieldKind::Quantity, Some("%"), &["gdp_growth_rate"]),
    ("real_gdp_per_capita", FieldKind::Quantity, Some("$"), &["gdp_per_capita"]),
    ("gdp_official_exchange_rate", FieldKind::Quantity, Some("$"), &["gdp_oer"]),
    ("inflation_rate_consumer_prices", FieldKind::Quantity, Some("%"), &["inflation_rate"]),
    ("unemployment_rate", FieldKind::Quantity, Some("%"), &[]),
    ("public_debt", FieldKind::Quantity, Some("%"), &[]),
    ("exports", FieldKind::Quantity, Some("$"), &[]),
    ("imports", FieldKind::Quantity, Some("$"), &[]),
    ("exports_partners", FieldKind::CategoryList, None, &["export_partners"]),
    ("imports_partners", FieldKind::CategoryList, None, &["import_partners"]),
    ("exports_commodities", FieldKind::CategoryList, None, &["export_commodities"]),
    ("imports_commodities", FieldKind::CategoryList, None, &["import_commodities"]),
    // Energy and environment
    ("electricity_installed_generating_capacity", FieldKind::Quantity, Some("kW"), &["installed_generating_capacity"]),
    ("carbon_dioxide_emissions", FieldKind::Quantity, Some("metric tonnes of CO2"), &["co2_emissions"]),
    // Military
    ("military_expenditures", FieldKind::Quantity, Some("%"), &["military_expenditure"]),
];

/// Registry configuration as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Start from the built-in fields; entries here override them by key.
    #[serde(default = "default_true")]
    pub extends_builtin: bool,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

fn default_true() -> bool {
    true
}

/// Maps field identifiers (keys or aliases) to field specifications.
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: IndexMap<String, FieldSpec>,
    aliases: HashMap<String, String>,
}

impl FieldRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in country-fact fields.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (key, kind, unit, aliases) in BUILTIN_FIELDS {
            let mut spec = match kind {
                FieldKind::Quantity => FieldSpec::quantity(*key),
                FieldKind::CategoryList => FieldSpec::category_list(*key),
            };
            if let Some(unit) = unit {
                spec = spec.with_unit(*unit);
            }
            for alias in *aliases {
                spec = spec.with_alias(*alias);
            }
            registry.insert(spec);
        }
        registry
    }

    /// Build a registry from a configuration.
    pub fn from_config(config: RegistryConfig) -> Result<Self> {
        let mut registry = if config.extends_builtin {
            Self::builtin()
        } else {
            Self::new()
        };

        let mut seen = std::collections::HashSet::new();
        for spec in config.fields {
            let spec = FieldSpec {
                key: normalize_key(&spec.key),
                aliases: spec.aliases.iter().map(|a| normalize_key(a)).collect(),
                ..spec
            };
            if spec.key.is_empty() {
                return Err(AlmanacError::Config("Field with empty key".to_string()));
            }
            if !seen.insert(spec.key.clone()) {
                return Err(AlmanacError::Config(format!(
                    "Field '{}' is defined more than once",
                    spec.key
                )));
            }
            registry.register(spec)?;
        }

        Ok(registry)
    }

    /// Parse a registry configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: RegistryConfig = serde_json::from_str(json)?;
        Self::from_config(config)
    }

    /// Load a registry configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AlmanacError::io(path, e))?;
        let config: RegistryConfig = serde_json::from_reader(BufReader::new(file))?;
        Self::from_config(config)
    }

    /// Export the registry as a configuration that rebuilds it exactly.
    pub fn to_config(&self) -> RegistryConfig {
        RegistryConfig {
            extends_builtin: false,
            fields: self.fields.values().cloned().collect(),
        }
    }

    /// Add or replace a field.
    ///
    /// Fails when one of the spec's aliases already names a different field.
    pub fn register(&mut self, spec: FieldSpec) -> Result<()> {
        for alias in &spec.aliases {
            let taken_by_key = self.fields.contains_key(alias) && *alias != spec.key;
            let taken_by_alias = self
                .aliases
                .get(alias)
                .is_some_and(|owner| *owner != spec.key);
            if taken_by_key || taken_by_alias {
                return Err(AlmanacError::Config(format!(
                    "Alias '{}' of field '{}' is already in use",
                    alias, spec.key
                )));
            }
        }
        self.insert(spec);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_field(mut self, spec: FieldSpec) -> Result<Self> {
        self.register(spec)?;
        Ok(self)
    }

    fn insert(&mut self, spec: FieldSpec) {
        if let Some(previous) = self.fields.get(&spec.key) {
            for alias in &previous.aliases {
                self.aliases.remove(alias);
            }
        }
        for alias in &spec.aliases {
            self.aliases.insert(alias.clone(), spec.key.clone());
        }
        self.fields.insert(spec.key.clone(), spec);
    }

    /// Look up a field by key or alias, in any spelling.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        let key = normalize_key(name);
        self.fields.get(&key).or_else(|| {
            self.aliases
                .get(&key)
                .and_then(|canonical| self.fields.get(canonical))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Parse `text` with the parser registered for `name`.
    ///
    /// Returns `None` when the field is not registered.
    pub fn extract(&self, name: &str, text: Option<&str>) -> Option<FieldValue> {
        self.get(name).map(|spec| spec.extract(text))
    }

    /// Fields in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
