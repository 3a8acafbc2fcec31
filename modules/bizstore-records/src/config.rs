//! Configuration of the records module.

use bizstore_db::{ConfigError, StoreConfig};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

/// Prefix of environment overrides, e.g. `BIZSTORE_STORE__DATABASE=crm`.
pub const ENV_PREFIX: &str = "BIZSTORE_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecordsConfig {
    pub store: StoreConfig,
    pub collections: CollectionNames,
    /// Allocate public ids strictly serially within this process instead of
    /// trusting the unique index to catch races.
    pub serial_public_ids: bool,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            collections: CollectionNames::default(),
            serial_public_ids: false,
        }
    }
}

/// Collection name per entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionNames {
    pub tenants: String,
    pub users: String,
    pub customers: String,
    pub associates: String,
    pub staff: String,
    pub orders: String,
    pub task_items: String,
    pub tags: String,
    pub skill_sets: String,
    pub attachments: String,
    pub comments: String,
    pub bulletins: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            tenants: "tenants".to_owned(),
            users: "users".to_owned(),
            customers: "customers".to_owned(),
            associates: "associates".to_owned(),
            staff: "staff".to_owned(),
            orders: "orders".to_owned(),
            task_items: "task_items".to_owned(),
            tags: "tags".to_owned(),
            skill_sets: "skill_sets".to_owned(),
            attachments: "attachments".to_owned(),
            comments: "comments".to_owned(),
            bulletins: "bulletins".to_owned(),
        }
    }
}

impl CollectionNames {
    fn all(&self) -> [(&'static str, &str); 12] {
        [
            ("tenants", &self.tenants),
            ("users", &self.users),
            ("customers", &self.customers),
            ("associates", &self.associates),
            ("staff", &self.staff),
            ("orders", &self.orders),
            ("task_items", &self.task_items),
            ("tags", &self.tags),
            ("skill_sets", &self.skill_sets),
            ("attachments", &self.attachments),
            ("comments", &self.comments),
            ("bulletins", &self.bulletins),
        ]
    }
}

impl RecordsConfig {
    /// Layered sources: built-in defaults, then the YAML document if given,
    /// then `BIZSTORE_`-prefixed environment variables (`__` separates keys).
    #[must_use]
    pub fn figment(yaml: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(doc) = yaml {
            figment = figment.merge(Yaml::string(doc));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// # Errors
    /// `ConfigError::Figment` on malformed input, otherwise whatever
    /// [`RecordsConfig::validate`] reports.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let cfg: Self = figment.extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// `ConfigError::InvalidValue` if a collection name is blank or two
    /// entities share one, plus the store section's own checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        let names = self.collections.all();
        for (i, (entity, name)) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "collection name for {entity} must not be empty"
                )));
            }
            if let Some((other, _)) = names[..i].iter().find(|(_, n)| n == name) {
                return Err(ConfigError::InvalidValue(format!(
                    "{other} and {entity} share collection {name}"
                )));
            }
        }
        Ok(())
    }
}
