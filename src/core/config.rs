use crate::core::allocation::{
    AllocationSettings, Category, TotalFundsPolicy, filter_categories,
};
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CategoryConfig {
    pub id: String,
    pub name: String,
    pub target_funds: Decimal,
    #[serde(default)]
    pub ticker: Option<String>,
}

fn default_increase_ratio() -> Decimal {
    Decimal::new(103, 2)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AllocationConfig {
    /// Direct multiplier on the quote, e.g. 1.03 inflates prices by 3%.
    #[serde(default = "default_increase_ratio")]
    pub price_increase_ratio: Decimal,
    /// Fixed total funds; omit to derive the total from category targets.
    #[serde(default)]
    pub total_funds: Option<Decimal>,
    /// Allow-list of category ids; omit or leave empty to process all.
    #[serde(default)]
    pub include: Option<Vec<String>>,
    #[serde(default = "default_true")]
    pub skip_unaffordable: bool,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        AllocationConfig {
            price_increase_ratio: default_increase_ratio(),
            total_funds: None,
            include: None,
            skip_unaffordable: true,
        }
    }
}

fn default_cache_ttl() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CacheConfig {
    /// Quote TTL in seconds.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: default_cache_ttl(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AlphaVantageConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub alpha_vantage: Option<AlphaVantageConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            alpha_vantage: Some(AlphaVantageConfig {
                base_url: "https://www.alphavantage.co".to_string(),
                api_key: String::new(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub categories: Vec<CategoryConfig>,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "codito", "swal")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("in", "codito", "swal")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Rejects configurations the allocator cannot run with. Runs before
    /// any network or cache activity.
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            bail!("No categories configured");
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.id.as_str()) {
                bail!("Duplicate category id: {}", category.id);
            }
            if category.target_funds < Decimal::ZERO {
                bail!(
                    "Negative target funds for category {}: {}",
                    category.id,
                    category.target_funds
                );
            }
        }
        if self.allocation.price_increase_ratio <= Decimal::ZERO {
            bail!(
                "price_increase_ratio must be positive, got {}",
                self.allocation.price_increase_ratio
            );
        }
        if let Some(total) = self.allocation.total_funds {
            if total < Decimal::ZERO {
                bail!("total_funds must be non-negative, got {total}");
            }
        }
        Ok(())
    }

    /// Categories retained after the optional allow-list, in declaration
    /// order.
    pub fn planned_categories(&self) -> Vec<Category> {
        let categories = self
            .categories
            .iter()
            .map(|c| Category {
                id: c.id.clone(),
                name: c.name.clone(),
                target_funds: c.target_funds,
                ticker: c.ticker.clone(),
            })
            .collect();
        filter_categories(categories, self.allocation.include.as_deref())
    }

    pub fn allocation_settings(&self) -> AllocationSettings {
        AllocationSettings {
            price_increase_ratio: self.allocation.price_increase_ratio,
            skip_unaffordable: self.allocation.skip_unaffordable,
            total_funds: match self.allocation.total_funds {
                Some(amount) => TotalFundsPolicy::Fixed(amount),
                None => TotalFundsPolicy::Derived,
            },
        }
    }
}
