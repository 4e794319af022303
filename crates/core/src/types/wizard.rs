//! Wizard enums: camera category, tier and step.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where the cameras will be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    Residential,
    Rural,
    Industrial,
}

impl CameraType {
    pub const ALL: [Self; 3] = [Self::Residential, Self::Rural, Self::Industrial];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Residential => "residential",
            Self::Rural => "rural",
            Self::Industrial => "industrial",
        }
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Residential => "Residential",
            Self::Rural => "Rural",
            Self::Industrial => "Industrial",
        }
    }
}

impl fmt::Display for CameraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Product range tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraLevel {
    Entry,
    Mid,
    High,
}

impl CameraLevel {
    pub const ALL: [Self; 3] = [Self::Entry, Self::Mid, Self::High];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Mid => "mid",
            Self::High => "high",
        }
    }

    /// Customer-facing tier name.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Entry => "Basic",
            Self::Mid => "Standard",
            Self::High => "Premium",
        }
    }
}

impl fmt::Display for CameraLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Steps of the ordering wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WizardStep {
    #[default]
    CategorySelect,
    TierSelect,
    ProductSelect,
    AddonSelect,
    OrderSummary,
    CheckoutHandoff,
}

impl WizardStep {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CategorySelect => "category-select",
            Self::TierSelect => "tier-select",
            Self::ProductSelect => "product-select",
            Self::AddonSelect => "addon-select",
            Self::OrderSummary => "order-summary",
            Self::CheckoutHandoff => "checkout-handoff",
        }
    }

    /// The step a forward transition leads to.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::CategorySelect => Some(Self::TierSelect),
            Self::TierSelect => Some(Self::ProductSelect),
            Self::ProductSelect => Some(Self::AddonSelect),
            Self::AddonSelect => Some(Self::OrderSummary),
            Self::OrderSummary => Some(Self::CheckoutHandoff),
            Self::CheckoutHandoff => None,
        }
    }

    /// The step a back transition leads to.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::CategorySelect => None,
            Self::TierSelect => Some(Self::CategorySelect),
            Self::ProductSelect => Some(Self::TierSelect),
            Self::AddonSelect => Some(Self::ProductSelect),
            Self::OrderSummary => Some(Self::AddonSelect),
            Self::CheckoutHandoff => Some(Self::OrderSummary),
        }
    }

    /// One-based position for progress display.
    #[must_use]
    pub const fn position(self) -> u8 {
        match self {
            Self::CategorySelect => 1,
            Self::TierSelect => 2,
            Self::ProductSelect => 3,
            Self::AddonSelect => 4,
            Self::OrderSummary => 5,
            Self::CheckoutHandoff => 6,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shopper's in-progress choices.
///
/// Lives only as long as the wizard session; "new order" starts a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Selection {
    pub camera_type: Option<CameraType>,
    pub camera_level: Option<CameraLevel>,
    pub current_step: WizardStep,
}

/// Error returned when parsing an unknown enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);
