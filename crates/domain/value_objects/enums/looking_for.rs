use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Relationship category a profile is looking for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookingFor {
    Dating,
    Hookup,
    Sexcall,
    SugarDaddy,
    SugarMummy,
}

impl LookingFor {
    /// Canonical display order, also used when a viewer has no category.
    pub const ALL: [LookingFor; 5] = [
        LookingFor::Dating,
        LookingFor::Hookup,
        LookingFor::Sexcall,
        LookingFor::SugarDaddy,
        LookingFor::SugarMummy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookingFor::Dating => "DATING",
            LookingFor::Hookup => "HOOKUP",
            LookingFor::Sexcall => "SEXCALL",
            LookingFor::SugarDaddy => "SUGAR_DADDY",
            LookingFor::SugarMummy => "SUGAR_MUMMY",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DATING" => Some(LookingFor::Dating),
            "HOOKUP" => Some(LookingFor::Hookup),
            "SEXCALL" => Some(LookingFor::Sexcall),
            "SUGAR_DADDY" => Some(LookingFor::SugarDaddy),
            "SUGAR_MUMMY" => Some(LookingFor::SugarMummy),
            _ => None,
        }
    }

    /// Categories matched like-for-like, where the viewer's seeking gender applies.
    pub fn is_symmetric(&self) -> bool {
        matches!(
            self,
            LookingFor::Dating | LookingFor::Hookup | LookingFor::Sexcall
        )
    }

    /// The single category a viewer in this category is shown.
    pub fn display_category(&self) -> LookingFor {
        match self {
            LookingFor::SugarDaddy => LookingFor::SugarMummy,
            LookingFor::SugarMummy => LookingFor::SugarDaddy,
            other => *other,
        }
    }
}

impl Display for LookingFor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
