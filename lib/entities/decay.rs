use serde::{ Deserialize, Serialize };
use crate::error::Result;
use super::{ check_distinct, check_rate };

/// Spontaneous decay from level `L1` into level `L2` at rate `gamma`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decay {
    pub L1: String,
    pub L2: String,
    #[serde(default)]
    pub gamma: f64,
}

impl Decay {
    pub fn new(L1: &str, L2: &str, gamma: f64) -> Self {
        Self { L1: L1.to_string(), L2: L2.to_string(), gamma }
    }

    pub fn label(&self) -> String { format!("{}-{}", self.L1, self.L2) }

    pub(crate) fn validate(&self) -> Result<()> {
        let by = format!("decay {}", self.label());
        check_distinct(&by, &self.L1, &self.L2)?;
        check_rate(&by, "gamma", self.gamma)
    }
}
