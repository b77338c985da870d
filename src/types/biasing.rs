//! Query-time biasing.

use serde::{Deserialize, Serialize};

/// How strongly a bias pushes matching records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiasStrength {
    /// Absolute increase.
    #[serde(rename = "Absolute_Increase")]
    AbsoluteIncrease,
    /// Strong increase.
    #[serde(rename = "Strong_Increase")]
    StrongIncrease,
    /// Medium increase.
    #[serde(rename = "Medium_Increase")]
    MediumIncrease,
    /// Weak increase.
    #[serde(rename = "Weak_Increase")]
    WeakIncrease,
    /// No change.
    #[serde(rename = "Leave_Unchanged")]
    LeaveUnchanged,
    /// Weak decrease.
    #[serde(rename = "Weak_Decrease")]
    WeakDecrease,
    /// Medium decrease.
    #[serde(rename = "Medium_Decrease")]
    MediumDecrease,
    /// Strong decrease.
    #[serde(rename = "Strong_Decrease")]
    StrongDecrease,
    /// Absolute decrease.
    #[serde(rename = "Absolute_Decrease")]
    AbsoluteDecrease,
}

/// A single bias on a field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bias {
    /// Field name.
    pub name: String,
    /// Field value.
    pub content: String,
    /// Strength.
    pub strength: BiasStrength,
}

impl Bias {
    /// Creates a bias.
    pub fn new(name: impl Into<String>, content: impl Into<String>, strength: BiasStrength) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            strength,
        }
    }
}

/// A biasing profile defined at query time.
///
/// Empty lists, a `false` augment flag and an unset influence are left out
/// of the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biasing {
    /// Product IDs to bring to the top of the result set, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bring_to_top: Vec<String>,

    /// Augment the biases defined in the command center instead of
    /// replacing them.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub augment_biases: bool,

    /// Influence of the biases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influence: Option<f32>,

    /// The biases.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub biases: Vec<Bias>,
}

impl Biasing {
    /// Creates an empty biasing profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the products to bring to the top.
    pub fn bring_to_top<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bring_to_top = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether to augment command center biases.
    pub fn augment_biases(mut self, augment: bool) -> Self {
        self.augment_biases = augment;
        self
    }

    /// Sets the influence.
    pub fn influence(mut self, influence: f32) -> Self {
        self.influence = Some(influence);
        self
    }

    /// Adds a bias.
    pub fn bias(mut self, bias: Bias) -> Self {
        self.biases.push(bias);
        self
    }
}
