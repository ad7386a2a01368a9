//! Vessels and their chemical contents
//!
//! The content list of a vessel is the single source of truth for every
//! derived quantity. Simulators read it, never write it.

use std::fmt;

use crate::VesselId;

/// Unit a content amount is measured in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    Ml,
    G,
    Mol,
    Drops,
}

impl Unit {
    pub fn from_str_id(s: &str) -> Option<Self> {
        match s {
            "ml" => Some(Unit::Ml),
            "g" => Some(Unit::G),
            "mol" => Some(Unit::Mol),
            "drops" => Some(Unit::Drops),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Unit::Ml => "ml",
            Unit::G => "g",
            Unit::Mol => "mol",
            Unit::Drops => "drops",
        }
    }
}

/// Physical phase of a substance as placed in the vessel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Solid,
    Liquid,
    Gas,
}

/// Reference into the substance catalog of the chemical shelf
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SubstanceRef(String);

impl SubstanceRef {
    pub fn new(id: impl Into<String>) -> Self {
        SubstanceRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SubstanceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Substance({})", self.0)
    }
}

impl From<&str> for SubstanceRef {
    fn from(s: &str) -> Self {
        SubstanceRef::new(s)
    }
}

/// One entry in a vessel's content list
#[derive(Clone, Debug, PartialEq)]
pub struct ContentEntry {
    pub substance: SubstanceRef,
    pub amount: f64,
    pub unit: Unit,
    /// Molar concentration for solutions (ml / drops)
    pub concentration: Option<f64>,
    pub phase: Option<Phase>,
}

impl ContentEntry {
    pub fn new(substance: impl Into<SubstanceRef>, amount: f64, unit: Unit) -> Self {
        ContentEntry {
            substance: substance.into(),
            amount,
            unit,
            concentration: None,
            phase: None,
        }
    }

    pub fn with_concentration(mut self, molar: f64) -> Self {
        self.concentration = Some(molar);
        self
    }

    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Amount with non-finite and negative values treated as nothing
    #[inline]
    pub fn effective_amount(&self) -> f64 {
        if self.amount.is_finite() && self.amount > 0.0 {
            self.amount
        } else {
            0.0
        }
    }
}

/// A visible liquid layer, supplied by the placement UI for phase separation
#[derive(Clone, Debug, PartialEq)]
pub struct LiquidLayer {
    pub color: String,
    /// Density in g/ml
    pub density: f64,
    /// Relative volume; layers without one share equally
    pub volume: Option<f64>,
}

impl LiquidLayer {
    pub fn new(color: impl Into<String>, density: f64) -> Self {
        LiquidLayer {
            color: color.into(),
            density,
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = Some(volume);
        self
    }
}

/// A reaction container on the lab table
#[derive(Clone, Debug, PartialEq)]
pub struct Vessel {
    pub id: VesselId,
    pub label: Option<String>,
    contents: Vec<ContentEntry>,
    layers: Vec<LiquidLayer>,
}

impl Vessel {
    pub fn new(id: VesselId) -> Self {
        Vessel {
            id,
            label: None,
            contents: Vec::new(),
            layers: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Ordered content list
    pub fn contents(&self) -> &[ContentEntry] {
        &self.contents
    }

    pub fn layers(&self) -> &[LiquidLayer] {
        &self.layers
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn add_content(&mut self, entry: ContentEntry) {
        self.contents.push(entry);
    }

    /// Remove all contents and layers
    pub fn clear_contents(&mut self) {
        self.contents.clear();
        self.layers.clear();
    }

    pub fn set_layers(&mut self, layers: Vec<LiquidLayer>) {
        self.layers = layers;
    }
}
