use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::partials::{MAX_PARTIALS, MIN_PARTIALS},
    synth::message::ControllerKind,
};

/// Process-wide instrument settings plus the performance controllers.
///
/// The render path reads one snapshot per block; see [`SharedParameters`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentParameters {
    pub inharmonicity: f64,
    pub num_partials: usize,
    pub string_detune_range: f64,
    pub partial_detune_range: f64,
    pub damping: f64,
    pub linear_term: f64,
    pub squared_term: f64,
    pub cubic_term: f64,
    pub brightness_a: f64,
    pub brightness_b: f64,
    pub pitch_bend_coarse: f64,
    pub pitch_bend_fine: f64,
    pub sustain: f64,
    pub expression: f64,
    pub mod_wheel: f64,
}

impl Default for InstrumentParameters {
    fn default() -> Self {
        Self {
            inharmonicity: 0.003,
            num_partials: 10,
            string_detune_range: 0.001,
            partial_detune_range: 1.0,
            damping: 2.5,
            linear_term: 0.3,
            squared_term: 1.0,
            cubic_term: 0.3,
            brightness_a: 0.4,
            brightness_b: 0.2,
            pitch_bend_coarse: 0.5,
            pitch_bend_fine: 0.5,
            sustain: 0.0,
            expression: 1.0,
            mod_wheel: 0.0,
        }
    }
}

/// Named, range-constrained controls exposed at the parameter boundary.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Param {
    Inharmonicity,
    Partials,
    StringDetuneRange,
    PartialDetuneRange,
    Damping,
    LinearTerm,
    SquaredTerm,
    CubicTerm,
    BrightnessA,
    BrightnessB,
    PitchBendCoarse,
    PitchBendFine,
}

impl Param {
    pub const ALL: [Param; 12] = [
        Param::Inharmonicity,
        Param::Partials,
        Param::StringDetuneRange,
        Param::PartialDetuneRange,
        Param::Damping,
        Param::LinearTerm,
        Param::SquaredTerm,
        Param::CubicTerm,
        Param::BrightnessA,
        Param::BrightnessB,
        Param::PitchBendCoarse,
        Param::PitchBendFine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Param::Inharmonicity => "Inharmonicity",
            Param::Partials => "Partials",
            Param::StringDetuneRange => "String Detune Range",
            Param::PartialDetuneRange => "Partial Detune Range",
            Param::Damping => "Damping",
            Param::LinearTerm => "Linear Term",
            Param::SquaredTerm => "Squared Term",
            Param::CubicTerm => "Cubic Term",
            Param::BrightnessA => "Brightness A",
            Param::BrightnessB => "Brightness B",
            Param::PitchBendCoarse => "Pitch Bend Coarse",
            Param::PitchBendFine => "Pitch Bend Fine",
        }
    }

    /// Inclusive valid range.
    pub fn range(self) -> (f64, f64) {
        match self {
            Param::Inharmonicity => (0.0, 1.0),
            Param::Partials => (MIN_PARTIALS as f64, MAX_PARTIALS as f64),
            Param::StringDetuneRange => (0.0001, 0.01),
            Param::PartialDetuneRange => (0.1, 2.0),
            Param::Damping => (0.1, 10.0),
            _ => (0.001, 1.0),
        }
    }

    pub fn clamp(self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        if value.is_nan() {
            return self.get(&InstrumentParameters::default());
        }
        let clamped = value.clamp(lo, hi);
        if self == Param::Partials {
            clamped.round()
        } else {
            clamped
        }
    }

    pub fn get(self, params: &InstrumentParameters) -> f64 {
        match self {
            Param::Inharmonicity => params.inharmonicity,
            Param::Partials => params.num_partials as f64,
            Param::StringDetuneRange => params.string_detune_range,
            Param::PartialDetuneRange => params.partial_detune_range,
            Param::Damping => params.damping,
            Param::LinearTerm => params.linear_term,
            Param::SquaredTerm => params.squared_term,
            Param::CubicTerm => params.cubic_term,
            Param::BrightnessA => params.brightness_a,
            Param::BrightnessB => params.brightness_b,
            Param::PitchBendCoarse => params.pitch_bend_coarse,
            Param::PitchBendFine => params.pitch_bend_fine,
        }
    }

    fn write(self, params: &mut InstrumentParameters, value: f64) {
        match self {
            Param::Inharmonicity => params.inharmonicity = value,
            Param::Partials => params.num_partials = value as usize,
            Param::StringDetuneRange => params.string_detune_range = value,
            Param::PartialDetuneRange => params.partial_detune_range = value,
            Param::Damping => params.damping = value,
            Param::LinearTerm => params.linear_term = value,
            Param::SquaredTerm => params.squared_term = value,
            Param::CubicTerm => params.cubic_term = value,
            Param::BrightnessA => params.brightness_a = value,
            Param::BrightnessB => params.brightness_b = value,
            Param::PitchBendCoarse => params.pitch_bend_coarse = value,
            Param::PitchBendFine => params.pitch_bend_fine = value,
        }
    }
}

impl InstrumentParameters {
    /// Copy of `self` with every field pulled into its valid range.
    pub fn clamped(mut self) -> Self {
        for param in Param::ALL {
            let value = param.clamp(param.get(&self));
            param.write(&mut self, value);
        }
        self.sustain = clamp_unit(self.sustain);
        self.expression = clamp_unit(self.expression);
        self.mod_wheel = clamp_unit(self.mod_wheel);
        self
    }

    pub fn controller(&self, kind: ControllerKind) -> f64 {
        match kind {
            ControllerKind::Sustain => self.sustain,
            ControllerKind::Expression => self.expression,
            ControllerKind::ModWheel => self.mod_wheel,
        }
    }

    pub fn sustain_held(&self) -> bool {
        self.sustain >= 0.5
    }

    /// True when `other` would produce a different partial table for the
    /// same note and seed.
    pub fn changes_partial_layout(&self, other: &InstrumentParameters) -> bool {
        self.inharmonicity != other.inharmonicity
            || self.num_partials != other.num_partials
            || self.partial_detune_range != other.partial_detune_range
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Cloneable handle to the live parameter snapshot.
///
/// Writers publish a whole new `InstrumentParameters` through read-copy-update;
/// readers load one `Arc` and keep it for the block. A reader can therefore
/// never see half of a multi-field update.
#[derive(Debug, Clone)]
pub struct SharedParameters {
    inner: Arc<ArcSwap<InstrumentParameters>>,
}

impl SharedParameters {
    pub fn new(initial: InstrumentParameters) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial.clamped())),
        }
    }

    /// Cheap, lock-free view of the current snapshot.
    pub fn load(&self) -> Guard<Arc<InstrumentParameters>> {
        self.inner.load()
    }

    /// Owned handle on the current snapshot.
    pub fn snapshot(&self) -> Arc<InstrumentParameters> {
        self.inner.load_full()
    }

    /// Set one named control, clamping it into range. Returns the stored value.
    pub fn set(&self, param: Param, value: f64) -> f64 {
        let stored = param.clamp(value);
        if stored != value {
            tracing::debug!(param = param.name(), requested = value, stored, "parameter clamped");
        }
        self.update(|p| param.write(p, stored));
        stored
    }

    pub fn set_controller(&self, kind: ControllerKind, value: f64) -> f64 {
        let stored = clamp_unit(value);
        self.update(|p| match kind {
            ControllerKind::Sustain => p.sustain = stored,
            ControllerKind::Expression => p.expression = stored,
            ControllerKind::ModWheel => p.mod_wheel = stored,
        });
        stored
    }

    /// Replace every field at once.
    pub fn replace(&self, params: InstrumentParameters) {
        self.inner.store(Arc::new(params.clamped()));
    }

    /// Apply `f` to a copy of the current snapshot and publish the result.
    pub fn update(&self, f: impl Fn(&mut InstrumentParameters)) {
        self.inner.rcu(|current| {
            let mut next = **current;
            f(&mut next);
            next
        });
    }
}

impl Default for SharedParameters {
    fn default() -> Self {
        Self::new(InstrumentParameters::default())
    }
}
