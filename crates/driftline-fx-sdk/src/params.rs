use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identity of one automatable control.
///
/// Ids are persisted inside patches and must keep their meaning for the
/// lifetime of the effect type: a control whose behavior changes gets a new
/// id, and retired ids are never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct ParamId(pub u16);

impl ParamId {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mapping between the host's normalized 0..1 range and natural units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamCurve {
    /// Affine interpolation across the range.
    Linear,
    /// Geometric interpolation; requires a strictly positive range. Used for
    /// frequencies and times where equal knob travel should cover equal
    /// ratios.
    Exponential,
    /// Squared taper giving fine resolution near the bottom of the range,
    /// used for gain-style controls.
    Decibel,
}

/// Value type and range of one control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParamKind {
    Float {
        min: f32,
        max: f32,
        default: f32,
        curve: ParamCurve,
    },
    Choice {
        labels: Vec<String>,
        default: usize,
    },
    Toggle {
        default: bool,
    },
}

impl ParamKind {
    pub fn float(range: std::ops::RangeInclusive<f32>, default: f32) -> Self {
        Self::float_curved(range, default, ParamCurve::Linear)
    }

    pub fn float_curved(
        range: std::ops::RangeInclusive<f32>,
        default: f32,
        curve: ParamCurve,
    ) -> Self {
        let min = *range.start();
        let max = *range.end();
        assert!(min <= max, "parameter min must be <= max");
        assert!(default >= min && default <= max, "default outside range");
        if matches!(curve, ParamCurve::Exponential) {
            assert!(min > 0.0, "exponential curve requires a positive range");
        }
        ParamKind::Float {
            min,
            max,
            default,
            curve,
        }
    }

    /// Canonical default in natural units.
    pub fn default_value(&self) -> f32 {
        match self {
            ParamKind::Float { default, .. } => *default,
            ParamKind::Choice { default, .. } => *default as f32,
            ParamKind::Toggle { default } => {
                if *default {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Natural-unit bounds of the control.
    pub fn bounds(&self) -> (f32, f32) {
        match self {
            ParamKind::Float { min, max, .. } => (*min, *max),
            ParamKind::Choice { labels, .. } => (0.0, labels.len().saturating_sub(1) as f32),
            ParamKind::Toggle { .. } => (0.0, 1.0),
        }
    }

    /// Clamps into range; discrete kinds are also quantized to the nearest
    /// step so a choice or toggle slot never holds a fractional value.
    pub fn clamp(&self, value: f32) -> f32 {
        let (min, max) = self.bounds();
        let value = if value.is_finite() { value } else { min };
        match self {
            ParamKind::Float { .. } => value.clamp(min, max),
            ParamKind::Choice { .. } | ParamKind::Toggle { .. } => {
                value.clamp(min, max).round()
            }
        }
    }

    /// Maps a normalized 0..1 host value into natural units.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let t = normalized.clamp(0.0, 1.0);
        match self {
            ParamKind::Float {
                min, max, curve, ..
            } => match curve {
                ParamCurve::Linear => min + t * (max - min),
                ParamCurve::Exponential => min * (max / min).powf(t),
                ParamCurve::Decibel => min + t * t * (max - min),
            },
            _ => self.clamp(t * self.bounds().1),
        }
    }

    /// Inverse of [`denormalize`](Self::denormalize).
    pub fn normalize(&self, natural: f32) -> f32 {
        let value = self.clamp(natural);
        let (min, max) = self.bounds();
        if (max - min).abs() < f32::EPSILON {
            return 0.0;
        }
        match self {
            ParamKind::Float { curve, .. } => match curve {
                ParamCurve::Linear => (value - min) / (max - min),
                ParamCurve::Exponential => (value / min).ln() / (max / min).ln(),
                ParamCurve::Decibel => ((value - min) / (max - min)).max(0.0).sqrt(),
            },
            _ => value / max,
        }
    }
}

/// Static metadata describing one automatable control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub id: ParamId,
    pub name: String,
    pub kind: ParamKind,
    pub unit: Option<String>,
    pub group: crate::GroupId,
}

impl ParamDescriptor {
    pub fn new(id: ParamId, name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            unit: None,
            group: crate::GroupId::default(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn in_group(mut self, group: crate::GroupId) -> Self {
        self.group = group;
        self
    }
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("unknown parameter {0}")]
    UnknownParameter(ParamId),
    #[error("value vector has length {actual} but the table declares {expected} controls")]
    WrongLength { expected: usize, actual: usize },
}

/// Append-only builder for an effect type's descriptor table.
///
/// Ids must be strictly increasing: extending an effect appends descriptors
/// with fresh ids, and retired ids leave a permanent gap. Violations are
/// programming errors caught at registration time, long before any audio
/// runs.
#[derive(Debug, Default)]
pub struct DescriptorTableBuilder {
    params: Vec<ParamDescriptor>,
}

impl DescriptorTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, descriptor: ParamDescriptor) -> Self {
        if let Some(last) = self.params.last() {
            assert!(
                descriptor.id > last.id,
                "descriptor ids must be strictly increasing: {} follows {}",
                descriptor.id,
                last.id
            );
        }
        self.params.push(descriptor);
        self
    }

    pub fn finish(self) -> DescriptorTable {
        DescriptorTable {
            params: self.params,
        }
    }
}

/// Immutable per-effect-type control table.
///
/// The table owns the id-to-slot translation: hosts and patches address
/// controls by stable [`ParamId`], the dense value arrays handed to kernels
/// are indexed by table position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorTable {
    params: Vec<ParamDescriptor>,
}

impl DescriptorTable {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamDescriptor> {
        self.params.iter()
    }

    /// Dense slot of the given id, if the control still exists.
    pub fn index_of(&self, id: ParamId) -> Option<usize> {
        // Ids are strictly increasing, so a binary search over the table
        // order is exact.
        self.params.binary_search_by(|p| p.id.cmp(&id)).ok()
    }

    pub fn contains(&self, id: ParamId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: ParamId) -> Option<&ParamDescriptor> {
        self.index_of(id).map(|index| &self.params[index])
    }

    pub fn by_index(&self, index: usize) -> Option<&ParamDescriptor> {
        self.params.get(index)
    }

    /// Canonical default vector in table order.
    pub fn defaults(&self) -> Vec<f32> {
        self.params
            .iter()
            .map(|param| param.kind.default_value())
            .collect()
    }

    /// Clamps a single value into the id's declared range. Unknown ids are a
    /// configuration error; the value passes through unchanged in release.
    pub fn clamp(&self, id: ParamId, value: f32) -> f32 {
        match self.get(id) {
            Some(param) => param.kind.clamp(value),
            None => {
                debug_assert!(false, "clamp for unknown parameter {id}");
                value
            }
        }
    }

    /// Clamps a dense vector in place against every descriptor.
    pub fn clamp_all(&self, values: &mut [f32]) {
        for (param, value) in self.params.iter().zip(values.iter_mut()) {
            *value = param.kind.clamp(*value);
        }
    }

    pub fn denormalize(&self, id: ParamId, normalized: f32) -> Result<f32, ParamError> {
        self.get(id)
            .map(|param| param.kind.denormalize(normalized))
            .ok_or(ParamError::UnknownParameter(id))
    }

    pub fn normalize(&self, id: ParamId, natural: f32) -> Result<f32, ParamError> {
        self.get(id)
            .map(|param| param.kind.normalize(natural))
            .ok_or(ParamError::UnknownParameter(id))
    }
}
