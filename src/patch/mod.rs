//! JSON persistence for module modes and whole-rack patch files.
//!
//! Only the mode fields are stored. Loading is forgiving: out-of-range
//! enum values clamp, and wrong-typed or missing entries keep the current
//! value. The only failures are text that is not JSON, a root that is not
//! an object, and file I/O.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::dsp::UniformSource;
use crate::generator::{GeneratorMode, GeneratorRange};
use crate::modules::{
    bernoulli::{BernoulliModes, CHANNELS},
    envelope::GeneratorModes,
    BernoulliGate, BufferedEnvelopeGenerator, OutMode, TossMode,
};

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("malformed patch JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("patch data must be a JSON object")]
    NotAnObject,
    #[error("patch file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Save and restore a module's persisted fields as JSON.
pub trait Persist {
    fn to_json(&self) -> Value;

    /// Apply a stored object on top of the current state.
    fn load_json(&mut self, value: &Value) -> Result<(), PatchError>;

    fn load_json_str(&mut self, text: &str) -> Result<(), PatchError> {
        let value: Value = serde_json::from_str(text)?;
        self.load_json(&value)
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, PatchError> {
    value.as_object().ok_or(PatchError::NotAnObject)
}

/// Integer entry clamped to `0..count`, or `None` if it is not an integer.
fn clamped_index(value: &Value, key: &str, count: usize) -> Option<i64> {
    let raw = value.as_i64()?;
    let clamped = raw.clamp(0, count as i64 - 1);
    if clamped != raw {
        warn!(key, raw, clamped, "out-of-range mode clamped");
    }
    Some(clamped)
}

pub fn bernoulli_modes_to_json(modes: &BernoulliModes) -> Value {
    json!({
        "tossModes": modes.toss_modes.iter().map(|m| m.index()).collect::<Vec<_>>(),
        "outModes": modes.out_modes.iter().map(|m| m.index()).collect::<Vec<_>>(),
    })
}

pub fn generator_modes_to_json(modes: &GeneratorModes) -> Value {
    json!({
        "mode": modes.mode.index(),
        "range": modes.range.index(),
    })
}

impl<R: UniformSource> Persist for BernoulliGate<R> {
    fn to_json(&self) -> Value {
        bernoulli_modes_to_json(&self.persisted())
    }

    fn load_json(&mut self, value: &Value) -> Result<(), PatchError> {
        let object = as_object(value)?;
        let mut modes = self.persisted();

        if let Some(legacy) = object.get("modes") {
            info!("migrating legacy bernoulli modes");
            let flags = legacy.as_array().map(Vec::as_slice).unwrap_or_default();
            for (i, flag) in flags.iter().take(CHANNELS).enumerate() {
                modes.toss_modes[i] = if flag.as_bool().unwrap_or(false) {
                    TossMode::Toggle
                } else {
                    TossMode::Direct
                };
            }
            modes.out_modes = [OutMode::Through; CHANNELS];
        } else {
            if let Some(entries) = object.get("tossModes").and_then(Value::as_array) {
                for (i, entry) in entries.iter().take(CHANNELS).enumerate() {
                    if let Some(index) = clamped_index(entry, "tossModes", TossMode::ALL.len()) {
                        modes.toss_modes[i] = TossMode::from_index(index);
                    }
                }
            }
            if let Some(entries) = object.get("outModes").and_then(Value::as_array) {
                for (i, entry) in entries.iter().take(CHANNELS).enumerate() {
                    if let Some(index) = clamped_index(entry, "outModes", OutMode::ALL.len()) {
                        modes.out_modes[i] = OutMode::from_index(index);
                    }
                }
            }
        }

        self.restore(&modes);
        Ok(())
    }
}

impl Persist for BufferedEnvelopeGenerator {
    fn to_json(&self) -> Value {
        generator_modes_to_json(&self.persisted())
    }

    fn load_json(&mut self, value: &Value) -> Result<(), PatchError> {
        let object = as_object(value)?;
        let mut modes: GeneratorModes = self.persisted();
        if let Some(index) = object
            .get("mode")
            .and_then(|v| clamped_index(v, "mode", GeneratorMode::COUNT))
        {
            modes.mode = GeneratorMode::from_index(index);
        }
        if let Some(index) = object
            .get("range")
            .and_then(|v| clamped_index(v, "range", GeneratorRange::COUNT))
        {
            modes.range = GeneratorRange::from_index(index);
        }
        self.restore(&modes);
        Ok(())
    }
}

/// Persisted state of a whole rack: one entry per module, either optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RackPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bernoulli: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<Value>,
}

impl RackPatch {
    pub fn capture<R: UniformSource>(
        gate: &BernoulliGate<R>,
        generator: &BufferedEnvelopeGenerator,
    ) -> Self {
        Self::from_modes(&gate.persisted(), &generator.persisted())
    }

    pub fn from_modes(bernoulli: &BernoulliModes, generator: &GeneratorModes) -> Self {
        Self {
            bernoulli: Some(bernoulli_modes_to_json(bernoulli)),
            generator: Some(generator_modes_to_json(generator)),
        }
    }

    /// Restore every module the patch has an entry for.
    pub fn apply<R: UniformSource>(
        &self,
        gate: &mut BernoulliGate<R>,
        generator: &mut BufferedEnvelopeGenerator,
    ) -> Result<(), PatchError> {
        if let Some(value) = &self.bernoulli {
            gate.load_json(value)?;
        }
        if let Some(value) = &self.generator {
            generator.load_json(value)?;
        }
        Ok(())
    }

    pub fn from_json_str(text: &str) -> Result<Self, PatchError> {
        let value: Value = serde_json::from_str(text)?;
        as_object(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_string(&self) -> Result<String, PatchError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading patch");
        let text = fs::read_to_string(path).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PatchError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "saving patch");
        let text = self.to_json_string()?;
        fs::write(path, text).map_err(|source| PatchError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Parse a bernoulli entry on its own, starting from the defaults.
pub fn bernoulli_modes_from_json(value: &Value) -> Result<BernoulliModes, PatchError> {
    let mut gate = BernoulliGate::with_source(crate::dsp::FastUniform::seeded(0));
    gate.load_json(value)?;
    Ok(gate.persisted())
}
