use serde::{Deserialize, Serialize};

pub const IMAGE_DECODING: &str = "image_decoding";
pub const VISION: &str = "vision";

/// Which external capabilities this engine instance can rely on.
///
/// Supplied at construction time by whoever wires the engine together, so
/// availability is an explicit input rather than something probed at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Stored image references can be decoded into pixel buffers.
    pub image_decoding: bool,
    /// Pixel analysis (histogram, edges, complexity) can run.
    pub vision: bool,
}

impl CapabilityDescriptor {
    pub fn all_available() -> Self {
        Self {
            image_decoding: true,
            vision: true,
        }
    }

    /// Names of the required capabilities that are unavailable.
    pub fn missing(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.image_decoding {
            missing.push(IMAGE_DECODING.to_string());
        }
        if !self.vision {
            missing.push(VISION.to_string());
        }
        missing
    }

    pub fn report(&self) -> DependencyReport {
        let missing = self.missing();
        DependencyReport {
            available: missing.is_empty(),
            missing,
        }
    }
}

impl Default for CapabilityDescriptor {
    fn default() -> Self {
        Self::all_available()
    }
}

/// Result of a dependency check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyReport {
    pub available: bool,
    pub missing: Vec<String>,
}
