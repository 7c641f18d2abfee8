// crates/champion-gate-core/src/runtime/artifact.rs
// ============================================================================
// Module: Champion Gate Artifact Probes
// Description: Tag and disk checks for trial checkpoint availability.
// Purpose: Confirm a champion's artifact exists before it can win.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Artifact availability is decided by an ordered chain of named probes. The
//! first probe that returns a definite answer wins and its name is reported;
//! when every probe is inconclusive the artifact counts as unavailable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use crate::core::ArtifactCheckSource;
use crate::core::TagKeyResolver;
use crate::core::TagName;
use crate::core::TrialRecord;
use crate::interfaces::ArtifactProbe;
use crate::interfaces::ArtifactStatus;

// ============================================================================
// SECTION: Tag Probe
// ============================================================================

/// Reads the artifact-availability tag.
#[derive(Debug, Clone)]
pub struct TagArtifactProbe {
    /// Availability tag key.
    tag_key: String,
}

impl TagArtifactProbe {
    /// Creates a probe reading `tag_key`.
    #[must_use]
    pub fn new(tag_key: impl Into<String>) -> Self {
        Self {
            tag_key: tag_key.into(),
        }
    }
}

impl ArtifactProbe for TagArtifactProbe {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn check(&self, trial: &TrialRecord) -> ArtifactStatus {
        let Some(raw) = trial.tag(&self.tag_key) else {
            return ArtifactStatus::Unknown;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => ArtifactStatus::Available,
            "false" | "0" | "no" => ArtifactStatus::Unavailable,
            _ => ArtifactStatus::Unknown,
        }
    }
}

// ============================================================================
// SECTION: Disk Probe
// ============================================================================

/// Checks the artifact path tag against the filesystem.
#[derive(Debug, Clone)]
pub struct DiskArtifactProbe {
    /// Root joined with relative artifact paths.
    root: PathBuf,
    /// Artifact path tag key.
    path_tag: String,
}

impl DiskArtifactProbe {
    /// Creates a probe resolving `path_tag` values under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, path_tag: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            path_tag: path_tag.into(),
        }
    }
}

impl ArtifactProbe for DiskArtifactProbe {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn check(&self, trial: &TrialRecord) -> ArtifactStatus {
        let Some(raw) = trial.tag(&self.path_tag).map(str::trim).filter(|raw| !raw.is_empty())
        else {
            return ArtifactStatus::Unknown;
        };
        if self.root.join(raw).exists() {
            ArtifactStatus::Available
        } else {
            ArtifactStatus::Unavailable
        }
    }
}

// ============================================================================
// SECTION: Probe Chain
// ============================================================================

/// Outcome of a probe chain check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactDecision {
    /// Final status.
    pub status: ArtifactStatus,
    /// Probe that decided, `None` when all were inconclusive.
    pub probe: Option<&'static str>,
}

impl ArtifactDecision {
    /// Returns true only for an affirmative availability answer.
    #[must_use]
    pub fn is_available(self) -> bool {
        self.status == ArtifactStatus::Available
    }
}

/// Ordered list of artifact probes.
pub struct ArtifactProbeChain {
    /// Probes in evaluation order.
    probes: Vec<Box<dyn ArtifactProbe + Send + Sync>>,
}

impl ArtifactProbeChain {
    /// Creates a chain from explicit probes.
    #[must_use]
    pub fn new(probes: Vec<Box<dyn ArtifactProbe + Send + Sync>>) -> Self {
        Self {
            probes,
        }
    }

    /// Builds the chain configured by `source`.
    #[must_use]
    pub fn for_source(
        source: ArtifactCheckSource,
        tags: &dyn TagKeyResolver,
        artifact_root: &Path,
    ) -> Self {
        let tag_probe = || -> Box<dyn ArtifactProbe + Send + Sync> {
            Box::new(TagArtifactProbe::new(tags.key(TagName::ArtifactAvailable)))
        };
        let disk_probe = || -> Box<dyn ArtifactProbe + Send + Sync> {
            Box::new(DiskArtifactProbe::new(artifact_root, tags.key(TagName::ArtifactPath)))
        };
        let probes = match source {
            ArtifactCheckSource::Tag => vec![tag_probe()],
            ArtifactCheckSource::Disk => vec![disk_probe()],
            ArtifactCheckSource::TagThenDisk => vec![tag_probe(), disk_probe()],
        };
        Self::new(probes)
    }

    /// Returns the probe names in evaluation order.
    #[must_use]
    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|probe| probe.name()).collect()
    }

    /// Runs the probes until one returns a definite answer.
    #[must_use]
    pub fn check(&self, trial: &TrialRecord) -> ArtifactDecision {
        for probe in &self.probes {
            let status = probe.check(trial);
            if status != ArtifactStatus::Unknown {
                return ArtifactDecision {
                    status,
                    probe: Some(probe.name()),
                };
            }
        }
        ArtifactDecision {
            status: ArtifactStatus::Unknown,
            probe: None,
        }
    }
}
