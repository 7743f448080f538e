//! Physical units of tally scores.
//!
//! Scores are grouped into unit categories through a fixed table. Summing
//! scores from different categories is meaningless, so a selection that spans
//! more than one category is refused.

use std::collections::{BTreeSet, HashSet};

use log::warn;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Label used for relative-error images.
pub const PERCENT_ERROR: &str = "% error";

/// Unit category of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum ScoreUnit {
    /// Reaction rates.
    Reaction,
    /// Track-length flux.
    Flux,
    /// Particle production.
    Production,
    /// Energy deposition.
    Deposition,
    /// Surface current.
    Current,
    /// Event counts.
    Events,
    /// Inverse velocity.
    InverseVelocity,
    /// Decay rate.
    DecayRate,
}

impl ScoreUnit {
    /// Unit label for tally values.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ScoreUnit::Reaction => "Reactions per Source Particle",
            ScoreUnit::Flux => "Particle-cm per Source Particle",
            ScoreUnit::Production => "Particles Produced per Source Particle",
            ScoreUnit::Deposition => "eV per Source Particle",
            ScoreUnit::Current => "Particles per Source Particle",
            ScoreUnit::Events => "Events per Source Particle",
            ScoreUnit::InverseVelocity => "Particle-seconds per Source Particle",
            ScoreUnit::DecayRate => "Seconds^-1",
        }
    }

    /// Unit label after dividing by mesh voxel volume.
    #[must_use]
    pub fn volume_label(self) -> &'static str {
        match self {
            ScoreUnit::Reaction => "Reactions per cm³ per Source Particle",
            ScoreUnit::Flux => "Particles per cm² per Source Particle",
            ScoreUnit::Production => "Particles Produced per cm³ per Source Particle",
            ScoreUnit::Deposition => "eV per cm³ per Source Particle",
            ScoreUnit::Current => "Particles per cm³ per Source Particle",
            ScoreUnit::Events => "Events per cm³ per Source Particle",
            ScoreUnit::InverseVelocity => "Particle-seconds per cm³ per Source Particle",
            ScoreUnit::DecayRate => "Seconds^-1 per cm³",
        }
    }
}

impl std::fmt::Display for ScoreUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

const REACTIONS: &[&str] = &[
    "absorption", "elastic", "fission", "scatter", "total", "(n,2nd)", "(n,2n)", "(n,3n)",
    "(n,na)", "(n,n3a)", "(n,2na)", "(n,np)", "(n,n2a)", "(n,2n2a)", "(n,nd)", "(n,nt)",
    "(n,nHe-3)", "(n,nd2a)", "(n,nt2a)", "(n,n4n)", "(n,2np)", "(n,3np)", "(n,n2p)",
    "(n,n*X*)", "(n,nc)", "(n,gamma)", "(n,elastic)", "(n,p)", "(n,d)", "(n,t)", "(n,3He)",
    "(n,a)", "(n,2a)", "(n,3a)", "(n,2p)", "(n,pa)", "(n,t2a)", "(n,d2a)", "(n,pd)", "(n,pt)",
    "(n,da)",
];

const PRODUCTIONS: &[&str] = &[
    "delayed-nu-fission",
    "prompt-nu-fission",
    "nu-fission",
    "nu-scatter",
    "H1-production",
    "H2-production",
    "H3-production",
    "He3-production",
    "He4-production",
];

const DEPOSITIONS: &[&str] = &[
    "heating",
    "heating-local",
    "kappa-fission",
    "fission-q-prompt",
    "fission-q-recoverable",
    "damage-energy",
];

/// Looks up a score in the fixed unit table.
#[must_use]
pub fn known_unit(score: &str) -> Option<ScoreUnit> {
    let unit = match score {
        "flux" => ScoreUnit::Flux,
        "current" => ScoreUnit::Current,
        "events" => ScoreUnit::Events,
        "inverse-velocity" => ScoreUnit::InverseVelocity,
        "decay-rate" => ScoreUnit::DecayRate,
        s if REACTIONS.contains(&s) => ScoreUnit::Reaction,
        s if PRODUCTIONS.contains(&s) => ScoreUnit::Production,
        s if DEPOSITIONS.contains(&s) => ScoreUnit::Deposition,
        _ => return None,
    };
    Some(unit)
}

/// Returns true for discrete inelastic level scores such as `(n,n1)`.
///
/// Only the prefix is checked: `(n,n` followed by one or more digits in
/// `1..=9` and a closing parenthesis.
#[must_use]
pub fn is_inelastic_level(score: &str) -> bool {
    let Some(rest) = score.strip_prefix("(n,n") else {
        return false;
    };
    let digits = rest.bytes().take_while(|b| (b'1'..=b'9').contains(b)).count();
    digits > 0 && rest[digits..].starts_with(')')
}

/// Unit category of any score.
///
/// The second value is true when the score is unknown and was defaulted to
/// reaction units.
#[must_use]
pub fn unit_for(score: &str) -> (ScoreUnit, bool) {
    match known_unit(score) {
        Some(unit) => (unit, false),
        None if is_inelastic_level(score) => (ScoreUnit::Reaction, false),
        None => (ScoreUnit::Reaction, true),
    }
}

/// Scores whose units cannot be combined.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("the scores selected have incompatible units: {}", join_labels(.units))]
pub struct IncompatibleUnits {
    /// Distinct unit categories in the selection.
    pub units: Vec<ScoreUnit>,
}

fn join_labels(units: &[ScoreUnit]) -> String {
    units
        .iter()
        .map(|unit| unit.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Remembers which unrecognized scores have already been reported.
///
/// Owned by the caller so that warnings are issued once per session without
/// touching the unit table.
#[derive(Debug, Default, Clone)]
pub struct UnitWarnings {
    reported: HashSet<String>,
}

impl UnitWarnings {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs a warning for `score` unless it was already reported.
    /// Returns true if a warning was emitted.
    pub fn report(&mut self, score: &str) -> bool {
        if self.reported.contains(score) {
            return false;
        }
        warn!("the score {score} is not recognized; using reaction units");
        self.reported.insert(score.to_string());
        true
    }

    /// Scores reported so far.
    #[must_use]
    pub fn reported(&self) -> Vec<&str> {
        let mut scores: Vec<&str> = self.reported.iter().map(String::as_str).collect();
        scores.sort_unstable();
        scores
    }
}

/// Resolves the single unit category of a score selection.
///
/// # Errors
/// Returns [`IncompatibleUnits`] if the scores span more than one category.
/// An empty selection resolves to reaction units.
pub fn resolve_units<'a, I>(
    scores: I,
    warnings: &mut UnitWarnings,
) -> Result<ScoreUnit, IncompatibleUnits>
where
    I: IntoIterator<Item = &'a str>,
{
    let units: BTreeSet<ScoreUnit> = scores
        .into_iter()
        .map(|score| {
            let (unit, unrecognized) = unit_for(score);
            if unrecognized {
                warnings.report(score);
            }
            unit
        })
        .collect();

    match units.len() {
        0 => Ok(ScoreUnit::Reaction),
        1 => Ok(units.into_iter().next().unwrap_or(ScoreUnit::Reaction)),
        _ => Err(IncompatibleUnits {
            units: units.into_iter().collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_units() {
        assert_eq!(known_unit("flux"), Some(ScoreUnit::Flux));
        assert_eq!(known_unit("fission"), Some(ScoreUnit::Reaction));
        assert_eq!(known_unit("nu-fission"), Some(ScoreUnit::Production));
        assert_eq!(known_unit("heating"), Some(ScoreUnit::Deposition));
        assert_eq!(known_unit("decay-rate"), Some(ScoreUnit::DecayRate));
        assert_eq!(known_unit("(n,n7)"), None);
        assert_eq!(ScoreUnit::Flux.label(), "Particle-cm per Source Particle");
    }

    #[test]
    fn test_inelastic_levels() {
        assert!(is_inelastic_level("(n,n1)"));
        assert!(is_inelastic_level("(n,n12)"));
        assert!(!is_inelastic_level("(n,n0)"));
        assert!(!is_inelastic_level("(n,n)"));
        assert!(!is_inelastic_level("(n,nc)"));
        assert_eq!(unit_for("(n,n3)"), (ScoreUnit::Reaction, false));
        assert_eq!(unit_for("made-up"), (ScoreUnit::Reaction, true));
    }

    #[test]
    fn test_single_category() {
        let mut warnings = UnitWarnings::new();
        let unit = resolve_units(["fission", "absorption", "(n,gamma)"], &mut warnings).unwrap();
        assert_eq!(unit, ScoreUnit::Reaction);
        let unit = resolve_units(["(n,gamma)", "fission", "absorption"], &mut warnings).unwrap();
        assert_eq!(unit, ScoreUnit::Reaction);
        assert!(warnings.reported().is_empty());
    }

    #[test]
    fn test_incompatible_units() {
        let mut warnings = UnitWarnings::new();
        let err = resolve_units(["flux", "fission", "heating"], &mut warnings).unwrap_err();
        assert_eq!(
            err.units,
            vec![ScoreUnit::Reaction, ScoreUnit::Flux, ScoreUnit::Deposition]
        );
        assert!(err.to_string().contains("Particle-cm per Source Particle"));
    }

    #[test]
    fn test_unrecognized_warns_once() {
        let mut warnings = UnitWarnings::new();
        let unit = resolve_units(["mystery", "fission"], &mut warnings).unwrap();
        assert_eq!(unit, ScoreUnit::Reaction);
        assert_eq!(warnings.reported(), vec!["mystery"]);
        assert!(!warnings.report("mystery"));

        // an unrecognized score mixed with flux is still incompatible
        assert!(resolve_units(["mystery", "flux"], &mut warnings).is_err());
    }
}
