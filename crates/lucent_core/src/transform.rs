//! Resolution of transform token strings like `"t1 s2 r1"`.

use lucent_math::Transform;
use thiserror::Error;

use crate::description::TransformLibrary;

/// Errors that can occur while resolving a transform string.
#[derive(Error, Debug, PartialEq)]
pub enum TransformError {
    #[error("Unknown transform kind in token '{0}'")]
    UnknownKind(String),

    #[error("Invalid index in transform token '{0}'")]
    InvalidIndex(String),

    #[error("Transform token '{token}' refers to entry {index}, but only {available} exist")]
    MissingEntry {
        token: String,
        index: usize,
        available: usize,
    },

    #[error("Transform token '{0}' produces a singular matrix")]
    Singular(String),
}

/// Result type for transform resolution.
pub type TransformResult<T> = Result<T, TransformError>;

impl TransformLibrary {
    /// Compose the space-separated tokens of `tokens` into one transform.
    ///
    /// Tokens apply left to right: `"s1 t1"` scales first and then translates,
    /// i.e. `M = T1 · S1`. An empty string is the identity.
    pub fn resolve(&self, tokens: &str) -> TransformResult<Transform> {
        tokens
            .split_whitespace()
            .try_fold(Transform::IDENTITY, |acc, token| {
                Ok(acc.then(&self.lookup(token)?))
            })
    }

    fn lookup(&self, token: &str) -> TransformResult<Transform> {
        let mut chars = token.chars();
        let kind = chars.next().ok_or_else(|| TransformError::UnknownKind(token.to_string()))?;
        let index: usize = chars
            .as_str()
            .parse()
            .map_err(|_| TransformError::InvalidIndex(token.to_string()))?;
        if index == 0 {
            return Err(TransformError::InvalidIndex(token.to_string()));
        }

        let missing = |available: usize| TransformError::MissingEntry {
            token: token.to_string(),
            index,
            available,
        };
        let singular = || TransformError::Singular(token.to_string());

        match kind {
            't' => self
                .translations
                .get(index - 1)
                .map(|&offset| Transform::translation(offset))
                .ok_or_else(|| missing(self.translations.len())),
            's' => {
                let factors = self
                    .scalings
                    .get(index - 1)
                    .ok_or_else(|| missing(self.scalings.len()))?;
                Transform::scaling(*factors).ok_or_else(singular)
            }
            'r' => {
                let rotation = self
                    .rotations
                    .get(index - 1)
                    .ok_or_else(|| missing(self.rotations.len()))?;
                Transform::rotation(rotation.angle, rotation.axis).ok_or_else(singular)
            }
            'c' => {
                let rows = self
                    .composites
                    .get(index - 1)
                    .ok_or_else(|| missing(self.composites.len()))?;
                Transform::composite(*rows).ok_or_else(singular)
            }
            _ => Err(TransformError::UnknownKind(token.to_string())),
        }
    }
}
