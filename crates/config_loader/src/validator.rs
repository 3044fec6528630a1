//! Configuration validation
//!
//! Rules:
//! - numeric ranges declared on the contract types (`validator` derive)
//! - sampling resolution and lag window are finite
//! - min_valid_scanlines <= scanline_count
//! - probe transform names two different frames
//! - coordinate definitions: non-empty distinct frame names, no duplicate or
//!   reversed pairs, finite matrices with a `[0, 0, 0, 1]` bottom row, invertible

use std::collections::HashSet;

use contracts::{matrix_from_rows, NavConfig, NavError, TemporalCalibrationConfig};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

const BOTTOM_ROW: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Validate a NavConfig
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &NavConfig) -> Result<(), NavError> {
    validate_declared_ranges(config)?;
    validate_calibration(&config.temporal_calibration)?;
    validate_coordinate_definitions(config)?;
    Ok(())
}

/// Ranges declared with `#[validate(...)]` on the contract types
fn validate_declared_ranges(config: &NavConfig) -> Result<(), NavError> {
    let Err(errors) = config.validate() else {
        return Ok(());
    };

    let mut flat = Vec::new();
    flatten_errors("", &errors, &mut flat);
    flat.sort();
    let (field, message) = flat
        .into_iter()
        .next()
        .unwrap_or_else(|| (String::from("<root>"), errors.to_string()));
    Err(NavError::config_validation(field, message))
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                for e in errs {
                    let message = match &e.message {
                        Some(message) => message.to_string(),
                        None => format!("failed '{}' check", e.code),
                    };
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten_errors(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten_errors(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}

/// Temporal calibration parameters
fn validate_calibration(config: &TemporalCalibrationConfig) -> Result<(), NavError> {
    if !config.sampling_resolution_sec.is_finite() {
        return Err(NavError::config_validation(
            "temporal_calibration.sampling_resolution_sec",
            "sampling_resolution_sec must be finite",
        ));
    }

    if !config.max_tracker_lag_sec.is_finite() || config.max_tracker_lag_sec < 0.0 {
        return Err(NavError::config_validation(
            "temporal_calibration.max_tracker_lag_sec",
            format!(
                "max_tracker_lag_sec must be finite and >= 0, got {}",
                config.max_tracker_lag_sec
            ),
        ));
    }

    if config.min_valid_scanlines > config.scanline_count {
        return Err(NavError::config_validation(
            "temporal_calibration.min_valid_scanlines",
            format!(
                "min_valid_scanlines ({}) must be <= scanline_count ({})",
                config.min_valid_scanlines, config.scanline_count
            ),
        ));
    }

    let name = &config.probe_to_reference_transform;
    if name.from() == name.to() {
        return Err(NavError::config_validation(
            "temporal_calibration.probe_to_reference_transform",
            format!("'{name}' must name two different coordinate frames"),
        ));
    }

    Ok(())
}

/// Persistent coordinate frame transforms
fn validate_coordinate_definitions(config: &NavConfig) -> Result<(), NavError> {
    let mut seen = HashSet::new();

    for (idx, def) in config.coordinate_definitions.transforms.iter().enumerate() {
        let field = |name: &str| format!("coordinate_definitions.transforms[{idx}].{name}");

        if def.from.is_empty() {
            return Err(NavError::config_validation(
                field("from"),
                "frame name cannot be empty",
            ));
        }
        if def.to.is_empty() {
            return Err(NavError::config_validation(
                field("to"),
                "frame name cannot be empty",
            ));
        }
        if def.from == def.to {
            return Err(NavError::config_validation(
                field("to"),
                format!("transform from '{}' to itself", def.from),
            ));
        }

        if seen.contains(&(def.to.clone(), def.from.clone())) {
            return Err(NavError::config_validation(
                format!("coordinate_definitions.transforms[{idx}]"),
                format!(
                    "{}To{} conflicts with the already defined {}To{}",
                    def.from, def.to, def.to, def.from
                ),
            ));
        }
        if !seen.insert((def.from.clone(), def.to.clone())) {
            return Err(NavError::config_validation(
                format!("coordinate_definitions.transforms[{idx}]"),
                format!("duplicate transform {}To{}", def.from, def.to),
            ));
        }

        if def.matrix.iter().flatten().any(|v| !v.is_finite()) {
            return Err(NavError::config_validation(
                field("matrix"),
                "matrix elements must be finite",
            ));
        }
        if def.matrix[3] != BOTTOM_ROW {
            return Err(NavError::config_validation(
                field("matrix"),
                format!("bottom row must be {BOTTOM_ROW:?}, got {:?}", def.matrix[3]),
            ));
        }
        if matrix_from_rows(&def.matrix).try_inverse().is_none() {
            return Err(NavError::config_validation(
                field("matrix"),
                "matrix is not invertible",
            ));
        }

        if let Some(error) = def.error {
            if !error.is_finite() || error < 0.0 {
                return Err(NavError::config_validation(
                    field("error"),
                    format!("calibration error must be finite and >= 0, got {error}"),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        matrix_to_rows, translation_matrix, CoordinateDefinitions, FrameName, TransformDefinition,
        TransformName, TransformStatus,
    };

    fn definition(from: &str, to: &str) -> TransformDefinition {
        TransformDefinition {
            from: FrameName::from(from),
            to: FrameName::from(to),
            matrix: matrix_to_rows(&translation_matrix(1.0, 2.0, 3.0)),
            status: TransformStatus::Valid,
            persistent: true,
            date: None,
            error: None,
        }
    }

    fn minimal_config() -> NavConfig {
        NavConfig {
            coordinate_definitions: CoordinateDefinitions {
                transforms: vec![definition("Image", "Probe")],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_config()).is_ok());
    }

    #[test]
    fn test_sampling_resolution_floor() {
        let mut config = minimal_config();
        config.temporal_calibration.sampling_resolution_sec = 0.000001;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, NavError::ConfigValidation { ref field, .. }
            if field == "temporal_calibration.sampling_resolution_sec"));
    }

    #[test]
    fn test_negative_lag_window() {
        let mut config = minimal_config();
        config.temporal_calibration.max_tracker_lag_sec = -1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_nan_lag_window() {
        let mut config = minimal_config();
        config.temporal_calibration.max_tracker_lag_sec = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_min_valid_scanlines_above_count() {
        let mut config = minimal_config();
        config.temporal_calibration.scanline_count = 4;
        config.temporal_calibration.min_valid_scanlines = 5;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("min_valid_scanlines"));
    }

    #[test]
    fn test_probe_transform_self_loop() {
        let mut config = minimal_config();
        config.temporal_calibration.probe_to_reference_transform =
            TransformName::new("Probe", "Probe").unwrap();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_nested_line_fit_range() {
        let mut config = minimal_config();
        config.temporal_calibration.line_fit.confidence = 1.5;
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, NavError::ConfigValidation { ref field, .. }
            if field == "temporal_calibration.line_fit.confidence"));
    }

    #[test]
    fn test_duplicate_definition() {
        let mut config = minimal_config();
        config
            .coordinate_definitions
            .transforms
            .push(definition("Image", "Probe"));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_reversed_definition() {
        let mut config = minimal_config();
        config
            .coordinate_definitions
            .transforms
            .push(definition("Probe", "Image"));
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("conflicts"));
    }

    #[test]
    fn test_self_transform_definition() {
        let mut config = minimal_config();
        config.coordinate_definitions.transforms = vec![definition("Probe", "Probe")];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_bottom_row() {
        let mut config = minimal_config();
        config.coordinate_definitions.transforms[0].matrix[3] = [0.0, 0.0, 1.0, 1.0];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("bottom row"));
    }

    #[test]
    fn test_singular_matrix() {
        let mut config = minimal_config();
        config.coordinate_definitions.transforms[0].matrix[0] = [0.0; 4];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("invertible"));
    }

    #[test]
    fn test_negative_calibration_error() {
        let mut config = minimal_config();
        config.coordinate_definitions.transforms[0].error = Some(-0.1);
        assert!(validate(&config).is_err());
    }
}
