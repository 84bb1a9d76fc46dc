use serde_json::Value;

use super::DispatcherConfig;
use crate::error::ImageError;
use crate::types::{OperationKind, OperationParams, PipelineParams, PipelineStep};

/// One leaf step of a planned pipeline. Its parameters stay raw until the
/// step is about to run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub kind: OperationKind,
    pub params: Value,
}

impl PlannedStep {
    /// Parses the step's parameters.
    ///
    /// # Errors
    ///
    /// Returns the parameter error for a malformed step.
    pub fn parse(&self) -> Result<OperationParams, ImageError> {
        OperationParams::parse(self.kind, &self.params)
    }
}

/// Resolves every step name of `pipeline`, flattening nested pipelines into
/// a single ordered list of leaf steps.
///
/// Flattening is equivalent to recursive execution: a nested pipeline's
/// output is the fold of its own steps over the current bytes. Leaf
/// parameters are not parsed here, so a malformed step only fails once the
/// steps before it have run.
///
/// # Errors
///
/// - `ImageError::Validation` for an empty step list at any level, nesting
///   deeper than `max_pipeline_depth`, or more than `max_pipeline_steps`
///   steps in total
/// - `ImageError::UnsupportedOperation` for an unknown step name
pub fn plan_pipeline(
    pipeline: &PipelineParams,
    config: &DispatcherConfig,
) -> Result<Vec<PlannedStep>, ImageError> {
    let mut planner = Planner {
        config,
        visited: 0,
        plan: Vec::with_capacity(pipeline.operations.len()),
    };
    planner.plan(&pipeline.operations, 1)?;
    Ok(planner.plan)
}

struct Planner<'a> {
    config: &'a DispatcherConfig,
    visited: usize,
    plan: Vec<PlannedStep>,
}

impl Planner<'_> {
    fn plan(&mut self, steps: &[PipelineStep], depth: usize) -> Result<(), ImageError> {
        if steps.is_empty() {
            return Err(ImageError::Validation("Operations array is required".into()));
        }
        if depth > self.config.max_pipeline_depth {
            return Err(ImageError::Validation(format!(
                "Pipeline nesting exceeds maximum depth of {}",
                self.config.max_pipeline_depth
            )));
        }

        for step in steps {
            self.visited += 1;
            if self.visited > self.config.max_pipeline_steps {
                return Err(ImageError::Validation(format!(
                    "Pipeline exceeds maximum of {} steps",
                    self.config.max_pipeline_steps
                )));
            }

            let kind: OperationKind = step.kind.parse()?;
            if kind == OperationKind::Pipeline {
                if let OperationParams::Pipeline(nested) =
                    OperationParams::parse(kind, &step.params)?
                {
                    self.plan(&nested.operations, depth + 1)?;
                }
            } else {
                self.plan.push(PlannedStep {
                    kind,
                    params: step.params.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::error::ErrorKind;

    fn pipeline(steps: Value) -> PipelineParams {
        PipelineParams {
            operations: serde_json::from_value(steps).unwrap(),
        }
    }

    fn nested(depth: usize) -> Value {
        let mut params = json!({"operations": [{"type": "rotate", "params": {"angle": 90}}]});
        for _ in 1..depth {
            params = json!({"operations": [{"type": "pipeline", "params": params}]});
        }
        params
    }

    #[test]
    fn flattens_nested_steps_in_order() {
        let plan = plan_pipeline(
            &pipeline(json!([
                {"type": "filter", "params": {"filter": "blur"}},
                {"type": "pipeline", "params": {"operations": [
                    {"type": "rotate", "params": {"angle": 180}},
                    {"type": "format", "params": {"format": "png"}}
                ]}},
                {"type": "resize", "params": {"width": 3}}
            ])),
            &DispatcherConfig::default(),
        )
        .unwrap();

        let kinds: Vec<_> = plan.iter().map(|step| step.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OperationKind::Filter,
                OperationKind::Rotate,
                OperationKind::Format,
                OperationKind::Resize,
            ]
        );
    }

    #[test]
    fn unknown_step_fails_before_anything_runs() {
        let err = plan_pipeline(
            &pipeline(json!([
                {"type": "rotate", "params": {"angle": 90}},
                {"type": "explode"}
            ])),
            &DispatcherConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn malformed_leaf_params_are_left_for_execution() {
        let plan = plan_pipeline(
            &pipeline(json!([
                {"type": "rotate", "params": {"angle": 90}},
                {"type": "rotate", "params": {"angle": 45}}
            ])),
            &DispatcherConfig::default(),
        )
        .unwrap();
        assert_eq!(plan.len(), 2);
        assert!(plan[0].parse().is_ok());
        assert_eq!(
            plan[1].parse().unwrap_err(),
            ImageError::Validation("Angle must be 90, 180, or 270 degrees".into())
        );
    }

    #[test]
    fn depth_limit_is_enforced() {
        let config = DispatcherConfig::default();
        let at_limit: PipelineParams =
            serde_json::from_value(nested(config.max_pipeline_depth)).unwrap();
        assert!(plan_pipeline(&at_limit, &config).is_ok());

        let too_deep: PipelineParams =
            serde_json::from_value(nested(config.max_pipeline_depth + 1)).unwrap();
        let err = plan_pipeline(&too_deep, &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn step_limit_counts_all_levels() {
        let config = DispatcherConfig {
            max_pipeline_steps: 3,
            ..DispatcherConfig::default()
        };
        let err = plan_pipeline(
            &pipeline(json!([
                {"type": "rotate", "params": {"angle": 90}},
                {"type": "pipeline", "params": {"operations": [
                    {"type": "rotate", "params": {"angle": 90}},
                    {"type": "rotate", "params": {"angle": 90}}
                ]}}
            ])),
            &config,
        )
        .unwrap_err();
        assert_eq!(
            err,
            ImageError::Validation("Pipeline exceeds maximum of 3 steps".into())
        );
    }

    #[test]
    fn empty_nested_pipeline_is_rejected() {
        let err = plan_pipeline(
            &pipeline(json!([{"type": "pipeline", "params": {"operations": []}}])),
            &DispatcherConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
