// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The objective function: total cost, minimized.

use super::COST_COMPONENTS;
use crate::{
    BuildContext, Error, Index, ModelView, Module, Objective, ObjectiveSense, ResultRecord,
    ResultsExporter, Solution,
};

const TOTAL_COST: &str = "total_cost";

/// Minimizes the sum of every registered cost component.
pub struct ObjectiveModule;

impl Module for ObjectiveModule {
    fn name(&self) -> &str {
        "objective"
    }

    fn consumes(&self) -> Vec<&str> {
        vec![COST_COMPONENTS]
    }

    fn declare_components(&self, ctx: &mut BuildContext<'_>) -> Result<(), Error> {
        ctx.declare_list(COST_COMPONENTS)?;
        let total = ctx.sum_over(COST_COMPONENTS, &Index::Scalar)?;
        ctx.add_expression(TOTAL_COST, [(Index::Scalar, total.clone())])?;
        ctx.set_objective(Objective {
            sense: ObjectiveSense::Minimize,
            expr: total,
        })
    }

    fn results_exporter(&self) -> Option<&dyn ResultsExporter> {
        Some(self)
    }
}

impl ResultsExporter for ObjectiveModule {
    fn export_results(
        &self,
        view: &ModelView<'_>,
        solution: &Solution,
    ) -> Result<Vec<ResultRecord>, Error> {
        let total = view.formulation().expression(TOTAL_COST, &Index::Scalar)?;
        Ok(vec![ResultRecord::new(
            "objective",
            Index::Scalar,
            TOTAL_COST,
            total.evaluate(solution.primal())?,
        )])
    }
}
