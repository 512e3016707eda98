/*!
# Cost Model

Turns an AST into symbolic best/average/worst costs per node, per source
line and in total. Pure: the same program and configuration always produce
the same [`CostsOut`].
*/

pub mod analyzer;
pub mod cost_expr;
pub mod lines;

pub use analyzer::{expr_cost, to_symbolic, CostAnalyzer, LoopInfo, LoopKind, NodeCost};
pub use cost_expr::CostExpr;
pub use lines::{attribute_lines, LineCost};

use serde::{Deserialize, Serialize};

use crate::core::{Confidence, Degradation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostsOut {
    pub per_node: Vec<NodeCost>,
    pub per_line: Vec<LineCost>,
    pub total: CostExpr,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Degradation>,
    pub confidence: Confidence,
}
